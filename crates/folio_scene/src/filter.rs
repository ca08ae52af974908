//! Post-processing filters attached to nodes

use crate::node::NodeId;
use folio_core::geometry::Point;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FilterKind {
    /// Offsets pixels by the red/green channels of a map sprite
    Displacement { map: NodeId, scale: Point },
    /// Directional blur along `velocity`
    MotionBlur {
        velocity: Point,
        kernel_size: u32,
        offset: f32,
    },
    /// Swirl around `offset`
    Twist {
        radius: f32,
        /// Radians
        angle: f32,
        offset: Point,
    },
    /// Grain, re-seeded per frame for animated noise
    Noise { noise: f32, seed: f32 },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Filter {
    pub kind: FilterKind,
    /// Extra pixels rendered around the filtered area
    pub padding: f32,
    pub enabled: bool,
}

impl Filter {
    pub fn new(kind: FilterKind) -> Self {
        Self {
            kind,
            padding: 0.0,
            enabled: true,
        }
    }

    pub fn displacement(map: NodeId, scale: Point) -> Self {
        Self::new(FilterKind::Displacement { map, scale })
    }

    pub fn motion_blur(kernel_size: u32, padding: f32) -> Self {
        Self::new(FilterKind::MotionBlur {
            velocity: Point::ZERO,
            kernel_size,
            offset: 0.0,
        })
        .with_padding(padding)
    }

    pub fn twist(radius: f32, angle: f32, padding: f32) -> Self {
        Self::new(FilterKind::Twist {
            radius,
            angle,
            offset: Point::ZERO,
        })
        .with_padding(padding)
    }

    pub fn noise(noise: f32, seed: f32) -> Self {
        Self::new(FilterKind::Noise { noise, seed })
    }

    pub fn with_padding(mut self, padding: f32) -> Self {
        self.padding = padding;
        self
    }

    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            FilterKind::Displacement { .. } => "displacement",
            FilterKind::MotionBlur { .. } => "motion_blur",
            FilterKind::Twist { .. } => "twist",
            FilterKind::Noise { .. } => "noise",
        }
    }

    /// The 2D parameter tweens drive: scale, velocity or offset
    pub fn vector(&self) -> Option<Point> {
        match &self.kind {
            FilterKind::Displacement { scale, .. } => Some(*scale),
            FilterKind::MotionBlur { velocity, .. } => Some(*velocity),
            FilterKind::Twist { offset, .. } => Some(*offset),
            FilterKind::Noise { .. } => None,
        }
    }

    pub fn vector_mut(&mut self) -> Option<&mut Point> {
        match &mut self.kind {
            FilterKind::Displacement { scale, .. } => Some(scale),
            FilterKind::MotionBlur { velocity, .. } => Some(velocity),
            FilterKind::Twist { offset, .. } => Some(offset),
            FilterKind::Noise { .. } => None,
        }
    }
}
