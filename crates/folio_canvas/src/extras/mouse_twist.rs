//! Pointer-following twist filter

use super::{Behavior, ExtraHandle, ExtraKind, ExtraType};
use crate::context::FolioContext;
use folio_animation::{Easing, Tween, TweenId};
use folio_core::geometry::Point;
use folio_core::stream::Subscription;
use folio_layout::PointerProvider;
use folio_scene::{Filter, FilterId, FilterProperty, NodeId, Property, SceneGraph, SceneTweenHandle};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

/// Parks the twist centre far outside the surface
const OFFSCREEN: f32 = -99999.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MouseTwistConfig {
    pub radius: f32,
    /// Degrees
    pub angle: f32,
    pub padding: f32,
    pub duration: Duration,
}

impl Default for MouseTwistConfig {
    fn default() -> Self {
        Self {
            radius: 200.0,
            angle: 4.0,
            padding: 20.0,
            duration: Duration::from_millis(3000),
        }
    }
}

/// Swirls its target around a point trailing the pointer
pub struct MouseTwist {
    target: NodeId,
    scene: Rc<RefCell<SceneGraph>>,
    pointer: Rc<PointerProvider>,
    tweens: SceneTweenHandle,
    config: MouseTwistConfig,
    enabled: bool,
    moved: bool,
    filter: Option<FilterId>,
    moves: Option<Subscription<Point>>,
    blurs: Option<Subscription<()>>,
    offset_tween: Option<TweenId>,
}

impl MouseTwist {
    fn set_offset(&self, offset: Point) {
        let Some(filter) = self.filter else {
            return;
        };
        let mut scene = self.scene.borrow_mut();
        if let Some(vector) = scene.filter_mut(filter).and_then(Filter::vector_mut) {
            *vector = offset;
        }
    }

    pub fn filter(&self) -> Option<FilterId> {
        self.filter
    }
}

impl ExtraType for MouseTwist {
    const KIND: ExtraKind = ExtraKind::MouseTwist;

    type Config = MouseTwistConfig;

    fn new(target: NodeId, ctx: &FolioContext) -> Self {
        Self {
            target,
            scene: Rc::clone(&ctx.scene),
            pointer: Rc::clone(&ctx.pointer),
            tweens: ctx.tween_handle(),
            config: MouseTwistConfig::default(),
            enabled: false,
            moved: false,
            filter: None,
            moves: None,
            blurs: None,
            offset_tween: None,
        }
    }

    fn is_active(&self) -> bool {
        self.enabled
    }

    fn activate(&mut self, config: &MouseTwistConfig) {
        if self.enabled {
            return;
        }
        self.enabled = true;
        self.config = *config;

        let filter = Filter::twist(config.radius, config.angle.to_radians(), config.padding);
        match self.scene.borrow_mut().add_filter(self.target, filter) {
            Ok(filter) => self.filter = Some(filter),
            Err(err) => tracing::warn!("can't attach twist filter: {}", err),
        }
        self.moves = Some(self.pointer.moves());
        self.blurs = Some(self.pointer.blurs());
    }

    fn deactivate(&mut self, _config: &MouseTwistConfig) {
        if !self.enabled {
            return;
        }
        self.enabled = false;
        self.moved = false;
        self.tweens.stop_slot(&mut self.offset_tween);
        self.moves = None;
        self.blurs = None;

        if let Some(filter) = self.filter.take() {
            self.scene.borrow_mut().remove_filter(self.target, filter);
        }
    }

    fn render(&mut self, _delta: f32) {
        if !self.enabled {
            return;
        }

        let blurred = self.blurs.as_ref().and_then(Subscription::latest).is_some();
        if blurred {
            self.tweens.stop_slot(&mut self.offset_tween);
            self.set_offset(Point::new(OFFSCREEN, OFFSCREEN));
            self.moved = false;
        }

        let (Some(pointer), Some(filter)) = (
            self.moves.as_ref().and_then(Subscription::latest),
            self.filter,
        ) else {
            return;
        };

        if !self.moved {
            self.set_offset(pointer);
            self.moved = true;
        }
        self.tweens.stop_slot(&mut self.offset_tween);
        self.offset_tween = self.tweens.start(
            Tween::new(self.config.duration, Easing::QuintOut)
                .to(Property::filter(filter, FilterProperty::X), pointer.x)
                .to(Property::filter(filter, FilterProperty::Y), pointer.y),
        );
    }

    impl_behavior_variant!(MouseTwist);
}
