//! Easing curves
//!
//! Map normalized progress `t` in `[0, 1]` to eased progress. Every curve
//! satisfies `apply(0) == 0` and `apply(1) == 1`.

use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Easing {
    #[default]
    Linear,
    SineIn,
    SineOut,
    SineInOut,
    QuadOut,
    CubicIn,
    CubicOut,
    CubicInOut,
    QuintOut,
    ExpoIn,
    ExpoOut,
    ExpoInOut,
}

impl Easing {
    /// Apply the curve to `t`, clamped into `[0, 1]`
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::SineIn => 1.0 - (t * PI / 2.0).cos(),
            Easing::SineOut => (t * PI / 2.0).sin(),
            Easing::SineInOut => -((PI * t).cos() - 1.0) / 2.0,
            Easing::QuadOut => 1.0 - (1.0 - t) * (1.0 - t),
            Easing::CubicIn => t * t * t,
            Easing::CubicOut => 1.0 - (1.0 - t).powi(3),
            Easing::CubicInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Easing::QuintOut => 1.0 - (1.0 - t).powi(5),
            Easing::ExpoIn => {
                if t <= 0.0 {
                    0.0
                } else {
                    2.0_f32.powf(10.0 * t - 10.0)
                }
            }
            Easing::ExpoOut => {
                if t >= 1.0 {
                    1.0
                } else {
                    1.0 - 2.0_f32.powf(-10.0 * t)
                }
            }
            Easing::ExpoInOut => {
                if t <= 0.0 {
                    0.0
                } else if t >= 1.0 {
                    1.0
                } else if t < 0.5 {
                    2.0_f32.powf(20.0 * t - 10.0) / 2.0
                } else {
                    (2.0 - 2.0_f32.powf(-20.0 * t + 10.0)) / 2.0
                }
            }
        }
    }

    /// Interpolate between `from` and `to` at progress `t`
    pub fn interpolate(self, from: f32, to: f32, t: f32) -> f32 {
        from + (to - from) * self.apply(t)
    }
}
