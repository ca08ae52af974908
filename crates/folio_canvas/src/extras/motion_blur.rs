//! Directional motion blur

use super::{Behavior, ExtraHandle, ExtraKind, ExtraType};
use crate::context::FolioContext;
use folio_animation::{Easing, Tween, TweenId};
use folio_scene::{Filter, FilterId, FilterProperty, NodeId, Property, SceneGraph, SceneTweenHandle};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

/// Default duration of [`MotionBlur::set_velocity`] tweens
pub const VELOCITY_DURATION: Duration = Duration::from_millis(500);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotionBlurConfig {
    pub kernel_size: u32,
    pub padding: f32,
}

impl Default for MotionBlurConfig {
    fn default() -> Self {
        Self {
            kernel_size: 5,
            padding: 50.0,
        }
    }
}

/// Blurs its target along a velocity set by its owner
///
/// Without a drawing surface the extra still toggles but attaches no filter,
/// and velocity changes are dropped.
pub struct MotionBlur {
    target: NodeId,
    scene: Rc<RefCell<SceneGraph>>,
    tweens: SceneTweenHandle,
    surface_available: bool,
    enabled: bool,
    filter: Option<FilterId>,
    velocity_tween: Option<TweenId>,
}

impl MotionBlur {
    /// Tween the blur velocity to `(x, y)`
    pub fn set_velocity(&mut self, x: f32, y: f32, duration: Duration) {
        let Some(filter) = self.filter else {
            return;
        };
        self.tweens.stop_slot(&mut self.velocity_tween);
        self.velocity_tween = self.tweens.start(
            Tween::new(duration, Easing::SineOut)
                .to(Property::filter(filter, FilterProperty::X), x)
                .to(Property::filter(filter, FilterProperty::Y), y),
        );
    }

    pub fn filter(&self) -> Option<FilterId> {
        self.filter
    }
}

impl ExtraType for MotionBlur {
    const KIND: ExtraKind = ExtraKind::MotionBlur;

    type Config = MotionBlurConfig;

    fn new(target: NodeId, ctx: &FolioContext) -> Self {
        Self {
            target,
            scene: Rc::clone(&ctx.scene),
            tweens: ctx.tween_handle(),
            surface_available: ctx.surface_available(),
            enabled: false,
            filter: None,
            velocity_tween: None,
        }
    }

    fn is_active(&self) -> bool {
        self.enabled
    }

    fn activate(&mut self, config: &MotionBlurConfig) {
        if self.enabled {
            return;
        }
        self.enabled = true;

        if !self.surface_available {
            tracing::debug!("no drawing surface, skipping motion blur filter");
            return;
        }
        let filter = Filter::motion_blur(config.kernel_size, config.padding);
        match self.scene.borrow_mut().add_filter(self.target, filter) {
            Ok(filter) => self.filter = Some(filter),
            Err(err) => tracing::warn!("can't attach motion blur filter: {}", err),
        }
    }

    fn deactivate(&mut self, _config: &MotionBlurConfig) {
        if !self.enabled {
            return;
        }
        self.enabled = false;
        self.tweens.stop_slot(&mut self.velocity_tween);

        if let Some(filter) = self.filter.take() {
            self.scene.borrow_mut().remove_filter(self.target, filter);
        }
    }

    impl_behavior_variant!(MotionBlur);
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_animation::PropertyTarget;
    use folio_core::geometry::Size;
    use folio_core::time::ManualClock;
    use folio_scene::Content;

    fn setup(surface: bool) -> (ManualClock, FolioContext, NodeId) {
        let clock = ManualClock::new();
        let ctx = FolioContext::new(Rc::new(clock.clone()), Size::new(800.0, 600.0))
            .with_surface_available(surface);
        let node = ctx.scene.borrow_mut().create(Content::Container);
        (clock, ctx, node)
    }

    #[test]
    fn test_velocity_tweens_sine_out() {
        let (clock, ctx, node) = setup(true);
        let mut blur = MotionBlur::new(node, &ctx);
        blur.activate(&MotionBlurConfig::default());
        let filter = blur.filter().unwrap();

        blur.set_velocity(10.0, -4.0, Duration::from_millis(100));
        blur.set_velocity(20.0, -8.0, Duration::from_millis(100));
        assert_eq!(ctx.tweens.active_count(), 1);

        clock.advance_ms(100);
        ctx.tweens.tick(&mut *ctx.scene.borrow_mut());
        let scene = ctx.scene.borrow();
        assert_eq!(scene.read(Property::filter(filter, FilterProperty::X)), Some(20.0));
        assert_eq!(scene.read(Property::filter(filter, FilterProperty::Y)), Some(-8.0));
    }

    #[test]
    fn test_no_filter_without_surface() {
        let (_, ctx, node) = setup(false);
        let mut blur = MotionBlur::new(node, &ctx);
        blur.activate(&MotionBlurConfig::default());
        assert!(blur.is_active());
        assert!(blur.filter().is_none());

        blur.set_velocity(10.0, 10.0, VELOCITY_DURATION);
        assert_eq!(ctx.tweens.active_count(), 0);
    }

    #[test]
    fn test_prepends_and_removes_filter() {
        let (_, ctx, node) = setup(true);
        let existing = ctx
            .scene
            .borrow_mut()
            .add_filter(node, Filter::noise(0.1, 0.0))
            .unwrap();

        let mut blur = MotionBlur::new(node, &ctx);
        let config = MotionBlurConfig::default();
        blur.activate(&config);
        let filter = blur.filter().unwrap();
        assert_eq!(ctx.scene.borrow().filters_of(node), &[filter, existing]);

        blur.deactivate(&config);
        assert_eq!(ctx.scene.borrow().filters_of(node), &[existing]);
    }
}
