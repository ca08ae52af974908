//! Pointer-following drift

use super::{Behavior, ExtraHandle, ExtraKind, ExtraType};
use crate::context::FolioContext;
use folio_animation::{Easing, Tween, TweenId};
use folio_core::geometry::Point;
use folio_core::math::map_range;
use folio_core::stream::Subscription;
use folio_layout::{PointerProvider, ViewportProvider};
use folio_scene::{NodeId, NodeProperty, Property, SceneGraph, SceneTweenHandle};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MouseMotionConfig {
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
    pub duration: Duration,
}

impl Default for MouseMotionConfig {
    fn default() -> Self {
        Self {
            min_x: -20.0,
            max_x: 20.0,
            min_y: -20.0,
            max_y: 20.0,
            duration: Duration::from_millis(2000),
        }
    }
}

/// Moves its target against the pointer position
///
/// The pointer's position across the viewport maps to an offset in
/// `[min, max]` around where the target sat when activated.
pub struct MouseMotion {
    target: NodeId,
    scene: Rc<RefCell<SceneGraph>>,
    viewport: Rc<ViewportProvider>,
    pointer: Rc<PointerProvider>,
    tweens: SceneTweenHandle,
    config: MouseMotionConfig,
    enabled: bool,
    start: Point,
    initial: Option<Point>,
    moves: Option<Subscription<Point>>,
    move_tween: Option<TweenId>,
    back_tween: Option<TweenId>,
}

impl MouseMotion {
    fn position(&self) -> Point {
        self.scene
            .borrow()
            .node(self.target)
            .map_or(Point::ZERO, |node| node.position())
    }

    fn tween_to(&self, to: Point, duration: Duration, easing: Easing) -> Option<TweenId> {
        self.tweens.start(
            Tween::new(duration, easing)
                .to(Property::node(self.target, NodeProperty::X), to.x)
                .to(Property::node(self.target, NodeProperty::Y), to.y),
        )
    }

    fn follow(&mut self, pointer: Point) {
        let viewport = self.viewport.size();
        let config = self.config;
        let offset = Point::new(
            map_range(pointer.x, 0.0, viewport.width, config.min_x, config.max_x),
            map_range(pointer.y, 0.0, viewport.height, config.min_y, config.max_y),
        );

        self.tweens.stop_slot(&mut self.back_tween);
        self.tweens.stop_slot(&mut self.move_tween);
        self.move_tween = self.tween_to(self.start + offset, config.duration, Easing::ExpoOut);
    }
}

impl ExtraType for MouseMotion {
    const KIND: ExtraKind = ExtraKind::MouseMotion;

    type Config = MouseMotionConfig;

    fn new(target: NodeId, ctx: &FolioContext) -> Self {
        Self {
            target,
            scene: Rc::clone(&ctx.scene),
            viewport: Rc::clone(&ctx.viewport),
            pointer: Rc::clone(&ctx.pointer),
            tweens: ctx.tween_handle(),
            config: MouseMotionConfig::default(),
            enabled: false,
            start: Point::ZERO,
            initial: None,
            moves: None,
            move_tween: None,
            back_tween: None,
        }
    }

    fn is_active(&self) -> bool {
        self.enabled
    }

    fn activate(&mut self, config: &MouseMotionConfig) {
        if self.enabled {
            return;
        }
        self.enabled = true;
        self.config = *config;
        self.tweens.stop_slot(&mut self.back_tween);

        let position = self.position();
        self.initial.get_or_insert(position);
        self.start = position;
        self.moves = Some(self.pointer.moves());
    }

    fn deactivate(&mut self, config: &MouseMotionConfig) {
        if !self.enabled {
            return;
        }
        self.enabled = false;
        self.moves = None;

        self.tweens.stop_slot(&mut self.move_tween);
        self.tweens.stop_slot(&mut self.back_tween);
        let initial = self.initial.unwrap_or(self.start);
        self.back_tween = self.tween_to(initial, config.duration, Easing::Linear);
    }

    fn render(&mut self, _delta: f32) {
        if !self.enabled {
            return;
        }
        let latest = self.moves.as_ref().and_then(Subscription::latest);
        if let Some(pointer) = latest {
            self.follow(pointer);
        }
    }

    impl_behavior_variant!(MouseMotion);
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::geometry::Size;
    use folio_core::time::ManualClock;
    use folio_scene::Content;

    fn setup() -> (ManualClock, FolioContext, NodeId) {
        let clock = ManualClock::new();
        let ctx = FolioContext::new(Rc::new(clock.clone()), Size::new(800.0, 600.0));
        let node = {
            let mut scene = ctx.scene.borrow_mut();
            let node = scene.create(Content::Container);
            let root = scene.root();
            scene.add_child(root, node).unwrap();
            scene.node_mut(node).unwrap().transform.position = Point::new(100.0, 50.0);
            node
        };
        (clock, ctx, node)
    }

    fn position(ctx: &FolioContext, node: NodeId) -> Point {
        ctx.scene.borrow().node(node).unwrap().position()
    }

    #[test]
    fn test_pointer_maps_to_offset() {
        let (clock, ctx, node) = setup();
        let mut motion = MouseMotion::new(node, &ctx);
        motion.activate(&MouseMotionConfig::default());

        ctx.pointer.move_to(Point::new(800.0, 0.0));
        motion.render(1.0);
        clock.advance_ms(2000);
        ctx.tweens.tick(&mut *ctx.scene.borrow_mut());
        assert_eq!(position(&ctx, node), Point::new(120.0, 30.0));
    }

    #[test]
    fn test_only_latest_move_per_frame() {
        let (_, ctx, node) = setup();
        let mut motion = MouseMotion::new(node, &ctx);
        motion.activate(&MouseMotionConfig::default());

        ctx.pointer.move_to(Point::new(10.0, 10.0));
        ctx.pointer.move_to(Point::new(20.0, 20.0));
        ctx.pointer.move_to(Point::new(400.0, 300.0));
        motion.render(1.0);
        assert_eq!(ctx.tweens.active_count(), 1);
    }

    #[test]
    fn test_deactivate_returns_to_initial() {
        let (clock, ctx, node) = setup();
        let mut motion = MouseMotion::new(node, &ctx);
        let config = MouseMotionConfig::default();
        motion.activate(&config);

        ctx.pointer.move_to(Point::new(0.0, 0.0));
        motion.render(1.0);
        clock.advance_ms(1000);
        ctx.tweens.tick(&mut *ctx.scene.borrow_mut());
        assert_ne!(position(&ctx, node), Point::new(100.0, 50.0));

        motion.deactivate(&config);
        assert_eq!(ctx.tweens.active_count(), 1);
        clock.advance_ms(2000);
        ctx.tweens.tick(&mut *ctx.scene.borrow_mut());
        assert_eq!(position(&ctx, node), Point::new(100.0, 50.0));

        // Moves while inactive are ignored
        ctx.pointer.move_to(Point::new(800.0, 600.0));
        motion.render(1.0);
        assert_eq!(ctx.tweens.active_count(), 0);
    }

    #[test]
    fn test_toggling_keeps_one_return_tween() {
        let (clock, ctx, node) = setup();
        let mut motion = MouseMotion::new(node, &ctx);
        let config = MouseMotionConfig::default();

        motion.activate(&config);
        motion.deactivate(&config);
        assert_eq!(ctx.tweens.active_count(), 1);

        motion.activate(&config);
        assert_eq!(ctx.tweens.active_count(), 0);
        motion.deactivate(&config);
        motion.activate(&config);
        motion.deactivate(&config);
        assert_eq!(ctx.tweens.active_count(), 1);

        clock.advance_ms(2000);
        ctx.tweens.tick(&mut *ctx.scene.borrow_mut());
        assert_eq!(position(&ctx, node), Point::new(100.0, 50.0));
        assert_eq!(ctx.tweens.active_count(), 0);
    }
}
