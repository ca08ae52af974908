//! The custom pointer
//!
//! Two sprites: an inner dot that snaps to the pointer and an outer ring that
//! trails it. The ring stretches, rotates and blurs with pointer velocity,
//! which is estimated from a position sampled every `velocity_frequency`.
//! Page code drives the cursor through [`CursorService`](crate::CursorService).

use super::ContainerHooks;
use crate::container::ContainerCore;
use crate::context::FolioContext;
use crate::cursor_service::{CursorPosition, CursorState};
use crate::error::Result;
use crate::extras::{ExtraHandle, ExtraKind, MotionBlur, MotionBlurConfig};
use folio_animation::{Easing, Tween, TweenId};
use folio_core::geometry::Point;
use folio_core::math::clamp;
use folio_core::stream::Subscription;
use folio_core::time::{Debounce, Interval};
use folio_scene::{Content, NodeId, NodeProperty, Property, SceneTweenHandle, Sprite};
use std::cell::Cell;
use std::f32::consts::FRAC_PI_2;
use std::rc::Rc;
use std::time::Duration;

const VELOCITY_GAIN: f32 = 1.1;
const MAX_VELOCITY: f32 = 10.0;
const MAX_BLUR: f32 = 50.0;
const BLUR_DURATION: Duration = Duration::from_millis(100);
const ROTATION_DURATION: Duration = Duration::from_millis(150);
const STRETCH_DURATION: Duration = Duration::from_millis(300);
const STATE_DURATION: Duration = Duration::from_millis(500);
const FOLLOW_DURATION: Duration = Duration::from_millis(200);
const PRESSED_SCALE: f32 = 0.8;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CursorConfig {
    /// Outer ring diameter before `scale`
    pub size: f32,
    pub inner_size: f32,
    pub scale: f32,
    pub velocity_frequency: Duration,
    pub state_debounce: Duration,
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self {
            size: 140.0,
            inner_size: 16.0,
            scale: 0.5,
            velocity_frequency: Duration::from_millis(50),
            state_debounce: Duration::from_millis(100),
        }
    }
}

/// Velocity estimate between the sampled and the instant pointer position
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CursorVelocity {
    /// Pixels per millisecond, scaled and clamped to ±10
    pub velocity: Point,
    /// Motion blur strength per axis
    pub blur: Point,
    /// Ring stretch factor in `[1, 2]`
    pub scale: f32,
    /// Radians
    pub rotation: f32,
}

/// Estimate pointer velocity from the sampled and instant positions
pub fn cursor_velocity(tracked: Point, instant: Point, frequency_ms: f32) -> CursorVelocity {
    let delta = tracked - instant;
    let axis_velocity = |d: f32| clamp(d * VELOCITY_GAIN / frequency_ms, -MAX_VELOCITY, MAX_VELOCITY);
    let velocity = Point::new(axis_velocity(delta.x), axis_velocity(delta.y));
    let blur = |v: f32| v.abs().powi(3).min(MAX_BLUR);
    let stretch = |v: f32| clamp(v.abs(), 1.0, 2.0);

    CursorVelocity {
        velocity,
        blur: Point::new(blur(velocity.x), blur(velocity.y)),
        scale: stretch(velocity.x).max(stretch(velocity.y)),
        rotation: delta.y.atan2(delta.x),
    }
}

#[derive(Default)]
struct CursorStreams {
    positions: Option<Subscription<CursorPosition>>,
    visibility: Option<Subscription<bool>>,
    states: Option<Subscription<CursorState>>,
    moves: Option<Subscription<Point>>,
    presses: Option<Subscription<bool>>,
}

#[derive(Default)]
struct CursorTweens {
    follow: Option<TweenId>,
    rotation: Option<TweenId>,
    stretch: Option<TweenId>,
    state_outer: Option<TweenId>,
    state_inner: Option<TweenId>,
    press: Option<TweenId>,
}

pub struct MainCursor {
    ctx: FolioContext,
    tweens: SceneTweenHandle,
    config: CursorConfig,
    outer: Option<NodeId>,
    inner: Option<NodeId>,
    mouse: Point,
    tracked: Point,
    /// Where the running follow tween is heading
    follow_target: Option<Point>,
    locked: bool,
    /// Committed state; tween guards and completions read it
    current_state: Rc<Cell<CursorState>>,
    requested_state: CursorState,
    last_rotation_diff: f32,
    streams: CursorStreams,
    active: CursorTweens,
    sampler: Interval,
    velocity_reset: Debounce,
    state_change: Debounce,
    motion_blur: Option<ExtraHandle<MotionBlur>>,
}

impl MainCursor {
    pub fn new(ctx: FolioContext, config: CursorConfig) -> Self {
        Self {
            tweens: ctx.tween_handle(),
            ctx,
            config,
            outer: None,
            inner: None,
            mouse: Point::ZERO,
            tracked: Point::ZERO,
            follow_target: None,
            locked: false,
            current_state: Rc::new(Cell::new(CursorState::Default)),
            requested_state: CursorState::Default,
            last_rotation_diff: 0.0,
            streams: CursorStreams::default(),
            active: CursorTweens::default(),
            sampler: Interval::new(config.velocity_frequency),
            velocity_reset: Debounce::new(config.velocity_frequency),
            state_change: Debounce::new(config.state_debounce),
            motion_blur: None,
        }
    }

    pub fn outer(&self) -> Option<NodeId> {
        self.outer
    }

    pub fn inner(&self) -> Option<NodeId> {
        self.inner
    }

    /// The state whose transition has committed
    pub fn current_state(&self) -> CursorState {
        self.current_state.get()
    }

    /// Instant pointer position
    pub fn mouse(&self) -> Point {
        self.mouse
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    fn outer_size(&self, state: CursorState) -> f32 {
        let base = self.config.size * self.config.scale;
        match state {
            CursorState::Default => base,
            CursorState::Small => base * PRESSED_SCALE,
        }
    }

    fn outer_alpha(state: CursorState) -> f32 {
        match state {
            CursorState::Default => 1.0,
            CursorState::Small => 0.0,
        }
    }

    fn inner_size(&self, state: CursorState) -> f32 {
        let base = self.config.inner_size * self.config.scale;
        match state {
            CursorState::Default => base,
            CursorState::Small => base * 2.0,
        }
    }

    fn sprite(&self, name: &str, size: f32) -> Result<Sprite> {
        let texture = self.ctx.resources.texture(name)?;
        let mut sprite = Sprite::new(texture).with_anchor(Point::new(0.5, 0.5));
        sprite.width = size;
        sprite.height = size;
        Ok(sprite)
    }

    fn set_visible(&self, visible: bool) {
        let mut scene = self.ctx.scene.borrow_mut();
        for id in self.outer.iter().chain(self.inner.iter()) {
            if let Some(node) = scene.node_mut(*id) {
                node.visible = visible;
            }
        }
    }

    fn update_velocity(&mut self) {
        let Some(outer) = self.outer else {
            return;
        };
        let frequency = self.config.velocity_frequency.as_secs_f32() * 1000.0;
        let estimate = cursor_velocity(self.tracked, self.mouse, frequency);

        if let Some(blur) = &self.motion_blur {
            blur.borrow_mut()
                .set_velocity(estimate.blur.x, estimate.blur.y, BLUR_DURATION);
        }

        let last_rotation = self
            .ctx
            .scene
            .borrow()
            .node(outer)
            .map_or(0.0, |node| node.transform.rotation);
        let rotation_diff = (estimate.rotation - last_rotation).abs();
        let rotation_delta = (rotation_diff - self.last_rotation_diff).abs();
        self.last_rotation_diff = rotation_diff;

        let default_only = {
            let current = Rc::clone(&self.current_state);
            move || current.get() == CursorState::Default
        };

        self.tweens.stop_slot(&mut self.active.rotation);
        if self.current_state.get() == CursorState::Default && rotation_delta < FRAC_PI_2 {
            self.active.rotation = self.tweens.start(
                Tween::new(ROTATION_DURATION, Easing::Linear)
                    .to(Property::node(outer, NodeProperty::Rotation), estimate.rotation)
                    .guard(default_only.clone()),
            );
        }

        self.tweens.stop_slot(&mut self.active.stretch);
        if self.current_state.get() == CursorState::Default {
            let width = self.outer_size(CursorState::Default) * estimate.scale;
            self.active.stretch = self.tweens.start(
                Tween::new(STRETCH_DURATION, Easing::Linear)
                    .to(Property::node(outer, NodeProperty::Width), width)
                    .guard(default_only),
            );
        }
    }

    fn apply_state(&mut self, state: CursorState) {
        let (Some(outer), Some(inner)) = (self.outer, self.inner) else {
            return;
        };
        tracing::trace!("cursor state -> {:?}", state);
        self.tweens.stop_slot(&mut self.active.state_outer);
        self.tweens.stop_slot(&mut self.active.state_inner);

        let outer_size = self.outer_size(state);
        let mut outer_tween = Tween::new(STATE_DURATION, Easing::Linear)
            .to(Property::node(outer, NodeProperty::Width), outer_size)
            .to(Property::node(outer, NodeProperty::Height), outer_size)
            .to(Property::node(outer, NodeProperty::Alpha), Self::outer_alpha(state));

        match state {
            CursorState::Default => {
                let current = Rc::clone(&self.current_state);
                outer_tween = outer_tween.on_complete(move || current.set(state));
            }
            CursorState::Small => self.current_state.set(state),
        }

        let inner_size = self.inner_size(state);
        self.active.state_outer = self.tweens.start(outer_tween);
        self.active.state_inner = self.tweens.start(
            Tween::new(STATE_DURATION, Easing::Linear)
                .to(Property::node(inner, NodeProperty::Width), inner_size)
                .to(Property::node(inner, NodeProperty::Height), inner_size),
        );
    }

    /// Shrink the ring while pressed, restoring the requested state's size on release
    fn apply_press(&mut self, pressed: bool) {
        let Some(outer) = self.outer else {
            return;
        };
        let state = self.requested_state;
        let factor = if pressed { PRESSED_SCALE } else { 1.0 };
        let size = self.outer_size(state) * factor;

        self.tweens.stop_slot(&mut self.active.press);
        self.tweens.stop_slot(&mut self.active.state_outer);

        let current = Rc::clone(&self.current_state);
        self.active.press = self.tweens.start(
            Tween::new(FOLLOW_DURATION, Easing::SineOut)
                .to(Property::node(outer, NodeProperty::Width), size)
                .to(Property::node(outer, NodeProperty::Height), size)
                .to(Property::node(outer, NodeProperty::Alpha), Self::outer_alpha(state))
                .on_complete(move || current.set(state)),
        );
    }

    fn follow_pointer(&mut self) {
        let (Some(outer), Some(inner)) = (self.outer, self.inner) else {
            return;
        };
        if let Some(node) = self.ctx.scene.borrow_mut().node_mut(inner) {
            node.transform.position = self.mouse;
        }
        if self.follow_target == Some(self.mouse) {
            return;
        }

        self.tweens.stop_slot(&mut self.active.follow);
        self.follow_target = Some(self.mouse);
        self.active.follow = self.tweens.start(
            Tween::new(FOLLOW_DURATION, Easing::SineOut)
                .to(Property::node(outer, NodeProperty::X), self.mouse.x)
                .to(Property::node(outer, NodeProperty::Y), self.mouse.y),
        );
    }
}

impl ContainerHooks for MainCursor {
    fn z_index(&self) -> i32 {
        100
    }

    fn init(&mut self, core: &mut ContainerCore) -> Result<()> {
        let node = core.require_node("init")?;
        let outer = self.sprite("cursor.outer", self.outer_size(CursorState::Default))?;
        let inner = self.sprite("cursor.inner", self.inner_size(CursorState::Default))?;

        {
            let mut scene = self.ctx.scene.borrow_mut();
            let inner = scene.create_named("cursor.inner", Content::Sprite(inner));
            let outer = scene.create_named("cursor.outer", Content::Sprite(outer));
            scene.add_child(node, inner)?;
            scene.add_child(node, outer)?;
            self.inner = Some(inner);
            self.outer = Some(outer);
        }

        let cursor = &self.ctx.cursor;
        self.streams = CursorStreams {
            positions: Some(cursor.positions()),
            visibility: Some(cursor.visibility()),
            states: Some(cursor.states()),
            moves: Some(self.ctx.pointer.moves()),
            presses: Some(self.ctx.pointer.presses()),
        };
        self.sampler.start(self.ctx.now());

        core.enable_extras(node, &[ExtraKind::MotionBlur]);
        core.toggle::<MotionBlur>(true, MotionBlurConfig::default());
        self.motion_blur = core.extras().get::<MotionBlur>();

        self.ctx.cursor.resolve_ready()?;
        tracing::debug!("cursor ready");
        Ok(())
    }

    fn render(&mut self, _core: &mut ContainerCore, _delta: f32) -> Result<()> {
        let now = self.ctx.now();

        let positions = self.streams.positions.as_ref().map(Subscription::drain);
        for position in positions.into_iter().flatten() {
            self.mouse = Point::new(position.x, position.y);
            self.tracked = self.mouse;
            self.locked = position.locked;
        }

        let visible = self.streams.visibility.as_ref().and_then(Subscription::latest);
        if let Some(visible) = visible {
            self.set_visible(visible);
        }

        let state = self.streams.states.as_ref().and_then(Subscription::latest);
        if let Some(state) = state {
            self.requested_state = state;
            self.state_change.trigger(now);
        }

        let moved = self.streams.moves.as_ref().and_then(Subscription::latest);
        if let (Some(pointer), false) = (moved, self.locked) {
            self.mouse = pointer;
            self.update_velocity();
            self.velocity_reset.trigger(now);
        }

        if self.sampler.poll(now) > 0 && !self.locked {
            self.tracked = self.mouse;
        }
        if self.velocity_reset.poll(now) {
            self.update_velocity();
        }
        if self.state_change.poll(now) {
            self.apply_state(self.requested_state);
        }

        let pressed = self.streams.presses.as_ref().and_then(Subscription::latest);
        if let Some(pressed) = pressed {
            self.apply_press(pressed);
        }

        self.follow_pointer();
        Ok(())
    }

    fn destroy(&mut self, _core: &mut ContainerCore) {
        self.streams = CursorStreams::default();
        self.sampler.stop();
        self.velocity_reset.cancel();
        self.state_change.cancel();
        for slot in [
            &mut self.active.follow,
            &mut self.active.rotation,
            &mut self.active.stretch,
            &mut self.active.state_outer,
            &mut self.active.state_inner,
            &mut self.active.press,
        ] {
            self.tweens.stop_slot(slot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Container;
    use folio_core::geometry::Size;
    use folio_core::time::ManualClock;
    use folio_scene::Resource;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    struct Fixture {
        clock: ManualClock,
        ctx: FolioContext,
        container: Container,
    }

    impl Fixture {
        fn new() -> Self {
            let clock = ManualClock::new();
            let ctx = FolioContext::new(Rc::new(clock.clone()), Size::new(1280.0, 800.0));
            for name in ["cursor.outer", "cursor.inner"] {
                ctx.resources.insert(Resource {
                    name: name.to_string(),
                    path: format!("/images/{}.png", name),
                    size: Size::new(64.0, 64.0),
                    canvas: true,
                });
            }
            let mut container = Container::new_cursor(ctx.clone(), CursorConfig::default());
            let node = ctx.scene.borrow_mut().create(Content::Container);
            container.bind(node).unwrap();
            container.init().unwrap();
            Self {
                clock,
                ctx,
                container,
            }
        }

        fn cursor(&self) -> &MainCursor {
            self.container.cursor().unwrap()
        }

        fn frame(&mut self, ms: u64) {
            self.clock.advance_ms(ms);
            self.container.render(1.0).unwrap();
            self.ctx.tweens.tick(&mut *self.ctx.scene.borrow_mut());
        }

        /// Advance tweens without rendering
        fn settle(&mut self, ms: u64) {
            self.clock.advance_ms(ms);
            self.ctx.tweens.tick(&mut *self.ctx.scene.borrow_mut());
        }

        fn node(&self, id: NodeId) -> folio_scene::Node {
            self.ctx.scene.borrow().node(id).unwrap().clone()
        }

        fn size(&self, id: NodeId) -> Size {
            self.node(id).content.size().unwrap()
        }
    }

    #[test]
    fn test_velocity_from_horizontal_move() {
        let estimate = cursor_velocity(Point::new(100.0, 0.0), Point::ZERO, 50.0);
        assert!(approx(estimate.velocity.x, 2.2));
        assert_eq!(estimate.velocity.y, 0.0);
        assert!(approx(estimate.blur.x, 10.648));
        assert_eq!(estimate.blur.y, 0.0);
        assert_eq!(estimate.scale, 2.0);
        assert_eq!(estimate.rotation, 0.0);
    }

    #[test]
    fn test_velocity_clamps() {
        let estimate = cursor_velocity(Point::ZERO, Point::new(2000.0, 10.0), 50.0);
        assert_eq!(estimate.velocity.x, -10.0);
        assert_eq!(estimate.blur.x, 50.0);
        assert!(approx(estimate.velocity.y, -0.22));
        assert_eq!(estimate.scale, 2.0);
    }

    #[test]
    fn test_init_builds_sprites() {
        let fixture = Fixture::new();
        let cursor = fixture.cursor();
        let outer = fixture.node(cursor.outer().unwrap());
        let inner = fixture.node(cursor.inner().unwrap());

        assert_eq!(outer.content.size(), Some(Size::new(70.0, 70.0)));
        assert_eq!(inner.content.size(), Some(Size::new(8.0, 8.0)));
        assert_eq!(outer.content.anchor(), Point::new(0.5, 0.5));
        assert!(fixture.ctx.cursor.is_ready());

        let blur = fixture.container.extras().get::<MotionBlur>().unwrap();
        assert!(blur.is_active());
    }

    #[test]
    fn test_inner_snaps_outer_follows() {
        let mut fixture = Fixture::new();
        fixture.ctx.pointer.move_to(Point::new(300.0, 200.0));
        fixture.frame(16);

        let cursor = fixture.cursor();
        let (outer, inner) = (cursor.outer().unwrap(), cursor.inner().unwrap());
        assert_eq!(fixture.node(inner).position(), Point::new(300.0, 200.0));
        assert_ne!(fixture.node(outer).position(), Point::new(300.0, 200.0));

        fixture.settle(200);
        assert_eq!(fixture.node(outer).position(), Point::new(300.0, 200.0));
    }

    #[test]
    fn test_small_state_after_debounce() {
        let mut fixture = Fixture::new();
        fixture.ctx.cursor.update_state(CursorState::Small);
        fixture.frame(16);
        assert_eq!(fixture.cursor().current_state(), CursorState::Default);

        fixture.frame(100);
        assert_eq!(fixture.cursor().current_state(), CursorState::Small);
        fixture.frame(500);

        let cursor = fixture.cursor();
        let outer = cursor.outer().unwrap();
        assert_eq!(fixture.size(outer), Size::new(56.0, 56.0));
        assert_eq!(fixture.node(outer).alpha, 0.0);
        assert_eq!(fixture.size(cursor.inner().unwrap()), Size::new(16.0, 16.0));
    }

    #[test]
    fn test_default_state_commits_on_completion() {
        let mut fixture = Fixture::new();
        fixture.ctx.cursor.update_state(CursorState::Small);
        fixture.frame(16);
        fixture.frame(100);
        fixture.frame(500);

        fixture.ctx.cursor.update_state(CursorState::Default);
        fixture.frame(16);
        fixture.frame(100);
        assert_eq!(fixture.cursor().current_state(), CursorState::Small);
        fixture.frame(500);
        assert_eq!(fixture.cursor().current_state(), CursorState::Default);
        let outer = fixture.cursor().outer().unwrap();
        assert_eq!(fixture.size(outer), Size::new(70.0, 70.0));
        assert_eq!(fixture.node(outer).alpha, 1.0);
    }

    #[test]
    fn test_press_shrinks_and_restores() {
        let mut fixture = Fixture::new();
        let outer = fixture.cursor().outer().unwrap();

        fixture.ctx.pointer.press();
        fixture.frame(16);
        fixture.frame(200);
        assert!(approx(fixture.size(outer).width, 56.0));

        fixture.ctx.pointer.release();
        fixture.frame(16);
        fixture.frame(200);
        assert!(approx(fixture.size(outer).width, 70.0));
    }

    #[test]
    fn test_locked_position_ignores_moves() {
        let mut fixture = Fixture::new();
        fixture.ctx.cursor.set_position(50.0, 60.0, true);
        fixture.frame(16);
        assert!(fixture.cursor().is_locked());
        assert_eq!(fixture.cursor().mouse(), Point::new(50.0, 60.0));

        fixture.ctx.pointer.move_to(Point::new(400.0, 400.0));
        fixture.frame(16);
        assert_eq!(fixture.cursor().mouse(), Point::new(50.0, 60.0));
        let inner = fixture.cursor().inner().unwrap();
        assert_eq!(fixture.node(inner).position(), Point::new(50.0, 60.0));
    }

    #[test]
    fn test_visibility_toggles_both_sprites() {
        let mut fixture = Fixture::new();
        fixture.ctx.cursor.hide();
        fixture.frame(16);
        let cursor = fixture.cursor();
        assert!(!fixture.node(cursor.outer().unwrap()).visible);
        assert!(!fixture.node(cursor.inner().unwrap()).visible);
    }
}
