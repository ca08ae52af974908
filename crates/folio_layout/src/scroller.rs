//! Smooth scroll engine
//!
//! Input deltas move a *virtual* position immediately. The *output* position
//! eases toward it every frame and is written back to the scroll container as
//! a translation. Both are published on one stream:
//!
//! - [`ScrollTrigger::User`] for every virtual change (physical input)
//! - [`ScrollTrigger::Animation`] for every output step (the settled camera)
//!
//! When input idles, the virtual position can snap to the nearest registered
//! section.

use crate::element::ElementRef;
use crate::element_state::{ElementState, ElementStateProvider};
use folio_animation::{Easing, Transition};
use folio_core::geometry::Point;
use folio_core::math::clamp;
use folio_core::stream::{Subject, Subscription};
use folio_core::time::{Debounce, SharedClock};
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

// ============================================================================
// Scroll state
// ============================================================================

/// What produced a scroll state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollTrigger {
    User,
    Animation,
}

/// One emission of the scroll stream
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollState {
    pub triggered_by: ScrollTrigger,
    pub position: Point,
    pub last_position: Point,
    pub current_time: Duration,
    pub last_time: Duration,
}

impl ScrollState {
    fn initial() -> Self {
        Self {
            triggered_by: ScrollTrigger::User,
            position: Point::ZERO,
            last_position: Point::ZERO,
            current_time: Duration::ZERO,
            last_time: Duration::ZERO,
        }
    }

    /// Pixels per millisecond since the previous state of the same trigger
    pub fn velocity(&self) -> Point {
        let dt = self.current_time.saturating_sub(self.last_time).as_secs_f32() * 1000.0;
        if dt <= 0.0 {
            return Point::ZERO;
        }
        let delta = self.position - self.last_position;
        Point::new(delta.x / dt, delta.y / dt)
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Input source of a scroll delta
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InputDevice {
    Wheel,
    Touch,
    Drag,
    Keyboard,
}

/// Per-device delta multipliers
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputMultipliers {
    pub wheel: f32,
    pub touch: f32,
    pub drag: f32,
    pub keyboard: f32,
}

impl Default for InputMultipliers {
    fn default() -> Self {
        Self {
            wheel: 0.85,
            touch: 2.0,
            drag: 1.0,
            keyboard: 1.0,
        }
    }
}

impl InputMultipliers {
    pub fn for_device(&self, device: InputDevice) -> f32 {
        match device {
            InputDevice::Wheel => self.wheel,
            InputDevice::Touch => self.touch,
            InputDevice::Drag => self.drag,
            InputDevice::Keyboard => self.keyboard,
        }
    }
}

/// Section snapping after input idles
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SnapConfig {
    pub enabled: bool,
    /// Idle time before snapping
    pub delay: Duration,
    pub duration: Duration,
    pub easing: Easing,
    /// Maximum distance to a section that still snaps
    pub threshold: f32,
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            delay: Duration::from_millis(300),
            duration: Duration::from_millis(800),
            easing: Easing::CubicInOut,
            threshold: 200.0,
        }
    }
}

/// Configuration for the scroll engine
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollerConfig {
    pub multipliers: InputMultipliers,
    /// Time for the output to catch up with the virtual position
    pub output_duration: Duration,
    pub output_easing: Easing,
    pub snap: SnapConfig,
}

impl Default for ScrollerConfig {
    fn default() -> Self {
        Self {
            multipliers: InputMultipliers::default(),
            output_duration: Duration::from_millis(2000),
            output_easing: Easing::ExpoOut,
            snap: SnapConfig::default(),
        }
    }
}

// ============================================================================
// Engine
// ============================================================================

struct ScrollEngine {
    wrapper: Rc<ElementState>,
    container: Rc<ElementState>,
    virtual_position: Point,
    output_position: Point,
    output_x: Transition,
    output_y: Transition,
    /// Programmatic or snap scroll driving the virtual y
    scripted: Option<Transition>,
    snap: Debounce,
    last_user: (Point, Duration),
    last_animation: (Point, Duration),
}

impl ScrollEngine {
    fn new(
        wrapper: Rc<ElementState>,
        container: Rc<ElementState>,
        config: &ScrollerConfig,
        now: Duration,
    ) -> Self {
        let idle = Transition::new(0.0, 0.0, now, config.output_duration, config.output_easing);
        Self {
            wrapper,
            container,
            virtual_position: Point::ZERO,
            output_position: Point::ZERO,
            output_x: idle,
            output_y: idle,
            scripted: None,
            snap: Debounce::new(config.snap.delay),
            last_user: (Point::ZERO, now),
            last_animation: (Point::ZERO, now),
        }
    }

    fn max_scroll(&self) -> Point {
        let wrapper = self.wrapper.bounds();
        let container = self.container.bounds();
        Point::new(
            (container.width - wrapper.width).max(0.0),
            (container.height - wrapper.height).max(0.0),
        )
    }

    fn clamp_position(&self, position: Point) -> Point {
        let max = self.max_scroll();
        Point::new(clamp(position.x, 0.0, max.x), clamp(position.y, 0.0, max.y))
    }

    fn output_at(&self, now: Duration) -> Point {
        let settle = |transition: &Transition| {
            if transition.is_finished(now) {
                transition.to
            } else {
                transition.value_at(now)
            }
        };
        Point::new(settle(&self.output_x), settle(&self.output_y))
    }

    fn is_animating(&self, now: Duration) -> bool {
        self.scripted.is_some()
            || self.snap.is_pending()
            || !self.output_x.is_finished(now)
            || !self.output_y.is_finished(now)
    }

    fn detach(&self) {
        self.container.element().set_translation(Point::ZERO);
    }
}

// ============================================================================
// Service
// ============================================================================

/// The page's scroll engine and the single producer of scroll states
pub struct ScrollerService {
    clock: SharedClock,
    states: Rc<ElementStateProvider>,
    config: ScrollerConfig,
    engine: RefCell<Option<ScrollEngine>>,
    initialized: Rc<Cell<bool>>,
    subject: Subject<ScrollState>,
    sections: RefCell<Vec<f32>>,
}

impl ScrollerService {
    pub fn new(clock: SharedClock, states: Rc<ElementStateProvider>, config: ScrollerConfig) -> Self {
        Self {
            subject: Subject::behavior(clock.clone(), ScrollState::initial()),
            clock,
            states,
            config,
            engine: RefCell::new(None),
            initialized: Rc::new(Cell::new(false)),
            sections: RefCell::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &ScrollerConfig {
        &self.config
    }

    /// Bind the engine to `root`
    ///
    /// `root` becomes the wrapper; its first child (or `root` itself) is the
    /// translated container. Binding again replaces the previous engine.
    pub fn set_root_element(&self, root: ElementRef) {
        let container_element = root.first_child().unwrap_or_else(|| Rc::clone(&root));
        let wrapper = self.states.create(root);
        let container = self.states.create(container_element);
        wrapper.update();
        container.update();

        let wrapper_id = wrapper.id();
        let engine = ScrollEngine::new(wrapper, container, &self.config, self.clock.now());
        let previous = self.engine.borrow_mut().replace(engine);
        match previous {
            Some(previous) => {
                tracing::debug!("scroller rebound to {:?}, replacing previous engine", wrapper_id);
                previous.detach();
            }
            None => tracing::debug!("scroller bound to {:?}", wrapper_id),
        }
        self.initialized.set(true);
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.get()
    }

    /// Feed a raw input delta
    pub fn input(&self, device: InputDevice, delta: Point) {
        let now = self.clock.now();
        let multiplier = self.config.multipliers.for_device(device);
        let mut engine = self.engine.borrow_mut();
        let Some(engine) = engine.as_mut() else {
            return;
        };

        engine.scripted = None;
        let target = Point::new(
            engine.virtual_position.x + delta.x * multiplier,
            engine.virtual_position.y + delta.y * multiplier,
        );
        self.move_virtual(engine, target, now);
        if self.config.snap.enabled {
            engine.snap.trigger(now);
        }
    }

    /// Animate the virtual position to `y` over `duration`. No-op before binding.
    pub fn scroll_to_y(&self, y: f32, duration: Duration) {
        let now = self.clock.now();
        let mut engine = self.engine.borrow_mut();
        let Some(engine) = engine.as_mut() else {
            tracing::trace!("scroll_to_y({}) ignored: scroller not bound", y);
            return;
        };

        engine.snap.cancel();
        if duration.is_zero() {
            engine.scripted = None;
            let target = Point::new(engine.virtual_position.x, y);
            self.move_virtual(engine, target, now);
        } else {
            engine.scripted = Some(Transition::new(
                engine.virtual_position.y,
                y,
                now,
                duration,
                Easing::CubicInOut,
            ));
        }
    }

    /// Advance the engine to the current time
    ///
    /// Returns true while the output is still moving or a scroll is scheduled.
    pub fn tick(&self) -> bool {
        let now = self.clock.now();
        let mut engine = self.engine.borrow_mut();
        let Some(engine) = engine.as_mut() else {
            return false;
        };

        if let Some(scripted) = engine.scripted {
            let y = if scripted.is_finished(now) {
                engine.scripted = None;
                scripted.to
            } else {
                scripted.value_at(now)
            };
            let target = Point::new(engine.virtual_position.x, y);
            self.move_virtual(engine, target, now);
        } else if engine.snap.poll(now) {
            self.start_snap(engine, now);
        }

        let output = engine.output_at(now);
        if output != engine.output_position {
            engine.output_position = output;
            engine
                .container
                .element()
                .set_translation(Point::new(-output.x, -output.y));
            let previous = std::mem::replace(&mut engine.last_animation, (output, now));
            self.emit(ScrollTrigger::Animation, output, previous, now);
        }

        engine.is_animating(now)
    }

    fn start_snap(&self, engine: &mut ScrollEngine, now: Duration) {
        let current = engine.virtual_position.y;
        let nearest = self
            .sections
            .borrow()
            .iter()
            .copied()
            .map(|section| clamp(section, 0.0, engine.max_scroll().y))
            .filter(|section| (section - current).abs() <= self.config.snap.threshold)
            .min_by(|a, b| (a - current).abs().total_cmp(&(b - current).abs()));

        if let Some(section) = nearest.filter(|section| *section != current) {
            tracing::trace!("snapping from {} to section at {}", current, section);
            engine.scripted = Some(Transition::new(
                current,
                section,
                now,
                self.config.snap.duration,
                self.config.snap.easing,
            ));
        }
    }

    fn move_virtual(&self, engine: &mut ScrollEngine, target: Point, now: Duration) {
        let position = engine.clamp_position(target);
        if position == engine.virtual_position {
            return;
        }
        engine.virtual_position = position;
        engine.output_x.retarget(now, position.x);
        engine.output_y.retarget(now, position.y);

        let previous = std::mem::replace(&mut engine.last_user, (position, now));
        self.emit(ScrollTrigger::User, position, previous, now);
    }

    fn emit(&self, trigger: ScrollTrigger, position: Point, previous: (Point, Duration), now: Duration) {
        self.subject.next(ScrollState {
            triggered_by: trigger,
            position,
            last_position: previous.0,
            current_time: now,
            last_time: previous.1,
        });
    }

    /// Re-measure the wrapper and container, re-clamping the position
    pub fn update(&self) {
        let now = self.clock.now();
        let mut engine = self.engine.borrow_mut();
        let Some(engine) = engine.as_mut() else {
            return;
        };
        engine.wrapper.update();
        engine.container.update();
        let target = engine.virtual_position;
        self.move_virtual(engine, target, now);
    }

    /// Register a snap target
    pub fn add_section(&self, y: f32) {
        self.sections.borrow_mut().push(y);
    }

    pub fn clear_sections(&self) {
        self.sections.borrow_mut().clear();
    }

    /// Every state once bound
    pub fn scroll(&self) -> Subscription<ScrollState> {
        let initialized = Rc::clone(&self.initialized);
        self.subject
            .subscribe()
            .filter(move |_| initialized.get())
    }

    pub fn scroll_user(&self) -> Subscription<ScrollState> {
        self.scroll()
            .filter(|state| state.triggered_by == ScrollTrigger::User)
    }

    pub fn scroll_animation(&self) -> Subscription<ScrollState> {
        self.scroll()
            .filter(|state| state.triggered_by == ScrollTrigger::Animation)
    }

    /// Output (rendered) position
    pub fn position(&self) -> Point {
        self.engine
            .borrow()
            .as_ref()
            .map_or(Point::ZERO, |engine| engine.output_position)
    }

    pub fn virtual_position(&self) -> Point {
        self.engine
            .borrow()
            .as_ref()
            .map_or(Point::ZERO, |engine| engine.virtual_position)
    }

    pub fn wrapper_height(&self) -> f32 {
        self.measure(|engine| engine.wrapper.bounds().height)
    }

    pub fn wrapper_width(&self) -> f32 {
        self.measure(|engine| engine.wrapper.bounds().width)
    }

    pub fn container_height(&self) -> f32 {
        self.measure(|engine| engine.container.bounds().height)
    }

    pub fn wrapper_top(&self) -> f32 {
        self.measure(|engine| engine.wrapper.bounds().y)
    }

    fn measure(&self, f: impl FnOnce(&ScrollEngine) -> f32) -> f32 {
        self.engine.borrow().as_ref().map_or(0.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Document, HostElement};
    use folio_core::geometry::{Rect, Size};
    use folio_core::time::ManualClock;

    struct Setup {
        clock: ManualClock,
        doc: Document,
        scroller: ScrollerService,
    }

    fn setup(config: ScrollerConfig) -> Setup {
        let clock = ManualClock::new();
        let doc = Document::new(Size::new(1280.0, 800.0));
        let body = doc.body().id();
        doc.create(body, "main", Rect::new(0.0, 0.0, 1280.0, 3000.0))
            .unwrap();
        let scroller = ScrollerService::new(
            Rc::new(clock.clone()),
            Rc::new(ElementStateProvider::new()),
            config,
        );
        Setup {
            clock,
            doc,
            scroller,
        }
    }

    fn bind(setup: &Setup) {
        setup.scroller.set_root_element(setup.doc.body().into_ref());
    }

    #[test]
    fn test_unbound_scroller_is_inert() {
        let s = setup(ScrollerConfig::default());
        let scroll = s.scroller.scroll();
        s.scroller.scroll_to_y(500.0, Duration::ZERO);
        s.scroller.input(InputDevice::Wheel, Point::new(0.0, 100.0));
        assert!(!s.scroller.tick());
        assert_eq!(s.scroller.wrapper_height(), 0.0);
        assert_eq!(s.scroller.virtual_position(), Point::ZERO);
        assert!(scroll.drain().is_empty());
    }

    #[test]
    fn test_wheel_input_applies_multiplier() {
        let s = setup(ScrollerConfig::default());
        bind(&s);
        let user = s.scroller.scroll_user();
        user.drain();

        s.scroller.input(InputDevice::Wheel, Point::new(0.0, 100.0));
        assert_eq!(s.scroller.virtual_position().y, 85.0);
        let states = user.drain();
        assert_eq!(states.len(), 1);
        assert_eq!(states[0].position.y, 85.0);
    }

    #[test]
    fn test_input_clamped_to_scrollable_range() {
        let s = setup(ScrollerConfig::default());
        bind(&s);
        s.scroller.input(InputDevice::Drag, Point::new(0.0, 10_000.0));
        assert_eq!(s.scroller.virtual_position().y, 2200.0);
        s.scroller.input(InputDevice::Drag, Point::new(0.0, -10_000.0));
        assert_eq!(s.scroller.virtual_position().y, 0.0);
    }

    #[test]
    fn test_output_eases_and_translates_container() {
        let s = setup(ScrollerConfig::default());
        bind(&s);
        let animation = s.scroller.scroll_animation();

        s.scroller.input(InputDevice::Drag, Point::new(0.0, 100.0));
        s.clock.advance_ms(500);
        assert!(s.scroller.tick());
        let halfway = s.scroller.position().y;
        assert!(halfway > 0.0 && halfway < 100.0);

        s.clock.advance_ms(1500);
        assert!(!s.scroller.tick());
        assert_eq!(s.scroller.position().y, 100.0);

        let container = s.doc.body().first_child().unwrap().id();
        assert_eq!(s.doc.translation(container), Some(Point::new(0.0, -100.0)));

        let states = animation.drain();
        assert_eq!(states.len(), 2);
        assert!(states
            .windows(2)
            .all(|pair| pair[0].current_time <= pair[1].current_time));
    }

    #[test]
    fn test_scroll_to_y_animates_virtual_position() {
        let s = setup(ScrollerConfig::default());
        bind(&s);
        s.scroller.scroll_to_y(1000.0, Duration::from_millis(400));
        s.clock.advance_ms(200);
        s.scroller.tick();
        let midway = s.scroller.virtual_position().y;
        assert!(midway > 0.0 && midway < 1000.0);

        s.clock.advance_ms(200);
        s.scroller.tick();
        assert_eq!(s.scroller.virtual_position().y, 1000.0);
    }

    #[test]
    fn test_snaps_to_nearest_section_after_idle() {
        let config = ScrollerConfig {
            snap: SnapConfig {
                enabled: true,
                ..SnapConfig::default()
            },
            ..ScrollerConfig::default()
        };
        let s = setup(config);
        bind(&s);
        s.scroller.add_section(0.0);
        s.scroller.add_section(1000.0);

        s.scroller.input(InputDevice::Drag, Point::new(0.0, 900.0));
        s.clock.advance_ms(100);
        s.scroller.tick();
        assert_eq!(s.scroller.virtual_position().y, 900.0);

        s.clock.advance_ms(200);
        s.scroller.tick();
        s.clock.advance_ms(800);
        s.scroller.tick();
        assert_eq!(s.scroller.virtual_position().y, 1000.0);
    }

    #[test]
    fn test_user_velocity() {
        let s = setup(ScrollerConfig::default());
        bind(&s);
        let user = s.scroller.scroll_user();
        user.drain();

        s.clock.advance_ms(10);
        s.scroller.input(InputDevice::Drag, Point::new(0.0, 50.0));
        let state = user.latest().unwrap();
        assert_eq!(state.velocity(), Point::new(0.0, 5.0));
    }

    #[test]
    fn test_velocity_zero_without_elapsed_time() {
        let state = ScrollState {
            triggered_by: ScrollTrigger::User,
            position: Point::new(0.0, 100.0),
            last_position: Point::ZERO,
            current_time: Duration::from_millis(5),
            last_time: Duration::from_millis(5),
        };
        assert_eq!(state.velocity(), Point::ZERO);
    }

    #[test]
    fn test_measurements_and_rebind() {
        let s = setup(ScrollerConfig::default());
        bind(&s);
        assert_eq!(s.scroller.wrapper_height(), 800.0);
        assert_eq!(s.scroller.wrapper_width(), 1280.0);
        assert_eq!(s.scroller.container_height(), 3000.0);
        assert_eq!(s.scroller.wrapper_top(), 0.0);

        s.scroller.input(InputDevice::Drag, Point::new(0.0, 300.0));
        bind(&s);
        assert_eq!(s.scroller.virtual_position(), Point::ZERO);
        assert!(s.scroller.is_initialized());
    }
}
