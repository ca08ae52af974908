//! Tween scheduler
//!
//! Owns every running tween and advances them once per frame. Tweens are keyed
//! by [`TweenId`] so their owners can cancel them before starting a
//! replacement. Components hold a [`SchedulerHandle`] (a weak reference) and
//! the frame driver owns the [`TweenScheduler`].
//!
//! Completion callbacks run after the scheduler has released its internal
//! borrow, so a callback may start or stop other tweens.

use crate::tween::{progress, Completion, PropertyTarget, Tween};
use folio_core::time::SharedClock;
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;
use std::cell::RefCell;
use std::fmt::Debug;
use std::rc::{Rc, Weak};
use std::time::Duration;

new_key_type! {
    /// Handle to a running tween
    pub struct TweenId;
}

struct ActiveTween<K> {
    tween: Tween<K>,
    started_at: Duration,
    /// Start values captured on the first tick
    origin: Option<SmallVec<[f32; 4]>>,
}

impl<K> ActiveTween<K> {
    fn begins_at(&self) -> Duration {
        self.started_at + self.tween.delay
    }

    fn ends_at(&self) -> Duration {
        self.begins_at() + self.tween.duration
    }
}

struct SchedulerInner<K> {
    tweens: SlotMap<TweenId, ActiveTween<K>>,
}

/// The scheduler that ticks all running tweens
pub struct TweenScheduler<K> {
    inner: Rc<RefCell<SchedulerInner<K>>>,
    clock: SharedClock,
}

impl<K: Copy + PartialEq + Debug + 'static> TweenScheduler<K> {
    pub fn new(clock: SharedClock) -> Self {
        Self {
            inner: Rc::new(RefCell::new(SchedulerInner {
                tweens: SlotMap::with_key(),
            })),
            clock,
        }
    }

    /// Get a handle to this scheduler for passing to components
    pub fn handle(&self) -> SchedulerHandle<K> {
        SchedulerHandle {
            inner: Rc::downgrade(&self.inner),
            clock: Rc::clone(&self.clock),
        }
    }

    pub fn start(&self, tween: Tween<K>) -> TweenId {
        insert(&self.inner, tween, self.clock.now())
    }

    pub fn stop(&self, id: TweenId) -> bool {
        self.inner.borrow_mut().tweens.remove(id).is_some()
    }

    pub fn is_active(&self, id: TweenId) -> bool {
        self.inner.borrow().tweens.contains_key(id)
    }

    pub fn active_count(&self) -> usize {
        self.inner.borrow().tweens.len()
    }

    pub fn has_active_tweens(&self) -> bool {
        self.active_count() > 0
    }

    /// Advance every tween to the clock's current time, writing into `target`
    ///
    /// Returns true if any tweens are still running.
    pub fn tick<T>(&self, target: &mut T) -> bool
    where
        T: PropertyTarget<Key = K>,
    {
        let now = self.clock.now();
        let mut completions: Vec<Completion> = Vec::new();

        {
            let mut inner = self.inner.borrow_mut();
            let mut finished: SmallVec<[TweenId; 8]> = SmallVec::new();

            for (id, active) in inner.tweens.iter_mut() {
                if now < active.begins_at() {
                    continue;
                }

                let channels = &active.tween.channels;
                let origin = active.origin.get_or_insert_with(|| {
                    channels
                        .iter()
                        .map(|channel| target.read(channel.key).unwrap_or(channel.to))
                        .collect()
                });

                let t = progress(
                    now,
                    active.started_at + active.tween.delay,
                    active.tween.duration,
                    active.tween.easing,
                );

                let allowed = active.tween.guard.as_ref().map_or(true, |guard| guard());
                let mut alive = channels.is_empty();
                for (channel, start) in channels.iter().zip(origin.iter()) {
                    if allowed {
                        alive |= target.write(channel.key, channel.value_at(*start, t));
                    } else {
                        alive |= target.read(channel.key).is_some();
                    }
                }

                if !alive {
                    tracing::trace!("dropping tween {:?}: target properties are gone", id);
                    finished.push(id);
                } else if now >= active.ends_at() {
                    finished.push(id);
                }
            }

            for id in finished {
                if let Some(active) = inner.tweens.remove(id) {
                    completions.extend(active.tween.on_complete);
                }
            }
        }

        for callback in completions {
            callback();
        }

        self.has_active_tweens()
    }
}

fn insert<K>(inner: &Rc<RefCell<SchedulerInner<K>>>, tween: Tween<K>, now: Duration) -> TweenId {
    inner.borrow_mut().tweens.insert(ActiveTween {
        tween,
        started_at: now,
        origin: None,
    })
}

/// A weak handle to the tween scheduler
///
/// Operations on a handle whose scheduler was dropped are no-ops.
pub struct SchedulerHandle<K> {
    inner: Weak<RefCell<SchedulerInner<K>>>,
    clock: SharedClock,
}

impl<K> Clone for SchedulerHandle<K> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
            clock: Rc::clone(&self.clock),
        }
    }
}

impl<K: Copy + PartialEq + Debug + 'static> SchedulerHandle<K> {
    /// Start a tween. Returns `None` if the scheduler has been dropped.
    pub fn start(&self, tween: Tween<K>) -> Option<TweenId> {
        let inner = self.inner.upgrade()?;
        Some(insert(&inner, tween, self.clock.now()))
    }

    /// Stop a tween without running its completion callback
    pub fn stop(&self, id: TweenId) -> bool {
        self.inner
            .upgrade()
            .map_or(false, |inner| inner.borrow_mut().tweens.remove(id).is_some())
    }

    /// Stop the tween in `slot`, if any, and clear the slot
    pub fn stop_slot(&self, slot: &mut Option<TweenId>) {
        if let Some(id) = slot.take() {
            self.stop(id);
        }
    }

    /// Stop every tween animating `key`
    pub fn kill_tweens_of(&self, key: K) -> usize {
        let Some(inner) = self.inner.upgrade() else {
            return 0;
        };
        let mut inner = inner.borrow_mut();
        let before = inner.tweens.len();
        inner.tweens.retain(|_, active| !active.tween.touches(key));
        before - inner.tweens.len()
    }

    pub fn is_active(&self, id: TweenId) -> bool {
        self.inner
            .upgrade()
            .map_or(false, |inner| inner.borrow().tweens.contains_key(id))
    }

    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    pub fn clock(&self) -> SharedClock {
        Rc::clone(&self.clock)
    }

    /// Check if the scheduler is still alive
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::easing::Easing;
    use folio_core::time::ManualClock;
    use rustc_hash::FxHashMap;
    use std::cell::Cell;

    #[derive(Default)]
    struct Props(FxHashMap<&'static str, f32>);

    impl PropertyTarget for Props {
        type Key = &'static str;

        fn read(&self, key: &'static str) -> Option<f32> {
            self.0.get(key).copied()
        }

        fn write(&mut self, key: &'static str, value: f32) -> bool {
            match self.0.get_mut(key) {
                Some(slot) => {
                    *slot = value;
                    true
                }
                None => false,
            }
        }
    }

    fn setup() -> (ManualClock, TweenScheduler<&'static str>, Props) {
        let clock = ManualClock::new();
        let scheduler = TweenScheduler::new(Rc::new(clock.clone()));
        let mut props = Props::default();
        props.0.insert("alpha", 0.0);
        props.0.insert("x", 10.0);
        (clock, scheduler, props)
    }

    #[test]
    fn test_scheduler_tick() {
        let (clock, scheduler, mut props) = setup();
        scheduler.start(Tween::millis(100, Easing::Linear).to("alpha", 1.0));

        assert!(scheduler.tick(&mut props));
        assert_eq!(props.read("alpha"), Some(0.0));

        clock.advance_ms(50);
        scheduler.tick(&mut props);
        assert_eq!(props.read("alpha"), Some(0.5));

        clock.advance_ms(50);
        assert!(!scheduler.tick(&mut props));
        assert_eq!(props.read("alpha"), Some(1.0));
    }

    #[test]
    fn test_start_value_captured_on_first_tick() {
        let (clock, scheduler, mut props) = setup();
        scheduler.start(Tween::millis(100, Easing::Linear).to("x", 20.0));
        props.write("x", 0.0);
        clock.advance_ms(50);
        scheduler.tick(&mut props);
        assert_eq!(props.read("x"), Some(10.0));
    }

    #[test]
    fn test_stop_cancels_without_completion() {
        let (clock, scheduler, mut props) = setup();
        let done = Rc::new(Cell::new(false));
        let flag = done.clone();
        let id = scheduler.start(
            Tween::millis(100, Easing::Linear)
                .to("alpha", 1.0)
                .on_complete(move || flag.set(true)),
        );
        assert!(scheduler.stop(id));
        clock.advance_ms(200);
        scheduler.tick(&mut props);
        assert!(!done.get());
        assert_eq!(props.read("alpha"), Some(0.0));
    }

    #[test]
    fn test_completion_may_start_tweens() {
        let (clock, scheduler, mut props) = setup();
        let handle = scheduler.handle();
        let chained = handle.clone();
        handle.start(Tween::millis(10, Easing::Linear).to("alpha", 1.0).on_complete(move || {
            chained.start(Tween::millis(10, Easing::Linear).to("alpha", 0.0));
        }));

        clock.advance_ms(10);
        assert!(scheduler.tick(&mut props));
        assert_eq!(scheduler.active_count(), 1);
        clock.advance_ms(10);
        scheduler.tick(&mut props);
        assert_eq!(props.read("alpha"), Some(0.0));
    }

    #[test]
    fn test_guard_blocks_writes() {
        let (clock, scheduler, mut props) = setup();
        let enabled = Rc::new(Cell::new(false));
        let gate = enabled.clone();
        scheduler.start(
            Tween::millis(100, Easing::Linear)
                .to("alpha", 1.0)
                .guard(move || gate.get()),
        );
        clock.advance_ms(50);
        scheduler.tick(&mut props);
        assert_eq!(props.read("alpha"), Some(0.0));

        enabled.set(true);
        clock.advance_ms(25);
        scheduler.tick(&mut props);
        assert_eq!(props.read("alpha"), Some(0.75));
    }

    #[test]
    fn test_missing_target_drops_tween() {
        let (_, scheduler, mut props) = setup();
        scheduler.start(Tween::millis(100, Easing::Linear).to("gone", 1.0));
        assert!(!scheduler.tick(&mut props));
    }

    #[test]
    fn test_kill_tweens_of() {
        let (_, scheduler, _) = setup();
        let handle = scheduler.handle();
        handle.start(Tween::millis(100, Easing::Linear).to("alpha", 1.0));
        handle.start(Tween::millis(100, Easing::Linear).to("x", 1.0).to("alpha", 0.0));
        handle.start(Tween::millis(100, Easing::Linear).to("x", 1.0));
        assert_eq!(handle.kill_tweens_of("alpha"), 2);
        assert_eq!(scheduler.active_count(), 1);
    }

    #[test]
    fn test_handle_weak_reference() {
        let (_, scheduler, _) = setup();
        let handle = scheduler.handle();
        assert!(handle.is_alive());
        drop(scheduler);
        assert!(!handle.is_alive());
        assert!(handle.start(Tween::millis(1, Easing::Linear).to("x", 1.0)).is_none());
    }

    #[test]
    fn test_delay_holds_start() {
        let (clock, scheduler, mut props) = setup();
        scheduler.start(
            Tween::millis(100, Easing::Linear)
                .to("alpha", 1.0)
                .delay(Duration::from_millis(100)),
        );
        clock.advance_ms(100);
        scheduler.tick(&mut props);
        assert_eq!(props.read("alpha"), Some(0.0));
        clock.advance_ms(50);
        scheduler.tick(&mut props);
        assert_eq!(props.read("alpha"), Some(0.5));
    }
}
