//! Tween descriptions
//!
//! A [`Tween`] describes how one or more properties of a target move to new
//! values over time. It is inert until handed to the
//! [`TweenScheduler`](crate::scheduler::TweenScheduler), which captures the
//! start values on the first tick and writes interpolated values every frame.
//!
//! [`Transition`] is the single-value counterpart for code that owns its own
//! state instead of writing into a property target.

use crate::easing::Easing;
use smallvec::SmallVec;
use std::fmt::Debug;
use std::time::Duration;

/// Something whose numeric properties can be read and written by tweens
pub trait PropertyTarget {
    type Key: Copy + PartialEq + Debug;

    /// Current value, or `None` if the property no longer exists
    fn read(&self, key: Self::Key) -> Option<f32>;

    /// Write a value. Returns false if the property no longer exists.
    fn write(&mut self, key: Self::Key, value: f32) -> bool;
}

/// One animated property
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Channel<K> {
    pub key: K,
    pub from: Option<f32>,
    pub to: f32,
}

impl<K: Copy> Channel<K> {
    pub fn value_at(&self, start: f32, progress: f32) -> f32 {
        if progress >= 1.0 {
            return self.to;
        }
        let from = self.from.unwrap_or(start);
        from + (self.to - from) * progress
    }
}

pub type Guard = Box<dyn Fn() -> bool>;
pub type Completion = Box<dyn FnOnce()>;

/// A set of property channels sharing one duration and easing
pub struct Tween<K> {
    pub(crate) channels: SmallVec<[Channel<K>; 4]>,
    pub(crate) duration: Duration,
    pub(crate) easing: Easing,
    pub(crate) delay: Duration,
    pub(crate) guard: Option<Guard>,
    pub(crate) on_complete: Option<Completion>,
}

impl<K: Copy + PartialEq + Debug> Tween<K> {
    pub fn new(duration: Duration, easing: Easing) -> Self {
        Self {
            channels: SmallVec::new(),
            duration,
            easing,
            delay: Duration::ZERO,
            guard: None,
            on_complete: None,
        }
    }

    pub fn millis(ms: u64, easing: Easing) -> Self {
        Self::new(Duration::from_millis(ms), easing)
    }

    /// Animate `key` from its value at the first tick to `to`
    pub fn to(mut self, key: K, to: f32) -> Self {
        self.channels.push(Channel { key, from: None, to });
        self
    }

    /// Animate `key` between explicit values
    pub fn from_to(mut self, key: K, from: f32, to: f32) -> Self {
        self.channels.push(Channel {
            key,
            from: Some(from),
            to,
        });
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Only write values while `guard` returns true. Re-checked every frame.
    pub fn guard(mut self, guard: impl Fn() -> bool + 'static) -> Self {
        self.guard = Some(Box::new(guard));
        self
    }

    /// Run `callback` once the tween has written its final values
    pub fn on_complete(mut self, callback: impl FnOnce() + 'static) -> Self {
        self.on_complete = Some(Box::new(callback));
        self
    }

    pub fn channels(&self) -> &[Channel<K>] {
        &self.channels
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn easing(&self) -> Easing {
        self.easing
    }

    pub fn touches(&self, key: K) -> bool {
        self.channels.iter().any(|channel| channel.key == key)
    }
}

impl<K: Debug> Debug for Tween<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tween")
            .field("channels", &self.channels)
            .field("duration", &self.duration)
            .field("easing", &self.easing)
            .field("delay", &self.delay)
            .field("guarded", &self.guard.is_some())
            .finish()
    }
}

/// Eased progress of a timed animation started at `start`
pub fn progress(now: Duration, start: Duration, duration: Duration, easing: Easing) -> f32 {
    if now <= start {
        return if duration.is_zero() { 1.0 } else { 0.0 };
    }
    if duration.is_zero() {
        return 1.0;
    }
    let t = (now - start).as_secs_f32() / duration.as_secs_f32();
    easing.apply(t)
}

/// A single scalar moving from one value to another
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transition {
    pub from: f32,
    pub to: f32,
    pub start: Duration,
    pub duration: Duration,
    pub easing: Easing,
}

impl Transition {
    pub fn new(from: f32, to: f32, start: Duration, duration: Duration, easing: Easing) -> Self {
        Self {
            from,
            to,
            start,
            duration,
            easing,
        }
    }

    pub fn value_at(&self, now: Duration) -> f32 {
        let t = progress(now, self.start, self.duration, self.easing);
        if t >= 1.0 {
            return self.to;
        }
        self.from + (self.to - self.from) * t
    }

    pub fn is_finished(&self, now: Duration) -> bool {
        now >= self.start + self.duration
    }

    /// Retarget in flight: continue from the current value toward `to`
    pub fn retarget(&mut self, now: Duration, to: f32) {
        self.from = self.value_at(now);
        self.to = to;
        self.start = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn test_transition_linear_midpoint() {
        let t = Transition::new(0.0, 100.0, ms(0), ms(100), Easing::Linear);
        assert_eq!(t.value_at(ms(50)), 50.0);
        assert_eq!(t.value_at(ms(500)), 100.0);
        assert!(t.is_finished(ms(100)));
    }

    #[test]
    fn test_transition_zero_duration_jumps() {
        let t = Transition::new(3.0, 9.0, ms(10), Duration::ZERO, Easing::ExpoOut);
        assert_eq!(t.value_at(ms(10)), 9.0);
    }

    #[test]
    fn test_transition_retarget_is_continuous() {
        let mut t = Transition::new(0.0, 100.0, ms(0), ms(100), Easing::Linear);
        t.retarget(ms(50), 0.0);
        assert_eq!(t.value_at(ms(50)), 50.0);
        assert_eq!(t.value_at(ms(100)), 25.0);
    }

    #[test]
    fn test_tween_builder_channels() {
        let tween = Tween::<u8>::millis(500, Easing::CubicOut).to(1, 15.0).from_to(2, 0.0, 15.0);
        assert_eq!(tween.channels().len(), 2);
        assert!(tween.touches(2));
        assert!(!tween.touches(3));
        assert_eq!(tween.channels()[1].value_at(99.0, 0.5), 7.5);
    }
}
