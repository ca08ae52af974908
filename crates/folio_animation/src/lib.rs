//! Folio Animation
//!
//! Timed tweens over numeric properties.
//!
//! # Features
//!
//! - **Easing**: the sine, cubic, quint and expo curves used across Folio
//! - **Tweens**: multi-channel property tweens with optional guards and completion callbacks
//! - **Transitions**: single-value tweens for state owned outside a property target
//! - **Scheduler**: cancellable-by-id tween registry ticked once per frame
//!
//! The scheduler is generic over the property key so any target implementing
//! [`PropertyTarget`] (the scene graph in practice) can be animated.

pub mod easing;
pub mod scheduler;
pub mod tween;

pub use easing::Easing;
pub use scheduler::{SchedulerHandle, TweenId, TweenScheduler};
pub use tween::{progress, Channel, PropertyTarget, Transition, Tween};
