//! Folio Core
//!
//! Foundational primitives shared by every Folio crate:
//!
//! - **Geometry**: points, sizes and rectangles in logical pixels
//! - **Math**: range mapping, clamping and the scroll tween used by parallax
//! - **One-shot signals**: single-resolution readiness futures
//! - **Streams**: single-threaded multicast subjects with pull subscriptions
//! - **Timing**: injectable clocks plus debounce, interval and audit windows
//!
//! Everything here is single-threaded. Shared state lives behind `Rc` handles
//! and is driven by the compositor's frame tick.
//!
//! # Example
//!
//! ```rust
//! use folio_core::stream::Subject;
//! use folio_core::time::{ManualClock, SharedClock};
//! use std::rc::Rc;
//! use std::time::Duration;
//!
//! let clock = ManualClock::new();
//! let shared: SharedClock = Rc::new(clock.clone());
//! let subject = Subject::new(shared);
//! let sub = subject.subscribe();
//!
//! subject.next(5);
//! clock.advance(Duration::from_millis(16));
//! subject.next(6);
//!
//! assert_eq!(sub.drain(), vec![5, 6]);
//! ```

pub mod error;
pub mod geometry;
pub mod math;
pub mod signal;
pub mod stream;
pub mod time;

pub use error::{CoreError, Result};
pub use geometry::{Axis, Point, Rect, Size};
pub use math::{clamp, map_range, scroll_tween};
pub use signal::{OneShot, Wait};
pub use stream::{Audited, Distinct, Subject, Subscription};
pub use time::{Audit, Clock, Debounce, Interval, ManualClock, SharedClock, SystemClock};
