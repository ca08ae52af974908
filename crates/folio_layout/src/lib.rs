//! Folio Layout
//!
//! Everything the compositor learns about the host page:
//!
//! - [`HostElement`]: the element seam, with an in-memory [`Document`]
//! - [`ElementStateProvider`]: batched client rect / page offset snapshots
//! - [`ViewportProvider`] and [`PointerProvider`]: pushed host input
//! - [`ScrollerService`]: the smooth scroll engine and its state streams
//! - [`parallax`], [`element_in_viewport`], [`VisibleTrigger`], [`DetectSize`]
//!
//! # Example
//!
//! ```rust
//! use folio_core::geometry::{Point, Rect, Size};
//! use folio_core::time::{ManualClock, SharedClock};
//! use folio_layout::prelude::*;
//! use std::rc::Rc;
//!
//! let clock: SharedClock = Rc::new(ManualClock::new());
//! let doc = Document::new(Size::new(1280.0, 800.0));
//! doc.create(doc.body().id(), "main", Rect::new(0.0, 0.0, 1280.0, 3000.0)).unwrap();
//!
//! let states = Rc::new(ElementStateProvider::new());
//! let scroller = ScrollerService::new(clock, states, ScrollerConfig::default());
//! scroller.set_root_element(doc.body().into_ref());
//! scroller.input(InputDevice::Drag, Point::new(0.0, 400.0));
//! assert_eq!(scroller.virtual_position().y, 400.0);
//! ```

pub mod directives;
pub mod element;
pub mod element_state;
pub mod error;
pub mod in_viewport;
pub mod parallax;
pub mod pointer;
pub mod scroller;
pub mod viewport;

pub use directives::{DetectSize, DetectSizeOptions, VisibleTrigger, VISIBLE_CLASS};
pub use element::{Document, DomElement, ElementId, ElementRef, HostElement};
pub use element_state::{ElementState, ElementStateConfig, ElementStateProvider};
pub use error::{LayoutError, Result};
pub use in_viewport::{element_in_viewport, element_in_viewport_once, ElementInViewport};
pub use parallax::parallax;
pub use pointer::PointerProvider;
pub use scroller::{
    InputDevice, InputMultipliers, ScrollState, ScrollTrigger, ScrollerConfig, ScrollerService,
    SnapConfig,
};
pub use viewport::ViewportProvider;

/// Commonly used types
pub mod prelude {
    pub use crate::element::{Document, ElementRef, HostElement};
    pub use crate::element_state::{ElementState, ElementStateProvider};
    pub use crate::pointer::PointerProvider;
    pub use crate::scroller::{InputDevice, ScrollState, ScrollTrigger, ScrollerConfig, ScrollerService};
    pub use crate::viewport::ViewportProvider;
}
