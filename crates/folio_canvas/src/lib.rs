//! Folio Canvas
//!
//! Keeps a retained scene graph in lock-step with host layout, scroll and
//! pointer input.
//!
//! - [`Container`]: one scene node bound to content (background, cursor,
//!   image, text, video) with a typed registry of extras
//! - [`extras`]: parallax, displacement, mouse motion, mouse twist, motion
//!   blur and visibility behaviours layered onto any node
//! - [`CanvasDelegatorService`] and [`Surface`]: named render surfaces and the
//!   containers routed to them
//! - [`Compositor`]: the per-frame driver
//! - [`FolioContext`]: every shared service, built once and passed around
//!
//! # Example
//!
//! ```rust
//! use folio_canvas::prelude::*;
//! use folio_core::geometry::{Rect, Size};
//! use folio_core::time::ManualClock;
//! use folio_layout::Document;
//! use std::rc::Rc;
//!
//! let clock = ManualClock::new();
//! let ctx = FolioContext::new(Rc::new(clock.clone()), Size::new(1280.0, 800.0));
//! let doc = Document::new(Size::new(1280.0, 800.0));
//! let title = doc
//!     .create(doc.body().id(), "h1", Rect::new(80.0, 200.0, 600.0, 120.0))
//!     .unwrap();
//!
//! let mut compositor = Compositor::new(ctx.clone(), CompositorConfig::default());
//! compositor.add_surface("main").unwrap();
//! let text = Container::new_text(ctx, title.into_ref(), "Folio", TextConfig::default());
//! let text = compositor.add_container("main", text).unwrap();
//!
//! clock.advance_ms(16);
//! compositor.frame();
//! assert!(text.borrow().is_ready());
//! ```

pub mod compositor;
pub mod container;
pub mod content;
pub mod context;
pub mod cursor_service;
pub mod delegator;
pub mod error;
pub mod extras;
pub mod surface;

#[cfg(test)]
mod tests;

pub use compositor::{Compositor, CompositorConfig, FrameStats, FRAME_TIME};
pub use container::{Container, ContainerContent, ContainerCore, Lifecycle};
pub use content::{
    BackgroundConfig, CursorConfig, ImageConfig, MainBackground, MainCursor, RelatedImage,
    RelatedText, RelatedVideo, Stretch, TextConfig, VideoConfig,
};
pub use context::FolioContext;
pub use cursor_service::{CursorPosition, CursorService, CursorState};
pub use delegator::{CanvasDelegator, CanvasDelegatorService, ContainerRef, DelegatorRef};
pub use error::{CanvasError, Result};
pub use extras::{Behavior, ExtraHandle, ExtraKind, ExtraRegistry, ExtraType};
pub use surface::Surface;

/// Commonly used types
pub mod prelude {
    pub use crate::compositor::{Compositor, CompositorConfig, FrameStats};
    pub use crate::container::{Container, Lifecycle};
    pub use crate::content::{
        BackgroundConfig, CursorConfig, ImageConfig, Stretch, TextConfig, VideoConfig,
    };
    pub use crate::context::FolioContext;
    pub use crate::cursor_service::{CursorService, CursorState};
    pub use crate::delegator::{CanvasDelegator, CanvasDelegatorService, ContainerRef};
    pub use crate::error::{CanvasError, Result};
    pub use crate::extras::{
        Displacement, DisplacementConfig, ExtraKind, MotionBlur, MotionBlurConfig, MouseMotion,
        MouseMotionConfig, MouseTwist, MouseTwistConfig, Parallax, ParallaxConfig, Visibility,
        VisibilityConfig,
    };
    pub use crate::surface::Surface;
}
