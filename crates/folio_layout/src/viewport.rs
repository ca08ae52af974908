//! Viewport size provider
//!
//! The host pushes resizes; consumers read the current size synchronously or
//! follow an audited change stream.

use folio_core::geometry::Size;
use folio_core::stream::{Audited, Subject, Subscription};
use folio_core::time::SharedClock;
use std::time::Duration;

/// Single producer of the viewport size
pub struct ViewportProvider {
    size: Subject<Size>,
}

impl ViewportProvider {
    pub fn new(clock: SharedClock, initial: Size) -> Self {
        Self {
            size: Subject::behavior(clock, initial),
        }
    }

    pub fn resize(&self, size: Size) {
        tracing::trace!("viewport resized to {}x{}", size.width, size.height);
        self.size.next(size);
    }

    pub fn size(&self) -> Size {
        self.size.value().unwrap_or_default()
    }

    /// Every size, starting with the current one
    pub fn subscribe(&self) -> Subscription<Size> {
        self.size.subscribe()
    }

    /// Sizes coalesced through an audit window of `window`
    pub fn changed(&self, window: Duration) -> Audited<Size> {
        self.size.subscribe().audit(window)
    }
}
