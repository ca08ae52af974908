//! Element-in-viewport tracking
//!
//! Follows the settled scroll position and reports whether an element is
//! inside the viewport, only when that answer changes.

use crate::element_state::ElementState;
use crate::scroller::{ScrollState, ScrollerService};
use crate::viewport::ViewportProvider;
use folio_core::geometry::Point;
use folio_core::stream::{Audited, Distinct};
use std::rc::Rc;
use std::time::Duration;

/// Visibility changes of one element
///
/// Offsets are fractions of the viewport size added around the element on
/// each side. Scroll states are audited over `debounce` before testing.
pub struct ElementInViewport {
    state: Rc<ElementState>,
    viewport: Rc<ViewportProvider>,
    offset: Point,
    scroll: Audited<ScrollState>,
    distinct: Distinct<bool>,
    once: bool,
    done: bool,
}

impl ElementInViewport {
    /// Returns the new visibility if it changed since the last report
    pub fn poll(&mut self, now: Duration) -> Option<bool> {
        if self.done {
            return None;
        }
        let state = self.scroll.poll(now)?;
        let size = self.viewport.size();
        let offset = Point::new(self.offset.x * size.width, self.offset.y * size.height);
        let visible = self.state.in_viewport(state.position, size, offset);

        let changed = self.distinct.accept(visible)?;
        if self.once && changed {
            self.done = true;
        }
        Some(changed)
    }

    /// True once a one-shot tracker has reported visibility
    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn state(&self) -> &Rc<ElementState> {
        &self.state
    }
}

/// Track whether `state`'s element is in the viewport
pub fn element_in_viewport(
    scroller: &ScrollerService,
    viewport: Rc<ViewportProvider>,
    state: Rc<ElementState>,
    offset_x: f32,
    offset_y: f32,
    debounce: Duration,
) -> ElementInViewport {
    ElementInViewport {
        state,
        viewport,
        offset: Point::new(offset_x, offset_y),
        scroll: scroller.scroll_animation().audit(debounce),
        distinct: Distinct::new(),
        once: false,
        done: false,
    }
}

/// Like [`element_in_viewport`], but stops after first reporting `true`
pub fn element_in_viewport_once(
    scroller: &ScrollerService,
    viewport: Rc<ViewportProvider>,
    state: Rc<ElementState>,
    offset_x: f32,
    offset_y: f32,
    debounce: Duration,
) -> ElementInViewport {
    ElementInViewport {
        once: true,
        ..element_in_viewport(scroller, viewport, state, offset_x, offset_y, debounce)
    }
}
