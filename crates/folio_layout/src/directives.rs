//! Element bindings driven by scroll and viewport changes

use crate::element::ElementRef;
use crate::element_state::ElementStateProvider;
use crate::error::{LayoutError, Result};
use crate::in_viewport::{element_in_viewport_once, ElementInViewport};
use crate::scroller::ScrollerService;
use crate::viewport::ViewportProvider;
use folio_core::geometry::Size;
use folio_core::stream::Subscription;
use std::rc::Rc;
use std::time::Duration;

/// Class toggled on elements that have scrolled into view
pub const VISIBLE_CLASS: &str = "visible-trigger--visible";

// ─────────────────────────────────────────────────────────────────────────────
// Visible trigger
// ─────────────────────────────────────────────────────────────────────────────

/// Adds [`VISIBLE_CLASS`] to an element the first time it enters the viewport
pub struct VisibleTrigger {
    element: ElementRef,
    tracker: ElementInViewport,
}

impl VisibleTrigger {
    /// `offset` is the vertical margin as a fraction of the viewport height
    pub fn bind(
        element: ElementRef,
        states: &ElementStateProvider,
        scroller: &ScrollerService,
        viewport: Rc<ViewportProvider>,
        offset: f32,
    ) -> Self {
        let state = states.create(Rc::clone(&element));
        let tracker = element_in_viewport_once(scroller, viewport, state, 0.0, offset, Duration::ZERO);
        Self { element, tracker }
    }

    pub fn poll(&mut self, now: Duration) {
        if let Some(visible) = self.tracker.poll(now) {
            self.element.toggle_class(VISIBLE_CLASS, visible);
        }
    }

    pub fn is_done(&self) -> bool {
        self.tracker.is_done()
    }

    /// Stop tracking the element's state
    pub fn unbind(self, states: &ElementStateProvider) {
        states.detach(self.tracker.state());
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Detect size
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DetectSizeOptions {
    pub ignore_width: bool,
    pub ignore_height: bool,
}

/// Sizes an element to its first child, again after every viewport resize
pub struct DetectSize {
    element: ElementRef,
    options: DetectSizeOptions,
    resizes: Subscription<Size>,
}

impl DetectSize {
    pub fn inserted(
        element: ElementRef,
        viewport: &ViewportProvider,
        options: DetectSizeOptions,
    ) -> Result<Self> {
        if element.first_child().is_none() {
            return Err(LayoutError::NoChild(element.id()));
        }

        let resizes = viewport.subscribe();
        resizes.drain();
        let detect = Self {
            element,
            options,
            resizes,
        };
        detect.update_bounds();
        Ok(detect)
    }

    pub fn update_bounds(&self) {
        let Some(child) = self.element.first_child() else {
            tracing::warn!("detect-size element {:?} lost its child", self.element.id());
            return;
        };
        let bounds = child.bounding_client_rect();
        self.element.set_size(
            (!self.options.ignore_width).then_some(bounds.width),
            (!self.options.ignore_height).then_some(bounds.height),
        );
    }

    /// Re-measure if the viewport was resized since the last poll
    pub fn poll(&self) {
        if self.resizes.latest().is_some() {
            self.update_bounds();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Document, HostElement};
    use crate::scroller::{InputDevice, ScrollerConfig};
    use folio_core::geometry::{Point, Rect};
    use folio_core::time::{Clock, ManualClock, SharedClock};

    #[test]
    fn test_detect_size_requires_child() {
        let doc = Document::new(Size::new(800.0, 600.0));
        let viewport = ViewportProvider::new(Rc::new(ManualClock::new()), Size::new(800.0, 600.0));
        let empty = doc
            .create(doc.body().id(), "div", Rect::new(0.0, 0.0, 10.0, 10.0))
            .unwrap();
        let result = DetectSize::inserted(empty.into_ref(), &viewport, DetectSizeOptions::default());
        assert!(matches!(result, Err(LayoutError::NoChild(_))));
    }

    #[test]
    fn test_detect_size_follows_child() {
        let doc = Document::new(Size::new(800.0, 600.0));
        let viewport = ViewportProvider::new(Rc::new(ManualClock::new()), Size::new(800.0, 600.0));
        let outer = doc
            .create(doc.body().id(), "div", Rect::new(0.0, 0.0, 10.0, 10.0))
            .unwrap();
        let child = doc
            .create(outer.id(), "img", Rect::new(0.0, 0.0, 320.0, 180.0))
            .unwrap();

        let detect = DetectSize::inserted(
            outer.clone().into_ref(),
            &viewport,
            DetectSizeOptions {
                ignore_width: false,
                ignore_height: true,
            },
        )
        .unwrap();
        let rect = outer.bounding_client_rect();
        assert_eq!((rect.width, rect.height), (320.0, 10.0));

        doc.set_frame(child.id(), Rect::new(0.0, 0.0, 640.0, 360.0)).unwrap();
        detect.poll();
        assert_eq!(outer.bounding_client_rect().width, 320.0);

        viewport.resize(Size::new(1024.0, 768.0));
        detect.poll();
        assert_eq!(outer.bounding_client_rect().width, 640.0);
    }

    #[test]
    fn test_visible_trigger_toggles_class_once() {
        let clock = ManualClock::new();
        let shared: SharedClock = Rc::new(clock.clone());
        let doc = Document::new(Size::new(1280.0, 800.0));
        let main = doc
            .create(doc.body().id(), "main", Rect::new(0.0, 0.0, 1280.0, 3000.0))
            .unwrap();
        let heading = doc
            .create(main.id(), "h2", Rect::new(0.0, 1200.0, 600.0, 100.0))
            .unwrap();

        let states = ElementStateProvider::new();
        let scroller = ScrollerService::new(
            Rc::clone(&shared),
            Rc::new(ElementStateProvider::new()),
            ScrollerConfig {
                output_duration: Duration::ZERO,
                ..ScrollerConfig::default()
            },
        );
        scroller.set_root_element(doc.body().into_ref());
        let viewport = Rc::new(ViewportProvider::new(shared, Size::new(1280.0, 800.0)));

        let mut trigger = VisibleTrigger::bind(
            heading.clone().into_ref(),
            &states,
            &scroller,
            viewport,
            0.0,
        );
        states.update();

        scroller.input(InputDevice::Drag, Point::new(0.0, 600.0));
        clock.advance_ms(16);
        scroller.tick();
        trigger.poll(clock.now());
        assert!(heading.has_class(VISIBLE_CLASS));
        assert!(trigger.is_done());

        trigger.unbind(&states);
        assert!(states.is_empty());
    }
}
