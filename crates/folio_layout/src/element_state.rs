//! Element state tracking
//!
//! An [`ElementState`] caches an element's client rect and page offset so the
//! compositor can read them many times per frame without touching layout. The
//! snapshots are stale until [`ElementState::update`] runs; the
//! [`ElementStateProvider`] refreshes every tracked state in one batched pass.

use crate::element::{ElementId, ElementRef};
use folio_core::geometry::{Point, Rect, Size};
use indexmap::IndexMap;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Selects what [`ElementState::update`] recomputes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ElementStateConfig {
    pub include_offset: bool,
    pub include_bounds: bool,
}

impl Default for ElementStateConfig {
    fn default() -> Self {
        Self {
            include_offset: true,
            include_bounds: true,
        }
    }
}

/// Cached layout snapshot of one host element
pub struct ElementState {
    element: ElementRef,
    config: ElementStateConfig,
    bounds: Cell<Rect>,
    offset: Cell<Point>,
}

impl ElementState {
    pub fn new(element: ElementRef, config: ElementStateConfig) -> Self {
        Self {
            element,
            config,
            bounds: Cell::new(Rect::default()),
            offset: Cell::new(Point::ZERO),
        }
    }

    pub fn element(&self) -> &ElementRef {
        &self.element
    }

    pub fn id(&self) -> ElementId {
        self.element.id()
    }

    pub fn config(&self) -> ElementStateConfig {
        self.config
    }

    /// Client rect as of the last update
    pub fn bounds(&self) -> Rect {
        self.bounds.get()
    }

    /// Page offset as of the last update
    pub fn offset(&self) -> Point {
        self.offset.get()
    }

    pub fn update(&self) {
        if self.config.include_bounds {
            self.bounds.set(self.element.bounding_client_rect());
        }
        if self.config.include_offset {
            self.offset.set(self.element.page_offset());
        }
    }

    /// Whether the element's page box, grown by `offset` on every side,
    /// overlaps the viewport at `scroll`. Touching edges don't count.
    pub fn in_viewport(&self, scroll: Point, viewport: Size, offset: Point) -> bool {
        let page_box = Rect::from_origin_size(self.offset(), self.bounds().size())
            .expand(offset.x, offset.y);
        page_box.intersects(&Rect::from_origin_size(scroll, viewport))
    }
}

impl std::fmt::Debug for ElementState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElementState")
            .field("element", &self.element.id())
            .field("bounds", &self.bounds.get())
            .field("offset", &self.offset.get())
            .finish()
    }
}

/// Registry of every live [`ElementState`]
#[derive(Default)]
pub struct ElementStateProvider {
    states: RefCell<IndexMap<ElementId, Rc<ElementState>>>,
}

impl ElementStateProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// The tracked state for `element`, created with the default config if new
    ///
    /// New states are not measured until the next [`update`](Self::update).
    pub fn create(&self, element: ElementRef) -> Rc<ElementState> {
        self.create_with(element, ElementStateConfig::default())
    }

    /// Like [`create`](Self::create); `config` only applies to new states
    pub fn create_with(&self, element: ElementRef, config: ElementStateConfig) -> Rc<ElementState> {
        let id = element.id();
        let mut states = self.states.borrow_mut();
        if let Some(state) = states.get(&id) {
            return Rc::clone(state);
        }

        tracing::trace!("tracking element {:?}", id);
        let state = Rc::new(ElementState::new(element, config));
        states.insert(id, Rc::clone(&state));
        state
    }

    pub fn get(&self, id: ElementId) -> Option<Rc<ElementState>> {
        self.states.borrow().get(&id).cloned()
    }

    /// Refresh every tracked state
    pub fn update(&self) {
        for state in self.snapshot() {
            state.update();
        }
    }

    /// Drop states whose element left `root`, refresh the rest
    pub fn prune_update(&self, root: ElementId) {
        let pruned = {
            let mut states = self.states.borrow_mut();
            let before = states.len();
            states.retain(|_, state| state.element.is_attached_under(root));
            before - states.len()
        };
        if pruned > 0 {
            tracing::debug!("pruned {} detached element states", pruned);
        }
        self.update();
    }

    /// Stop tracking a state. Returns false if it wasn't tracked.
    pub fn detach(&self, state: &ElementState) -> bool {
        self.states.borrow_mut().shift_remove(&state.id()).is_some()
    }

    /// Give back a handle from [`create`](Self::create)
    ///
    /// The state is detached only when no other holder remains. Returns
    /// whether it was detached.
    pub fn release(&self, state: Rc<ElementState>) -> bool {
        let mut states = self.states.borrow_mut();
        let Some(tracked) = states.get(&state.id()) else {
            return false;
        };
        if !Rc::ptr_eq(tracked, &state) || Rc::strong_count(&state) > 2 {
            return false;
        }
        states.shift_remove(&state.id());
        tracing::trace!("released element {:?}", state.id());
        true
    }

    pub fn len(&self) -> usize {
        self.states.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.borrow().is_empty()
    }

    fn snapshot(&self) -> Vec<Rc<ElementState>> {
        self.states.borrow().values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Document, HostElement};

    fn setup() -> (Document, ElementRef) {
        let doc = Document::new(Size::new(1280.0, 800.0));
        let body = doc.body().id();
        let el = doc
            .create(body, "div", Rect::new(0.0, 1000.0, 400.0, 200.0))
            .unwrap()
            .into_ref();
        (doc, el)
    }

    #[test]
    fn test_create_dedups_by_identity() {
        let (_, el) = setup();
        let provider = ElementStateProvider::new();
        let a = provider.create(Rc::clone(&el));
        let b = provider.create(el);
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(provider.len(), 1);
    }

    #[test]
    fn test_state_is_stale_until_update() {
        let (_, el) = setup();
        let provider = ElementStateProvider::new();
        let state = provider.create(el);
        assert_eq!(state.offset(), Point::ZERO);

        provider.update();
        assert_eq!(state.offset(), Point::new(0.0, 1000.0));
        assert_eq!(state.bounds().height, 200.0);
    }

    #[test]
    fn test_config_limits_update() {
        let (_, el) = setup();
        let state = ElementState::new(
            el,
            ElementStateConfig {
                include_offset: false,
                include_bounds: true,
            },
        );
        state.update();
        assert_eq!(state.offset(), Point::ZERO);
        assert_eq!(state.bounds().width, 400.0);
    }

    #[test]
    fn test_in_viewport_is_strict() {
        let (_, el) = setup();
        let state = ElementState::new(el, ElementStateConfig::default());
        state.update();
        let viewport = Size::new(1280.0, 800.0);

        // Viewport bottom touches element top
        assert!(!state.in_viewport(Point::new(0.0, 200.0), viewport, Point::ZERO));
        assert!(state.in_viewport(Point::new(0.0, 201.0), viewport, Point::ZERO));
        // Viewport top touches element bottom
        assert!(!state.in_viewport(Point::new(0.0, 1200.0), viewport, Point::ZERO));
        // Offset grows the element box
        assert!(state.in_viewport(Point::new(0.0, 150.0), viewport, Point::new(0.0, 100.0)));
    }

    #[test]
    fn test_prune_drops_detached() {
        let (doc, el) = setup();
        let provider = ElementStateProvider::new();
        let state = provider.create(Rc::clone(&el));
        provider.create(doc.body().into_ref());

        doc.detach(el.id());
        provider.prune_update(doc.body().id());
        assert_eq!(provider.len(), 1);
        assert!(provider.get(state.id()).is_none());
    }

    #[test]
    fn test_detach_removes_one() {
        let (_, el) = setup();
        let provider = ElementStateProvider::new();
        let state = provider.create(el);
        assert!(provider.detach(&state));
        assert!(!provider.detach(&state));
        assert!(provider.is_empty());
    }

    #[test]
    fn test_release_keeps_shared_state() {
        let (_, el) = setup();
        let provider = ElementStateProvider::new();
        let a = provider.create(Rc::clone(&el));
        let b = provider.create(el);

        assert!(!provider.release(a));
        assert_eq!(provider.len(), 1);
        assert!(provider.release(b));
        assert!(provider.is_empty());
    }
}
