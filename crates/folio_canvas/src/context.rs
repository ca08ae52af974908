//! Shared services for containers and extras
//!
//! Every service the compositor needs is built once here and handed around by
//! cloning the context, which only clones `Rc` handles.

use crate::cursor_service::CursorService;
use folio_core::geometry::Size;
use folio_core::time::SharedClock;
use folio_layout::{ElementStateProvider, PointerProvider, ScrollerConfig, ScrollerService, ViewportProvider};
use folio_scene::{EstimatedTextMeasurer, ResourceProvider, SceneGraph, SceneTweenHandle, SceneTweens, TextMeasurer};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

/// Dependency-injected services shared by one compositor
#[derive(Clone)]
pub struct FolioContext {
    pub clock: SharedClock,
    pub scene: Rc<RefCell<SceneGraph>>,
    pub tweens: Rc<SceneTweens>,
    pub states: Rc<ElementStateProvider>,
    pub viewport: Rc<ViewportProvider>,
    pub pointer: Rc<PointerProvider>,
    pub scroller: Rc<ScrollerService>,
    pub resources: Rc<ResourceProvider>,
    pub cursor: Rc<CursorService>,
    pub measurer: Rc<dyn TextMeasurer>,
    surface_available: bool,
}

impl FolioContext {
    pub fn new(clock: SharedClock, viewport_size: Size) -> Self {
        let states = Rc::new(ElementStateProvider::new());
        Self {
            scene: Rc::new(RefCell::new(SceneGraph::new())),
            tweens: Rc::new(SceneTweens::new(Rc::clone(&clock))),
            viewport: Rc::new(ViewportProvider::new(Rc::clone(&clock), viewport_size)),
            pointer: Rc::new(PointerProvider::new(Rc::clone(&clock))),
            scroller: Rc::new(ScrollerService::new(
                Rc::clone(&clock),
                Rc::clone(&states),
                ScrollerConfig::default(),
            )),
            resources: Rc::new(ResourceProvider::new(Rc::clone(&clock))),
            cursor: Rc::new(CursorService::new(Rc::clone(&clock))),
            measurer: Rc::new(EstimatedTextMeasurer),
            states,
            clock,
            surface_available: true,
        }
    }

    /// Replace the scroller with one using `config`
    ///
    /// Must run before anything subscribes to the scroller.
    pub fn with_scroller_config(mut self, config: ScrollerConfig) -> Self {
        self.scroller = Rc::new(ScrollerService::new(
            Rc::clone(&self.clock),
            Rc::clone(&self.states),
            config,
        ));
        self
    }

    /// Whether a drawing surface exists (filters that need one are skipped otherwise)
    pub fn with_surface_available(mut self, available: bool) -> Self {
        self.surface_available = available;
        self
    }

    pub fn with_text_measurer(mut self, measurer: Rc<dyn TextMeasurer>) -> Self {
        self.measurer = measurer;
        self
    }

    pub fn surface_available(&self) -> bool {
        self.surface_available
    }

    pub fn tween_handle(&self) -> SceneTweenHandle {
        self.tweens.handle()
    }

    pub fn now(&self) -> Duration {
        self.clock.now()
    }
}

impl std::fmt::Debug for FolioContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FolioContext")
            .field("now", &self.clock.now())
            .field("viewport", &self.viewport.size())
            .field("nodes", &self.scene.try_borrow().map(|scene| scene.node_count()).ok())
            .field("tweens", &self.tweens.active_count())
            .field("surface_available", &self.surface_available)
            .finish()
    }
}
