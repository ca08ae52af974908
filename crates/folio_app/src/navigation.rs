//! Section navigation
//!
//! [`NavigationService`] tracks which named page sections are active and
//! carries requests to scroll to one. [`SectionScroller`] answers those
//! requests by driving the scroller to the section's page offset.

use folio_core::stream::{Subject, Subscription};
use folio_core::time::SharedClock;
use folio_layout::{ElementState, ScrollerService};
use indexmap::IndexMap;
use std::rc::Rc;
use std::time::Duration;

pub struct NavigationService {
    active_sections: Subject<Vec<String>>,
    scroll_requests: Subject<String>,
}

impl NavigationService {
    pub fn new(clock: SharedClock) -> Self {
        Self {
            active_sections: Subject::behavior(clock.clone(), Vec::new()),
            scroll_requests: Subject::new(clock),
        }
    }

    /// Add or remove `name` from the active sections
    ///
    /// Publishes only when the set changes. Activation order is kept.
    pub fn enable_section(&self, name: &str, enabled: bool) {
        let mut sections = self.active_sections();
        let index = sections.iter().position(|section| section == name);

        match (enabled, index) {
            (true, None) => sections.push(name.to_string()),
            (false, Some(index)) => {
                sections.remove(index);
            }
            _ => return,
        }
        tracing::trace!("active sections: {:?}", sections);
        self.active_sections.next(sections);
    }

    pub fn active_sections(&self) -> Vec<String> {
        self.active_sections.value().unwrap_or_default()
    }

    pub fn is_active(&self, name: &str) -> bool {
        self.active_sections().iter().any(|section| section == name)
    }

    /// Current active sections, then every change
    pub fn active_sections_changes(&self) -> Subscription<Vec<String>> {
        self.active_sections.subscribe()
    }

    pub fn request_section_scroll(&self, name: &str) {
        self.scroll_requests.next(name.to_string());
    }

    pub fn section_scroll_requests(&self) -> Subscription<String> {
        self.scroll_requests.subscribe()
    }
}

/// Scrolls to sections requested through a [`NavigationService`]
pub struct SectionScroller {
    scroller: Rc<ScrollerService>,
    requests: Subscription<String>,
    sections: IndexMap<String, Rc<ElementState>>,
    duration: Duration,
}

impl SectionScroller {
    pub fn new(navigation: &NavigationService, scroller: Rc<ScrollerService>, duration: Duration) -> Self {
        Self {
            scroller,
            requests: navigation.section_scroll_requests(),
            sections: IndexMap::new(),
            duration,
        }
    }

    /// Make `name` a scroll target, optionally also a snap target
    pub fn add_section(&mut self, name: impl Into<String>, state: Rc<ElementState>, snap: bool) {
        if snap {
            self.scroller.add_section(state.offset().y);
        }
        self.sections.insert(name.into(), state);
    }

    pub fn section_y(&self, name: &str) -> Option<f32> {
        self.sections.get(name).map(|state| state.offset().y)
    }

    /// Handle queued requests. Only the newest one scrolls.
    pub fn poll(&mut self) -> Option<f32> {
        let name = self.requests.latest()?;
        let Some(y) = self.section_y(&name) else {
            tracing::warn!("scroll requested to unknown section '{}'", name);
            return None;
        };

        tracing::debug!("scrolling to section '{}' at {}", name, y);
        self.scroller.scroll_to_y(y, self.duration);
        Some(y)
    }
}

impl std::fmt::Debug for SectionScroller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SectionScroller")
            .field("sections", &self.sections.keys().collect::<Vec<_>>())
            .field("duration", &self.duration)
            .finish()
    }
}
