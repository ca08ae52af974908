//! Page preloader
//!
//! The preloader resolves once the page may start revealing itself. Anything
//! that waits for the page to finish loading awaits [`PreloaderService::loaded`].

use folio_core::signal::{OneShot, Wait};
use folio_scene::ResourceProvider;

pub struct PreloaderService {
    loaded: OneShot<()>,
}

impl Default for PreloaderService {
    fn default() -> Self {
        Self::new()
    }
}

impl PreloaderService {
    pub fn new() -> Self {
        Self {
            loaded: OneShot::new("preloader loaded"),
        }
    }

    /// Mark the page as loaded. Repeated calls are ignored.
    pub fn resolve_loaded(&self) {
        if self.loaded.is_completed() {
            tracing::trace!("preloader already resolved");
            return;
        }
        if let Err(err) = self.loaded.resolve(()) {
            tracing::warn!("{}", err);
            return;
        }
        tracing::debug!("preloader resolved");
    }

    /// Resolve as soon as `resources` reports every resource loaded
    ///
    /// Returns whether the preloader is now resolved.
    pub fn poll_resources(&self, resources: &ResourceProvider) -> bool {
        if resources.loaded().is_resolved() {
            self.resolve_loaded();
        }
        self.is_loaded()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.is_resolved()
    }

    pub fn loaded(&self) -> Wait<()> {
        self.loaded.wait()
    }
}

impl std::fmt::Debug for PreloaderService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreloaderService")
            .field("loaded", &self.is_loaded())
            .finish()
    }
}
