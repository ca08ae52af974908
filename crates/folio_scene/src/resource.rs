//! Named resources
//!
//! Containers reference images by logical name only. A static JSON manifest
//! maps names to paths; [`ResourceProvider::load`] resolves every entry
//! through a [`ResourceLoader`] once at startup.
//!
//! ```json
//! [
//!   { "type": "image", "name": "cursor.outer", "path": "/images/cursor-outer.png", "extras": ["pixi"] }
//! ]
//! ```

use crate::error::{Result, SceneError};
use crate::node::Texture;
use folio_core::geometry::Size;
use folio_core::signal::OneShot;
use folio_core::stream::{Subject, Subscription};
use folio_core::time::SharedClock;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::path::{Path, PathBuf};

/// Extras tag marking entries that become canvas textures
pub const CANVAS_TAG: &str = "pixi";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Image,
    /// Entry types this crate doesn't load
    #[serde(other)]
    Other,
}

/// One manifest entry
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResourceEntry {
    #[serde(rename = "type")]
    pub kind: ResourceKind,
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub extras: Vec<String>,
}

impl ResourceEntry {
    pub fn image(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            kind: ResourceKind::Image,
            name: name.into(),
            path: path.into(),
            extras: vec![CANVAS_TAG.to_string()],
        }
    }

    pub fn is_canvas_texture(&self) -> bool {
        self.extras.iter().any(|extra| extra == CANVAS_TAG)
    }
}

/// The resource list loaded once at startup
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    pub entries: Vec<ResourceEntry>,
}

impl Manifest {
    pub fn new(entries: Vec<ResourceEntry>) -> Self {
        Self { entries }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A loaded resource
#[derive(Clone, Debug, PartialEq)]
pub struct Resource {
    pub name: String,
    pub path: String,
    pub size: Size,
    pub canvas: bool,
}

impl Resource {
    pub fn texture(&self) -> Texture {
        Texture::new(self.name.clone(), self.size)
    }
}

/// Resolves manifest entries into resources
pub trait ResourceLoader {
    fn load(&self, entry: &ResourceEntry) -> Result<Resource>;
}

/// Loads images from a directory, reading only their headers for dimensions
#[derive(Debug, Clone)]
pub struct FsResourceLoader {
    root: PathBuf,
}

impl FsResourceLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

impl ResourceLoader for FsResourceLoader {
    fn load(&self, entry: &ResourceEntry) -> Result<Resource> {
        let path = self.resolve(&entry.path);
        let (width, height) =
            image::image_dimensions(&path).map_err(|err| SceneError::ResourceLoad {
                name: entry.name.clone(),
                path: path.display().to_string(),
                reason: err.to_string(),
            })?;

        Ok(Resource {
            name: entry.name.clone(),
            path: entry.path.clone(),
            size: Size::new(width as f32, height as f32),
            canvas: entry.is_canvas_texture(),
        })
    }
}

/// Serves fixed dimensions by name; entries without one fail to load
#[derive(Debug, Clone, Default)]
pub struct MemoryResourceLoader {
    sizes: FxHashMap<String, Size>,
}

impl MemoryResourceLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, size: Size) -> Self {
        self.sizes.insert(name.into(), size);
        self
    }
}

impl ResourceLoader for MemoryResourceLoader {
    fn load(&self, entry: &ResourceEntry) -> Result<Resource> {
        let size = self
            .sizes
            .get(&entry.name)
            .copied()
            .ok_or_else(|| SceneError::ResourceLoad {
                name: entry.name.clone(),
                path: entry.path.clone(),
                reason: "not found".to_string(),
            })?;

        Ok(Resource {
            name: entry.name.clone(),
            path: entry.path.clone(),
            size,
            canvas: entry.is_canvas_texture(),
        })
    }
}

/// Name-keyed registry of loaded resources
pub struct ResourceProvider {
    resources: RefCell<FxHashMap<String, Resource>>,
    progress: Subject<f32>,
    loaded: OneShot<()>,
}

impl ResourceProvider {
    pub fn new(clock: SharedClock) -> Self {
        Self {
            resources: RefCell::new(FxHashMap::default()),
            progress: Subject::behavior(clock, 0.0),
            loaded: OneShot::new("resources loaded"),
        }
    }

    /// Load every image entry of `manifest`
    ///
    /// Publishes the loaded fraction after each resource and resolves
    /// [`loaded`](Self::loaded) once all succeed. The first failure is
    /// returned as is; nothing is retried. Calling again after a successful
    /// load returns the loaded set without touching the loader.
    pub fn load(&self, manifest: &Manifest, loader: &dyn ResourceLoader) -> Result<Vec<Resource>> {
        if self.loaded.is_resolved() {
            return Ok(self.resources.borrow().values().cloned().collect());
        }

        let total = manifest.len().max(1) as f32;
        let mut loaded = Vec::with_capacity(manifest.len());

        for entry in manifest.entries.iter().filter(|e| e.kind == ResourceKind::Image) {
            let resource = match loader.load(entry) {
                Ok(resource) => resource,
                Err(err) => {
                    tracing::warn!("resource '{}' failed to load: {}", entry.name, err);
                    return Err(err);
                }
            };
            tracing::debug!(
                "loaded resource '{}' ({}x{})",
                resource.name,
                resource.size.width,
                resource.size.height
            );

            let count = {
                let mut resources = self.resources.borrow_mut();
                resources.insert(resource.name.clone(), resource.clone());
                resources.len()
            };
            self.progress.next(count as f32 / total);
            loaded.push(resource);
        }

        if let Err(err) = self.loaded.resolve(()) {
            tracing::warn!("{}", err);
        }
        self.progress.complete();
        Ok(loaded)
    }

    /// Register a resource directly
    pub fn insert(&self, resource: Resource) {
        self.resources
            .borrow_mut()
            .insert(resource.name.clone(), resource);
    }

    pub fn get(&self, name: &str) -> Result<Resource> {
        self.resources
            .borrow()
            .get(name)
            .cloned()
            .ok_or_else(|| SceneError::ResourceNotFound(name.to_string()))
    }

    pub fn texture(&self, name: &str) -> Result<Texture> {
        self.get(name).map(|resource| resource.texture())
    }

    pub fn len(&self) -> usize {
        self.resources.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.borrow().is_empty()
    }

    /// Loaded fraction in `[0, 1]`
    pub fn progress(&self) -> Subscription<f32> {
        self.progress.subscribe()
    }

    pub fn loaded(&self) -> OneShot<()> {
        self.loaded.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::time::ManualClock;
    use std::rc::Rc;

    const MANIFEST: &str = r#"[
        { "type": "image", "name": "cursor.outer", "path": "/images/outer.png", "extras": ["pixi"] },
        { "type": "image", "name": "cursor.inner", "path": "/images/inner.png" },
        { "type": "font", "name": "body", "path": "/fonts/body.woff" }
    ]"#;

    fn provider() -> ResourceProvider {
        ResourceProvider::new(Rc::new(ManualClock::new()))
    }

    fn loader() -> MemoryResourceLoader {
        MemoryResourceLoader::new()
            .with("cursor.outer", Size::new(140.0, 140.0))
            .with("cursor.inner", Size::new(16.0, 16.0))
    }

    #[test]
    fn test_manifest_parses_entries() {
        let manifest = Manifest::from_json(MANIFEST).unwrap();
        assert_eq!(manifest.len(), 3);
        assert!(manifest.entries[0].is_canvas_texture());
        assert!(!manifest.entries[1].is_canvas_texture());
        assert_eq!(manifest.entries[2].kind, ResourceKind::Other);
    }

    #[test]
    fn test_load_publishes_progress_and_resolves() {
        let provider = provider();
        let progress = provider.progress();
        let manifest = Manifest::from_json(MANIFEST).unwrap();

        let loaded = provider.load(&manifest, &loader()).unwrap();
        assert_eq!(loaded.len(), 2);
        assert!(provider.loaded().is_resolved());

        let steps = progress.drain();
        assert_eq!(steps.len(), 3);
        assert_eq!(steps[0], 0.0);
        assert!((steps[2] - 2.0 / 3.0).abs() < 1e-6);

        assert_eq!(provider.get("cursor.inner").unwrap().size, Size::new(16.0, 16.0));
        assert_eq!(provider.texture("cursor.outer").unwrap().size.width, 140.0);
    }

    #[test]
    fn test_second_load_is_cached() {
        let provider = provider();
        let manifest = Manifest::from_json(MANIFEST).unwrap();
        provider.load(&manifest, &loader()).unwrap();
        let again = provider.load(&manifest, &MemoryResourceLoader::new()).unwrap();
        assert_eq!(again.len(), 2);
    }

    #[test]
    fn test_failure_propagates_and_keeps_pending() {
        let provider = provider();
        let manifest = Manifest::from_json(MANIFEST).unwrap();
        let partial = MemoryResourceLoader::new().with("cursor.outer", Size::new(1.0, 1.0));

        let err = provider.load(&manifest, &partial).unwrap_err();
        assert!(matches!(err, SceneError::ResourceLoad { .. }));
        assert!(!provider.loaded().is_completed());
        assert!(matches!(provider.get("missing"), Err(SceneError::ResourceNotFound(_))));
    }

    #[test]
    fn test_fs_loader_reports_missing_file() {
        let loader = FsResourceLoader::new("/nonexistent-folio-assets");
        let entry = ResourceEntry::image("x", "/x.png");
        assert!(matches!(loader.load(&entry), Err(SceneError::ResourceLoad { .. })));
    }
}
