//! The concrete render surface
//!
//! A [`Surface`] owns one root node in the scene graph. Containers routed to it
//! get a fresh child node, are bound and initialised on arrival, and are
//! destroyed when they leave the list. Children are kept sorted by z-index with
//! arrival order breaking ties. Containers whose init failed are retried once
//! more resources have been loaded.

use crate::container::Lifecycle;
use crate::context::FolioContext;
use crate::delegator::{CanvasDelegator, ContainerRef};
use folio_scene::{Content, NodeId};
use std::rc::Rc;

pub struct Surface {
    name: String,
    ctx: FolioContext,
    root: NodeId,
    containers: Vec<ContainerRef>,
    /// Resource count at the last init attempt
    resources_seen: usize,
}

impl Surface {
    /// Create the surface's root node under the scene root
    pub fn new(ctx: FolioContext, name: impl Into<String>) -> crate::Result<Self> {
        let name = name.into();
        let root = {
            let mut scene = ctx.scene.borrow_mut();
            let root = scene.create_named(format!("surface.{}", name), Content::Container);
            let scene_root = scene.root();
            scene.add_child(scene_root, root)?;
            root
        };
        Ok(Self {
            name,
            ctx,
            root,
            containers: Vec::new(),
            resources_seen: 0,
        })
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn containers(&self) -> &[ContainerRef] {
        &self.containers
    }

    /// Containers whose `init()` has finished
    pub fn ready_count(&self) -> usize {
        self.containers
            .iter()
            .filter(|container| container.borrow().is_ready())
            .count()
    }

    fn attach(&mut self, container: &ContainerRef) {
        self.resources_seen = self.ctx.resources.len();
        let mut container = container.borrow_mut();
        if container.lifecycle() == Lifecycle::Unbound {
            let node = {
                let mut scene = self.ctx.scene.borrow_mut();
                let node = scene.create_named(container.kind_name(), Content::Container);
                if let Err(err) = scene.add_child(self.root, node) {
                    tracing::warn!("can't attach container to surface '{}': {}", self.name, err);
                }
                node
            };
            if let Err(err) = container.bind(node) {
                tracing::warn!("{}", err);
                return;
            }
        }

        if container.lifecycle() == Lifecycle::Initializing {
            if let Err(err) = container.init() {
                tracing::warn!(
                    "{} container failed to initialise on '{}': {}",
                    container.kind_name(),
                    self.name,
                    err
                );
            }
        }
    }

    /// Init pending containers again if resources arrived since the last try
    fn retry_pending(&mut self) {
        let resources = self.ctx.resources.len();
        if resources == self.resources_seen {
            return;
        }
        self.resources_seen = resources;

        for container in &self.containers {
            let mut container = container.borrow_mut();
            if container.lifecycle() != Lifecycle::Initializing {
                continue;
            }
            match container.init() {
                Ok(()) => tracing::debug!("{} container initialised late on '{}'", container.kind_name(), self.name),
                Err(err) => tracing::trace!("{} container still pending: {}", container.kind_name(), err),
            }
        }
    }
}

impl CanvasDelegator for Surface {
    fn name(&self) -> &str {
        &self.name
    }

    fn containers_updated(&mut self, containers: &[ContainerRef]) {
        for removed in self
            .containers
            .iter()
            .filter(|known| !containers.iter().any(|c| Rc::ptr_eq(c, known)))
        {
            removed.borrow_mut().destroy();
        }

        let added: Vec<ContainerRef> = containers
            .iter()
            .filter(|c| !self.containers.iter().any(|known| Rc::ptr_eq(c, known)))
            .cloned()
            .collect();
        for container in &added {
            self.attach(container);
        }

        // Arrival order, then a stable sort by z-index
        self.containers = containers.to_vec();
        self.containers.sort_by_key(|container| container.borrow().z_index());
        self.ctx.scene.borrow_mut().sort_children(self.root);
        tracing::trace!("surface '{}' holds {} containers", self.name, self.containers.len());
    }

    fn sync_containers(&mut self, update_viewport: bool) {
        self.retry_pending();
        let viewport = self.ctx.viewport.size();
        for container in &self.containers {
            let mut container = container.borrow_mut();
            if update_viewport {
                container.set_viewport_size(viewport);
            }
            if !container.is_ready() {
                continue;
            }
            if let Err(err) = container.sync() {
                tracing::warn!("{} container sync failed: {}", container.kind_name(), err);
            }
        }
    }

    fn render_containers(&mut self, delta: f32) {
        self.retry_pending();
        for container in &self.containers {
            let mut container = container.borrow_mut();
            if !container.is_ready() {
                continue;
            }
            if let Err(err) = container.render(delta) {
                tracing::warn!("{} container render failed: {}", container.kind_name(), err);
            }
        }
    }
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("name", &self.name)
            .field("root", &self.root)
            .field("containers", &self.containers.len())
            .finish()
    }
}
