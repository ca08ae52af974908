//! Named render surfaces and the containers routed to them
//!
//! A [`CanvasDelegator`] is anything that draws a changing set of containers.
//! The [`CanvasDelegatorService`] owns the container list of every registered
//! delegator and pushes the full list to it whenever the list changes,
//! starting with an empty list on registration.

use crate::container::Container;
use crate::error::{CanvasError, Result};
use indexmap::IndexMap;
use std::cell::RefCell;
use std::rc::Rc;

pub type ContainerRef = Rc<RefCell<Container>>;

pub type DelegatorRef = Rc<RefCell<dyn CanvasDelegator>>;

/// A surface containers can be routed to
pub trait CanvasDelegator {
    fn name(&self) -> &str;

    /// The complete, current container list
    fn containers_updated(&mut self, containers: &[ContainerRef]);

    /// Re-layout every container, optionally picking up the viewport size first
    fn sync_containers(&mut self, update_viewport: bool);

    /// Render every container for one frame
    fn render_containers(&mut self, delta: f32);
}

struct Entry {
    delegator: DelegatorRef,
    containers: Vec<ContainerRef>,
}

impl Entry {
    fn notify(&self) {
        self.delegator.borrow_mut().containers_updated(&self.containers);
    }
}

/// Registry of delegators by name
#[derive(Default)]
pub struct CanvasDelegatorService {
    entries: IndexMap<String, Entry>,
}

impl CanvasDelegatorService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a delegator under its name
    pub fn register(&mut self, delegator: DelegatorRef) -> Result<()> {
        let name = delegator.borrow().name().to_string();
        if self.entries.contains_key(&name) {
            return Err(CanvasError::DuplicateDelegator(name));
        }

        let entry = Entry {
            delegator,
            containers: Vec::new(),
        };
        entry.notify();
        tracing::debug!("registered delegator '{}'", name);
        self.entries.insert(name, entry);
        Ok(())
    }

    /// Forget a delegator and its container list
    pub fn deregister(&mut self, name: &str) -> Option<DelegatorRef> {
        let entry = self.entries.shift_remove(name)?;
        tracing::debug!("deregistered delegator '{}'", name);
        Some(entry.delegator)
    }

    /// Append containers to a delegator's list
    pub fn add_container(
        &mut self,
        name: &str,
        containers: impl IntoIterator<Item = ContainerRef>,
    ) -> Result<()> {
        let entry = self.entry_mut(name)?;
        entry.containers.extend(containers);
        entry.notify();
        Ok(())
    }

    /// Remove one container. Returns false if it wasn't routed to `name`.
    pub fn remove_container(&mut self, name: &str, container: &ContainerRef) -> Result<bool> {
        let entry = self.entry_mut(name)?;
        let Some(index) = entry
            .containers
            .iter()
            .position(|candidate| Rc::ptr_eq(candidate, container))
        else {
            return Ok(false);
        };

        entry.containers.remove(index);
        entry.notify();
        Ok(true)
    }

    pub fn containers(&self, name: &str) -> Option<&[ContainerRef]> {
        self.entries.get(name).map(|entry| entry.containers.as_slice())
    }

    pub fn delegator(&self, name: &str) -> Option<&DelegatorRef> {
        self.entries.get(name).map(|entry| &entry.delegator)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Names in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total containers across every delegator
    pub fn container_count(&self) -> usize {
        self.entries.values().map(|entry| entry.containers.len()).sum()
    }

    pub fn sync_all(&self, update_viewport: bool) {
        for entry in self.entries.values() {
            entry.delegator.borrow_mut().sync_containers(update_viewport);
        }
    }

    pub fn render_all(&self, delta: f32) {
        for entry in self.entries.values() {
            entry.delegator.borrow_mut().render_containers(delta);
        }
    }

    fn entry_mut(&mut self, name: &str) -> Result<&mut Entry> {
        self.entries
            .get_mut(name)
            .ok_or_else(|| CanvasError::DelegatorNotFound(name.to_string()))
    }
}

impl std::fmt::Debug for CanvasDelegatorService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for (name, entry) in &self.entries {
            map.entry(name, &entry.containers.len());
        }
        map.finish()
    }
}
