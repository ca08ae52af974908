//! Retained scene graph
//!
//! Nodes and filters live in slot maps keyed by [`NodeId`] and [`FilterId`].
//! The graph always has a root container; everything reachable from it is
//! "attached" and part of the output.

use crate::error::{Result, SceneError};
use crate::filter::{Filter, FilterKind};
use crate::node::{Content, FilterId, Node, NodeId};
use folio_animation::PropertyTarget;
use folio_core::geometry::{Point, Rect};
use serde::Serialize;
use slotmap::SlotMap;

// ─────────────────────────────────────────────────────────────────────────────
// Animatable properties
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeProperty {
    X,
    Y,
    ScaleX,
    ScaleY,
    Rotation,
    Alpha,
    Width,
    Height,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FilterProperty {
    /// X of the filter's vector parameter (scale, velocity or offset)
    X,
    Y,
    Seed,
}

/// A numeric property tweens can drive
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Property {
    Node(NodeId, NodeProperty),
    Filter(FilterId, FilterProperty),
}

impl Property {
    pub fn node(id: NodeId, property: NodeProperty) -> Self {
        Property::Node(id, property)
    }

    pub fn filter(id: FilterId, property: FilterProperty) -> Self {
        Property::Filter(id, property)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Scene Graph
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct SceneGraph {
    nodes: SlotMap<NodeId, Node>,
    filters: SlotMap<FilterId, Filter>,
    root: NodeId,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let mut root = Node::new(Content::Container);
        root.name = Some("root".to_string());
        let root = nodes.insert(root);
        Self {
            nodes,
            filters: SlotMap::with_key(),
            root,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Create a detached node
    pub fn create(&mut self, content: Content) -> NodeId {
        self.nodes.insert(Node::new(content))
    }

    pub fn create_named(&mut self, name: impl Into<String>, content: Content) -> NodeId {
        let mut node = Node::new(content);
        node.name = Some(name.into());
        self.nodes.insert(node)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub fn get(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(id).ok_or(SceneError::NodeNotFound(id))
    }

    pub fn get_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes.get_mut(id).ok_or(SceneError::NodeNotFound(id))
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id).map_or(&[], |node| node.children.as_slice())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|node| node.parent)
    }

    /// True if `id` is `ancestor` or lies below it
    pub fn is_descendant_of(&self, id: NodeId, ancestor: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// True if the node is reachable from the root
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.contains(id) && self.is_descendant_of(id, self.root)
    }

    /// Append `child` to `parent`, detaching it from its previous parent
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        let index = self.children(parent).len();
        self.add_child_at(parent, child, index)
    }

    /// Insert `child` into `parent` at `index` (clamped to the child count)
    pub fn add_child_at(&mut self, parent: NodeId, child: NodeId, index: usize) -> Result<()> {
        self.get(parent)?;
        self.get(child)?;
        if child == self.root {
            return Err(SceneError::RootOperation("re-parented"));
        }
        if self.is_descendant_of(parent, child) {
            return Err(SceneError::Cycle { parent, child });
        }

        self.detach(child);
        let parent_node = self.get_mut(parent)?;
        let index = index.min(parent_node.children.len());
        parent_node.children.insert(index, child);
        self.get_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Remove `child` from its parent. The node stays alive, detached.
    pub fn detach(&mut self, child: NodeId) -> bool {
        let Some(parent) = self.parent(child) else {
            return false;
        };
        if let Some(parent_node) = self.nodes.get_mut(parent) {
            parent_node.children.retain(|id| *id != child);
        }
        if let Some(node) = self.nodes.get_mut(child) {
            node.parent = None;
        }
        true
    }

    /// Detach and return every child of `id`, in order
    pub fn take_children(&mut self, id: NodeId) -> Vec<NodeId> {
        let children = match self.nodes.get_mut(id) {
            Some(node) => std::mem::take(&mut node.children),
            None => return Vec::new(),
        };
        for child in &children {
            if let Some(node) = self.nodes.get_mut(*child) {
                node.parent = None;
            }
        }
        children
    }

    /// Remove a node, its subtree and their filters
    pub fn destroy(&mut self, id: NodeId) -> Result<()> {
        if id == self.root {
            return Err(SceneError::RootOperation("destroyed"));
        }
        self.get(id)?;
        self.detach(id);

        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.remove(current) {
                stack.extend(node.children);
                for filter in node.filters {
                    self.filters.remove(filter);
                }
            }
        }
        Ok(())
    }

    /// Stable-sort the children of `parent` by z-index
    pub fn sort_children(&mut self, parent: NodeId) {
        let Some(node) = self.nodes.get(parent) else {
            return;
        };
        let mut children = node.children.clone();
        children.sort_by_key(|child| self.nodes.get(*child).map_or(0, |node| node.z_index));
        if let Some(node) = self.nodes.get_mut(parent) {
            node.children = children;
        }
    }

    // =========================================================================
    // Filters
    // =========================================================================

    /// Attach a filter in front of the node's existing filters
    pub fn add_filter(&mut self, node: NodeId, filter: Filter) -> Result<FilterId> {
        self.get(node)?;
        let id = self.filters.insert(filter);
        self.get_mut(node)?.filters.insert(0, id);
        Ok(id)
    }

    /// Detach and drop a filter. Returns false if it wasn't on the node.
    pub fn remove_filter(&mut self, node: NodeId, filter: FilterId) -> bool {
        let Some(target) = self.nodes.get_mut(node) else {
            return false;
        };
        let before = target.filters.len();
        target.filters.retain(|id| *id != filter);
        let removed = target.filters.len() != before;
        if removed {
            self.filters.remove(filter);
        }
        removed
    }

    pub fn filter(&self, id: FilterId) -> Option<&Filter> {
        self.filters.get(id)
    }

    pub fn filter_mut(&mut self, id: FilterId) -> Option<&mut Filter> {
        self.filters.get_mut(id)
    }

    pub fn filters_of(&self, node: NodeId) -> &[FilterId] {
        self.nodes.get(node).map_or(&[], |node| node.filters.as_slice())
    }

    // =========================================================================
    // Geometry
    // =========================================================================

    /// Sum of positions from the root down to `id`
    ///
    /// Scale and rotation of ancestors are not applied.
    pub fn world_position(&self, id: NodeId) -> Point {
        let mut position = Point::ZERO;
        let mut current = Some(id);
        while let Some(node_id) = current {
            let Some(node) = self.nodes.get(node_id) else {
                break;
            };
            position = position + node.transform.position;
            current = node.parent;
        }
        position
    }

    /// Axis-aligned bounds of a node and its subtree in its parent's space
    pub fn bounds(&self, id: NodeId) -> Option<Rect> {
        let node = self.nodes.get(id)?;
        let origin = node.transform.position;
        let mut bounds = node.content_rect();

        for child in &node.children {
            if let Some(child_bounds) = self.bounds(*child) {
                let child_bounds = child_bounds.translate(origin.x, origin.y);
                bounds = Some(match bounds {
                    Some(current) => union(current, child_bounds),
                    None => child_bounds,
                });
            }
        }
        bounds
    }

    // =========================================================================
    // Traversal
    // =========================================================================

    /// Visit every attached node depth-first
    pub fn traverse<F: FnMut(NodeId, &Node, usize)>(&self, mut f: F) {
        fn visit<F: FnMut(NodeId, &Node, usize)>(
            graph: &SceneGraph,
            id: NodeId,
            depth: usize,
            f: &mut F,
        ) {
            if let Some(node) = graph.nodes.get(id) {
                f(id, node, depth);
                for child in &node.children {
                    visit(graph, *child, depth + 1, f);
                }
            }
        }

        visit(self, self.root, 0, &mut f);
    }

    /// Total nodes, attached or not
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn filter_count(&self) -> usize {
        self.filters.len()
    }

    pub fn visible_node_count(&self) -> usize {
        let mut count = 0;
        self.traverse(|_, node, _| {
            if node.visible {
                count += 1;
            }
        });
        count
    }

    /// Serializable tree of the attached scene
    pub fn snapshot(&self) -> NodeSnapshot {
        self.snapshot_node(self.root)
    }

    fn snapshot_node(&self, id: NodeId) -> NodeSnapshot {
        let node = &self.nodes[id];
        NodeSnapshot {
            name: node.name.clone(),
            x: node.transform.position.x,
            y: node.transform.position.y,
            scale: node.transform.scale,
            rotation: node.transform.rotation,
            alpha: node.alpha,
            visible: node.visible,
            z_index: node.z_index,
            content: node.content.clone(),
            filters: node
                .filters
                .iter()
                .filter_map(|filter| self.filters.get(*filter).cloned())
                .collect(),
            children: node
                .children
                .iter()
                .filter(|child| self.nodes.contains_key(**child))
                .map(|child| self.snapshot_node(*child))
                .collect(),
        }
    }
}

fn union(a: Rect, b: Rect) -> Rect {
    let x = a.x.min(b.x);
    let y = a.y.min(b.y);
    Rect::new(x, y, a.right().max(b.right()) - x, a.bottom().max(b.bottom()) - y)
}

/// Serializable view of a node and its subtree
#[derive(Clone, Debug, Serialize)]
pub struct NodeSnapshot {
    pub name: Option<String>,
    pub x: f32,
    pub y: f32,
    pub scale: Point,
    pub rotation: f32,
    pub alpha: f32,
    pub visible: bool,
    pub z_index: i32,
    pub content: Content,
    pub filters: Vec<Filter>,
    pub children: Vec<NodeSnapshot>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tween target
// ─────────────────────────────────────────────────────────────────────────────

impl PropertyTarget for SceneGraph {
    type Key = Property;

    fn read(&self, key: Property) -> Option<f32> {
        match key {
            Property::Node(id, property) => {
                let node = self.nodes.get(id)?;
                let transform = &node.transform;
                match property {
                    NodeProperty::X => Some(transform.position.x),
                    NodeProperty::Y => Some(transform.position.y),
                    NodeProperty::ScaleX => Some(transform.scale.x),
                    NodeProperty::ScaleY => Some(transform.scale.y),
                    NodeProperty::Rotation => Some(transform.rotation),
                    NodeProperty::Alpha => Some(node.alpha),
                    NodeProperty::Width => node.content.size().map(|size| size.width),
                    NodeProperty::Height => node.content.size().map(|size| size.height),
                }
            }
            Property::Filter(id, property) => {
                let filter = self.filters.get(id)?;
                match (property, &filter.kind) {
                    (FilterProperty::Seed, FilterKind::Noise { seed, .. }) => Some(*seed),
                    (FilterProperty::X, _) => filter.vector().map(|v| v.x),
                    (FilterProperty::Y, _) => filter.vector().map(|v| v.y),
                    (FilterProperty::Seed, _) => None,
                }
            }
        }
    }

    fn write(&mut self, key: Property, value: f32) -> bool {
        match key {
            Property::Node(id, property) => {
                let Some(node) = self.nodes.get_mut(id) else {
                    return false;
                };
                let transform = &mut node.transform;
                match property {
                    NodeProperty::X => transform.position.x = value,
                    NodeProperty::Y => transform.position.y = value,
                    NodeProperty::ScaleX => transform.scale.x = value,
                    NodeProperty::ScaleY => transform.scale.y = value,
                    NodeProperty::Rotation => transform.rotation = value,
                    NodeProperty::Alpha => node.alpha = value,
                    NodeProperty::Width => return node.content.set_size(Some(value), None),
                    NodeProperty::Height => return node.content.set_size(None, Some(value)),
                }
                true
            }
            Property::Filter(id, property) => {
                let Some(filter) = self.filters.get_mut(id) else {
                    return false;
                };
                if let (FilterProperty::Seed, FilterKind::Noise { seed, .. }) =
                    (property, &mut filter.kind)
                {
                    *seed = value;
                    return true;
                }
                match (property, filter.vector_mut()) {
                    (FilterProperty::X, Some(vector)) => vector.x = value,
                    (FilterProperty::Y, Some(vector)) => vector.y = value,
                    _ => return false,
                }
                true
            }
        }
    }
}
