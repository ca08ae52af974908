//! Scene error types

use crate::node::{FilterId, NodeId};
use thiserror::Error;

/// Errors raised by scene graph and resource operations
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("Node {0:?} does not exist")]
    NodeNotFound(NodeId),

    #[error("Filter {0:?} does not exist")]
    FilterNotFound(FilterId),

    /// Attaching would make a node its own ancestor
    #[error("Can't attach node {child:?} under {parent:?}: would create a cycle")]
    Cycle { parent: NodeId, child: NodeId },

    #[error("The root node can't be {0}")]
    RootOperation(&'static str),

    #[error("Resource '{0}' is not loaded")]
    ResourceNotFound(String),

    #[error("Failed to load resource '{name}' from {path}: {reason}")]
    ResourceLoad {
        name: String,
        path: String,
        reason: String,
    },

    #[error("Invalid resource manifest: {0}")]
    Manifest(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for scene operations
pub type Result<T> = std::result::Result<T, SceneError>;
