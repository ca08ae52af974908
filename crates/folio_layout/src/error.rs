//! Layout error types

use crate::element::ElementId;
use thiserror::Error;

/// Errors raised by host element operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("Element {0:?} does not exist")]
    ElementNotFound(ElementId),

    /// Size detection needs a child to measure
    #[error("Element {0:?} needs at least one child")]
    NoChild(ElementId),

    #[error("Can't attach element {child:?} under {parent:?}: would create a cycle")]
    Cycle { parent: ElementId, child: ElementId },
}

/// Result type for layout operations
pub type Result<T> = std::result::Result<T, LayoutError>;
