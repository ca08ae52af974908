//! Error types for folio_canvas

use crate::extras::ExtraKind;
use folio_core::CoreError;
use folio_layout::LayoutError;
use folio_scene::SceneError;
use thiserror::Error;

/// Errors raised by containers, extras and delegators
#[derive(Error, Debug)]
pub enum CanvasError {
    /// A lifecycle hook ran before `init()` finished
    #[error("Container is not ready for {0}")]
    NotReady(&'static str),

    /// `bind()` was called on a container that already has a node
    #[error("Container node is already bound")]
    AlreadyBound,

    #[error("Delegator with name '{0}' already exists")]
    DuplicateDelegator(String),

    #[error("No delegator named '{0}'")]
    DelegatorNotFound(String),

    /// The registry resolved a waiter with a different kind of extra
    #[error("Registered extra is not a '{0}' extra")]
    ExtraMismatch(ExtraKind),

    #[error(transparent)]
    Scene(#[from] SceneError),

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Result type for canvas operations
pub type Result<T> = std::result::Result<T, CanvasError>;
