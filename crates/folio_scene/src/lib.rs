//! Folio Scene
//!
//! The retained 2D scene graph containers draw into.
//!
//! # Features
//!
//! - **Scene graph**: slot-map backed nodes with parent/child links, z-order and bounds
//! - **Content**: containers, sprites, tiling sprites, text and video
//! - **Filters**: displacement, motion blur, twist and noise parameters per node
//! - **Tween target**: [`SceneGraph`] implements [`folio_animation::PropertyTarget`]
//! - **Resources**: JSON manifest, pluggable loaders and a name-keyed provider
//! - **Text measurement**: trait seam with an estimating fallback
//!
//! The graph is the output surface: rasterisation happens elsewhere.

pub mod error;
pub mod filter;
pub mod graph;
pub mod node;
pub mod resource;
pub mod text;

pub use error::{Result, SceneError};
pub use filter::{Filter, FilterKind};
pub use graph::{FilterProperty, NodeProperty, NodeSnapshot, Property, SceneGraph};
pub use node::{
    Content, FilterId, Node, NodeId, Sprite, Text, TextStyle, Texture, TilingSprite, Transform,
    Video, WrapMode,
};
pub use resource::{
    FsResourceLoader, Manifest, MemoryResourceLoader, Resource, ResourceEntry, ResourceKind,
    ResourceLoader, ResourceProvider,
};
pub use text::{EstimatedTextMeasurer, TextMeasurer, TextMetrics};

/// Scheduler type driving scene properties
pub type SceneTweens = folio_animation::TweenScheduler<Property>;
/// Handle type extras and containers use to start scene tweens
pub type SceneTweenHandle = folio_animation::SchedulerHandle<Property>;
