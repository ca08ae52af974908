//! Folio App
//!
//! The application layer around the compositor:
//!
//! - [`FolioConfig`]: `folio.toml`, converted into each crate's runtime config
//! - [`logging`]: `tracing-subscriber` setup
//! - [`PreloaderService`] and [`NavigationService`]: page-level services
//! - [`Simulation`]: a headless demo page driven by scripted input

pub mod config;
pub mod logging;
pub mod navigation;
pub mod preloader;
pub mod simulate;

pub use config::FolioConfig;
pub use navigation::{NavigationService, SectionScroller};
pub use preloader::PreloaderService;
pub use simulate::{Simulation, SimulationReport, Step};
