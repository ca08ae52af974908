//! Logging setup

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// `RUST_LOG` if set and valid, otherwise `fallback`, otherwise `info`
pub fn env_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber. Later calls are ignored.
pub fn init(fallback: &str, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        env_filter(fallback)
    };

    let installed = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();
    if installed.is_err() {
        tracing::debug!("subscriber already installed");
    }
}
