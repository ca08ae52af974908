//! Folio configuration file handling
//!
//! Everything lives in one `folio.toml`. Every field has a default, so an
//! empty file (or no file at all) yields a working configuration. Durations are
//! written as milliseconds and converted into the typed runtime configs of each
//! crate.

use anyhow::{Context, Result};
use folio_animation::Easing;
use folio_canvas::{CompositorConfig, CursorConfig};
use folio_core::geometry::Size;
use folio_layout::{InputMultipliers, ScrollerConfig, SnapConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File looked up by [`FolioConfig::load_from_dir`]
pub const CONFIG_FILE: &str = "folio.toml";

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct FolioConfig {
    /// `tracing` filter used when `RUST_LOG` is unset
    pub log_filter: String,
    pub viewport: ViewportConfig,
    pub scroller: ScrollerSettings,
    pub cursor: CursorSettings,
    pub resources: ResourcesConfig,
    pub surface: SurfaceConfig,
}

// =============================================================================
// Sections
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub width: f32,
    pub height: f32,
    /// Resize coalescing window
    pub audit_ms: u64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 800.0,
            audit_ms: 100,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScrollerSettings {
    pub wheel: f32,
    pub touch: f32,
    pub drag: f32,
    pub keyboard: f32,
    pub output_duration_ms: u64,
    pub output_easing: Easing,
    pub snap: SnapSettings,
}

impl Default for ScrollerSettings {
    fn default() -> Self {
        let defaults = ScrollerConfig::default();
        Self {
            wheel: defaults.multipliers.wheel,
            touch: defaults.multipliers.touch,
            drag: defaults.multipliers.drag,
            keyboard: defaults.multipliers.keyboard,
            output_duration_ms: millis(defaults.output_duration),
            output_easing: defaults.output_easing,
            snap: SnapSettings::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SnapSettings {
    pub enabled: bool,
    pub delay_ms: u64,
    pub duration_ms: u64,
    pub easing: Easing,
    pub threshold: f32,
}

impl Default for SnapSettings {
    fn default() -> Self {
        let defaults = SnapConfig::default();
        Self {
            enabled: defaults.enabled,
            delay_ms: millis(defaults.delay),
            duration_ms: millis(defaults.duration),
            easing: defaults.easing,
            threshold: defaults.threshold,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CursorSettings {
    pub size: f32,
    pub inner_size: f32,
    pub scale: f32,
    pub velocity_frequency_ms: u64,
    pub state_debounce_ms: u64,
}

impl Default for CursorSettings {
    fn default() -> Self {
        let defaults = CursorConfig::default();
        Self {
            size: defaults.size,
            inner_size: defaults.inner_size,
            scale: defaults.scale,
            velocity_frequency_ms: millis(defaults.velocity_frequency),
            state_debounce_ms: millis(defaults.state_debounce),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ResourcesConfig {
    /// `resources.json`, relative to the config file's directory
    pub manifest: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SurfaceConfig {
    /// Whether a drawing surface exists; filters are skipped without one
    pub available: bool,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self { available: true }
    }
}

fn millis(duration: Duration) -> u64 {
    duration.as_millis() as u64
}

// =============================================================================
// Loading and conversion
// =============================================================================

impl FolioConfig {
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse folio configuration")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let mut config: FolioConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        if let (Some(manifest), Some(dir)) = (&config.resources.manifest, path.parent()) {
            if manifest.is_relative() {
                config.resources.manifest = Some(dir.join(manifest));
            }
        }
        Ok(config)
    }

    /// Load `folio.toml` from `dir`, or the defaults if there is none
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        if path.exists() {
            Self::load(&path)
        } else {
            tracing::debug!("no {} in {}, using defaults", CONFIG_FILE, dir.display());
            Ok(Self::default())
        }
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize folio configuration")
    }

    pub fn log_filter(&self) -> &str {
        if self.log_filter.is_empty() {
            "info"
        } else {
            &self.log_filter
        }
    }

    pub fn viewport_size(&self) -> Size {
        Size::new(self.viewport.width, self.viewport.height)
    }

    pub fn scroller_config(&self) -> ScrollerConfig {
        let scroller = &self.scroller;
        ScrollerConfig {
            multipliers: InputMultipliers {
                wheel: scroller.wheel,
                touch: scroller.touch,
                drag: scroller.drag,
                keyboard: scroller.keyboard,
            },
            output_duration: Duration::from_millis(scroller.output_duration_ms),
            output_easing: scroller.output_easing,
            snap: SnapConfig {
                enabled: scroller.snap.enabled,
                delay: Duration::from_millis(scroller.snap.delay_ms),
                duration: Duration::from_millis(scroller.snap.duration_ms),
                easing: scroller.snap.easing,
                threshold: scroller.snap.threshold,
            },
        }
    }

    pub fn cursor_config(&self) -> CursorConfig {
        CursorConfig {
            size: self.cursor.size,
            inner_size: self.cursor.inner_size,
            scale: self.cursor.scale,
            velocity_frequency: Duration::from_millis(self.cursor.velocity_frequency_ms),
            state_debounce: Duration::from_millis(self.cursor.state_debounce_ms),
        }
    }

    pub fn compositor_config(&self) -> CompositorConfig {
        CompositorConfig {
            viewport_audit: Duration::from_millis(self.viewport.audit_ms),
            ..Default::default()
        }
    }
}
