//! What a container draws
//!
//! Each content type builds its scene nodes in `init`, lays them out from the
//! container's bounds in `sync`, and does its per-frame work in `render`. The
//! lifecycle checks around those hooks live in [`Container`](crate::Container).

mod background;
mod cursor;
mod image;
mod text;
mod video;

pub use background::{BackgroundConfig, MainBackground, BACKGROUND_TEXTURE};
pub use cursor::{cursor_velocity, CursorConfig, CursorVelocity, MainCursor};
pub use image::{ImageConfig, RelatedImage};
pub use text::{RelatedText, TextConfig};
pub use video::{RelatedVideo, VideoConfig};

use crate::container::ContainerCore;
use crate::error::Result;
use folio_core::geometry::Size;
use serde::{Deserialize, Serialize};

/// Lifecycle hooks of a content type
pub(crate) trait ContainerHooks {
    /// Default z-index of the container node
    fn z_index(&self) -> i32;

    fn init(&mut self, core: &mut ContainerCore) -> Result<()>;

    fn sync(&mut self, _core: &mut ContainerCore) -> Result<()> {
        Ok(())
    }

    fn render(&mut self, _core: &mut ContainerCore, _delta: f32) -> Result<()> {
        Ok(())
    }

    fn destroy(&mut self, _core: &mut ContainerCore) {}
}

/// How content is scaled into its container's bounds
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stretch {
    #[default]
    None,
    /// Fit inside the bounds, keeping the aspect ratio
    AspectRatio,
    FitWidth,
    FitHeight,
}

impl Stretch {
    /// Scale factor taking `natural` content into `bounds`
    ///
    /// A zero natural dimension contributes a factor of 1.
    pub fn ratio(self, bounds: Size, natural: Size) -> f32 {
        let axis_ratio = |target: f32, natural: f32| {
            if natural > 0.0 {
                target / natural
            } else {
                1.0
            }
        };
        let width_ratio = axis_ratio(bounds.width, natural.width);
        let height_ratio = axis_ratio(bounds.height, natural.height);

        match self {
            Stretch::None => 1.0,
            Stretch::AspectRatio => width_ratio.min(height_ratio),
            Stretch::FitWidth => width_ratio,
            Stretch::FitHeight => height_ratio,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stretch_ratios() {
        let bounds = Size::new(400.0, 300.0);
        let natural = Size::new(800.0, 400.0);
        assert_eq!(Stretch::None.ratio(bounds, natural), 1.0);
        assert_eq!(Stretch::AspectRatio.ratio(bounds, natural), 0.5);
        assert_eq!(Stretch::FitWidth.ratio(bounds, natural), 0.5);
        assert_eq!(Stretch::FitHeight.ratio(bounds, natural), 0.75);
    }

    #[test]
    fn test_stretch_zero_natural_size() {
        let bounds = Size::new(400.0, 300.0);
        assert_eq!(Stretch::FitWidth.ratio(bounds, Size::ZERO), 1.0);
        assert_eq!(Stretch::AspectRatio.ratio(bounds, Size::new(0.0, 150.0)), 1.0);
    }
}
