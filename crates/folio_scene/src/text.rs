//! Text measurement
//!
//! Text nodes need their natural size before layout can scale them. Font
//! rasterisation lives outside the compositor, so measurement goes through the
//! [`TextMeasurer`] trait with an estimating fallback.

use crate::node::TextStyle;
use folio_core::geometry::Size;

/// Text measurement result
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TextMetrics {
    pub width: f32,
    /// Height accounting for line height and number of lines
    pub height: f32,
    pub line_count: u32,
}

impl TextMetrics {
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// Measures text dimensions for a style
pub trait TextMeasurer {
    fn measure(&self, text: &str, style: &TextStyle) -> TextMetrics;
}

/// Estimates text size from character counts
///
/// Uses ~0.55em per character, which is conservative for proportional fonts.
#[derive(Debug, Clone, Copy, Default)]
pub struct EstimatedTextMeasurer;

impl TextMeasurer for EstimatedTextMeasurer {
    fn measure(&self, text: &str, style: &TextStyle) -> TextMetrics {
        let mut width: f32 = 0.0;
        let mut line_count = 0u32;

        for line in text.lines() {
            let chars = line.chars().count() as f32;
            let spacing = if chars > 1.0 {
                (chars - 1.0) * style.letter_spacing
            } else {
                0.0
            };
            width = width.max(chars * style.font_size * 0.55 + spacing);
            line_count += 1;
        }

        let line_count = line_count.max(1);
        TextMetrics {
            width,
            height: style.font_size * style.line_height * line_count as f32,
            line_count,
        }
    }
}
