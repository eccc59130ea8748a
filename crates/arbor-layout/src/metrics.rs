//! Text measurement

use crate::{LayoutConfig, Size};

/// Font-size reference: a font of this size measures one character cell
const BASE_FONT_SIZE: f32 = 10.0;

/// Measures a run of text at a font size
pub trait TextMetrics {
    fn measure(&self, text: &str, font_size: f32) -> Size;
}

impl<F> TextMetrics for F
where
    F: Fn(&str, f32) -> Size,
{
    fn measure(&self, text: &str, font_size: f32) -> Size {
        self(text, font_size)
    }
}

/// Fixed-cell measure used when no font is available.
///
/// At a 10 unit font each character is one `ch_width` cell; width scales
/// linearly with the font. Each line is `line_height * font_size` tall.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeuristicMetrics {
    pub ch_width: f32,
    pub line_height: f32,
}

impl HeuristicMetrics {
    pub fn new(config: &LayoutConfig) -> Self {
        Self { ch_width: config.ch_width, line_height: config.line_height }
    }
}

impl Default for HeuristicMetrics {
    fn default() -> Self {
        Self::new(&LayoutConfig::default())
    }
}

impl TextMetrics for HeuristicMetrics {
    fn measure(&self, text: &str, font_size: f32) -> Size {
        if text.is_empty() {
            return Size::ZERO;
        }
        let scale = font_size / BASE_FONT_SIZE;
        let (lines, widest) = text
            .split('\n')
            .fold((0usize, 0usize), |(n, w), line| (n + 1, w.max(line.chars().count())));

        Size::new(
            widest as f32 * self.ch_width * scale,
            lines as f32 * self.line_height * font_size,
        )
        .guarded()
    }
}
