//! Layout configuration

use crate::Size;

/// Constants the layout pass resolves units and content against
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutConfig {
    /// Reference size for VW/VH and for the root's percentages
    pub screen: Size,
    /// Multiplier applied to PX lengths
    pub px_scale: f32,
    /// Nominal character cell width for CH lengths and heuristic text
    pub ch_width: f32,
    /// Line height as a factor of the font size
    pub line_height: f32,
    /// Intrinsic size of icon and item sprites
    pub sprite_size: Size,
    /// Upper bound on measure passes per container
    pub max_passes: u32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            screen: Size::new(1280.0, 720.0),
            px_scale: 1.0,
            ch_width: 5.0,
            line_height: 1.2,
            sprite_size: Size::new(16.0, 16.0),
            max_passes: 32,
        }
    }
}
