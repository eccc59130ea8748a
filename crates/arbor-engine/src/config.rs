//! Engine Configuration

use arbor_layout::{LayoutConfig, Size};
use serde::Deserialize;

/// Document configuration options
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Screen width, the reference for VW and the root's percentages
    pub screen_width: f32,

    /// Screen height, the reference for VH
    pub screen_height: f32,

    /// Multiplier applied to PX lengths
    pub px_scale: f32,

    /// Width of one CH unit
    pub ch_width: f32,

    /// Line height factor for the fallback text measure
    pub line_height: f32,

    /// Intrinsic width and height of icon/item sprites
    pub sprite_width: f32,
    pub sprite_height: f32,

    /// Measure passes allowed per container before layout gives up
    pub max_measure_passes: u32,

    /// Attach the built-in default stylesheet
    pub default_stylesheet: bool,
}

impl Default for Config {
    fn default() -> Self {
        let layout = LayoutConfig::default();
        Self {
            screen_width: layout.screen.width,
            screen_height: layout.screen.height,
            px_scale: layout.px_scale,
            ch_width: layout.ch_width,
            line_height: layout.line_height,
            sprite_width: layout.sprite_size.width,
            sprite_height: layout.sprite_size.height,
            max_measure_passes: layout.max_passes,
            default_stylesheet: true,
        }
    }
}

impl From<&Config> for LayoutConfig {
    fn from(config: &Config) -> Self {
        LayoutConfig {
            screen: Size::new(config.screen_width, config.screen_height),
            px_scale: config.px_scale,
            ch_width: config.ch_width,
            line_height: config.line_height,
            sprite_size: Size::new(config.sprite_width, config.sprite_height),
            max_passes: config.max_measure_passes.max(1),
        }
    }
}
