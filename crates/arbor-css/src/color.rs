//! Colors
//!
//! 8-bit RGBA with HSL helpers used by `hsl()`, `lighten()` and `darken()`.
//! Hex and named color literals are resolved through lightningcss.

use std::fmt;

use lightningcss::traits::Parse;
use lightningcss::values::color::CssColor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#rgb`, `#rrggbb`, `#rrggbbaa` or a named color
    pub fn parse_literal(text: &str) -> Option<Color> {
        match CssColor::parse_string(text).ok()? {
            CssColor::RGBA(rgba) => Some(Color::rgba(
                rgba.red,
                rgba.green,
                rgba.blue,
                rgba.alpha,
            )),
            _ => None,
        }
    }

    /// Build from hue in degrees and saturation/lightness/alpha in `0..=1`
    pub fn from_hsla(hue: f32, saturation: f32, lightness: f32, alpha: f32) -> Self {
        let h = hue.rem_euclid(360.0) / 60.0;
        let s = saturation.clamp(0.0, 1.0);
        let l = lightness.clamp(0.0, 1.0);

        let chroma = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let x = chroma * (1.0 - (h % 2.0 - 1.0).abs());
        let (r, g, b) = match h as u32 {
            0 => (chroma, x, 0.0),
            1 => (x, chroma, 0.0),
            2 => (0.0, chroma, x),
            3 => (0.0, x, chroma),
            4 => (x, 0.0, chroma),
            _ => (chroma, 0.0, x),
        };
        let m = l - chroma / 2.0;
        Color::rgba(channel(r + m), channel(g + m), channel(b + m), channel(alpha))
    }

    /// Hue in degrees, saturation and lightness in `0..=1`
    pub fn to_hsl(self) -> (f32, f32, f32) {
        let r = self.r as f32 / 255.0;
        let g = self.g as f32 / 255.0;
        let b = self.b as f32 / 255.0;
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let l = (max + min) / 2.0;
        let d = max - min;
        if d == 0.0 {
            return (0.0, 0.0, l);
        }

        let s = d / (1.0 - (2.0 * l - 1.0).abs());
        let h = if max == r {
            60.0 * ((g - b) / d).rem_euclid(6.0)
        } else if max == g {
            60.0 * ((b - r) / d + 2.0)
        } else {
            60.0 * ((r - g) / d + 4.0)
        };
        (h, s, l)
    }

    /// Raise lightness by `amount` (0..=1)
    pub fn lighten(self, amount: f32) -> Color {
        let (h, s, l) = self.to_hsl();
        Color::from_hsla(h, s, l + amount, self.a as f32 / 255.0)
    }

    /// Lower lightness by `amount` (0..=1)
    pub fn darken(self, amount: f32) -> Color {
        self.lighten(-amount)
    }

    #[inline]
    pub fn is_opaque(self) -> bool {
        self.a == 255
    }
}

fn channel(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)?;
        if !self.is_opaque() {
            write!(f, "{:02x}", self.a)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_named_and_hex() {
        assert_eq!(Color::parse_literal("red"), Some(Color::rgb(255, 0, 0)));
        assert_eq!(Color::parse_literal("#00ff00"), Some(Color::rgb(0, 255, 0)));
        assert_eq!(Color::parse_literal("#fff"), Some(Color::WHITE));
        assert_eq!(Color::parse_literal("transparent"), Some(Color::TRANSPARENT));
        assert_eq!(Color::parse_literal("flex"), None);
    }

    #[test]
    fn test_parse_hex_alpha_channel() {
        assert_eq!(Color::parse_literal("#ff000080"), Some(Color::rgba(255, 0, 0, 128)));
        assert_eq!(Color::parse_literal("#0000"), Some(Color::rgba(0, 0, 0, 0)));
        assert_eq!(Color::parse_literal("#123456ff").map(|c| c.a), Some(255));
    }

    #[test]
    fn test_hsl_primaries() {
        assert_eq!(Color::from_hsla(0.0, 1.0, 0.5, 1.0), Color::rgb(255, 0, 0));
        assert_eq!(Color::from_hsla(120.0, 1.0, 0.5, 1.0), Color::rgb(0, 255, 0));
        assert_eq!(Color::from_hsla(240.0, 1.0, 0.5, 1.0), Color::rgb(0, 0, 255));
        assert_eq!(Color::from_hsla(480.0, 1.0, 0.5, 1.0), Color::rgb(0, 255, 0));
    }

    #[test]
    fn test_lighten_darken() {
        let grey = Color::rgb(128, 128, 128);
        assert!(grey.lighten(0.25).r > grey.r);
        assert!(grey.darken(0.25).r < grey.r);
        assert_eq!(Color::BLACK.lighten(1.0), Color::WHITE);
        assert_eq!(Color::WHITE.darken(2.0), Color::BLACK);
    }

    #[test]
    fn test_display_hex() {
        assert_eq!(Color::rgb(255, 0, 16).to_string(), "#ff0010");
        assert_eq!(Color::rgba(0, 0, 0, 128).to_string(), "#00000080");
    }
}
