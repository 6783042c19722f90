// src/color.rs

//! Colors used for filling the screen behind an image.

use crate::pixel_format::PixelFormat;
use serde::{Deserialize, Serialize};

/// The eight basic ANSI colors plus their bright variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamedColor {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
    BrightBlack,
    BrightRed,
    BrightGreen,
    BrightYellow,
    BrightBlue,
    BrightMagenta,
    BrightCyan,
    BrightWhite,
}

impl NamedColor {
    /// The usual sRGB values terminals use for these names.
    pub fn to_rgb(self) -> (u8, u8, u8) {
        match self {
            NamedColor::Black => (0, 0, 0),
            NamedColor::Red => (205, 0, 0),
            NamedColor::Green => (0, 205, 0),
            NamedColor::Yellow => (205, 205, 0),
            NamedColor::Blue => (0, 0, 238),
            NamedColor::Magenta => (205, 0, 205),
            NamedColor::Cyan => (0, 205, 205),
            NamedColor::White => (229, 229, 229),
            NamedColor::BrightBlack => (127, 127, 127),
            NamedColor::BrightRed => (255, 0, 0),
            NamedColor::BrightGreen => (0, 255, 0),
            NamedColor::BrightYellow => (255, 255, 0),
            NamedColor::BrightBlue => (92, 92, 255),
            NamedColor::BrightMagenta => (255, 0, 255),
            NamedColor::BrightCyan => (0, 255, 255),
            NamedColor::BrightWhite => (255, 255, 255),
        }
    }
}

/// A fill color, either by name, as RGB components, or as a grey level.
///
/// In JSON: `{"named": "blue"}`, `{"rgb": [16, 32, 48]}` or `{"grey": 128}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    Named(NamedColor),
    Rgb(u8, u8, u8),
    Grey(u8),
}

impl Default for Color {
    fn default() -> Self {
        Color::Named(NamedColor::Black)
    }
}

impl Color {
    pub fn to_rgb(self) -> (u8, u8, u8) {
        match self {
            Color::Named(named) => named.to_rgb(),
            Color::Rgb(r, g, b) => (r, g, b),
            Color::Grey(level) => (level, level, level),
        }
    }

    /// The color as one pixel in a registered source format, ready for
    /// conversion into the framebuffer format.
    pub fn to_source_pixel(self) -> (PixelFormat, Vec<u8>) {
        match self {
            Color::Grey(level) => (PixelFormat::GREY8, vec![level]),
            other => {
                let (r, g, b) = other.to_rgb();
                // R8G8B8 packs blue into the low byte.
                (PixelFormat::R8G8B8, vec![b, g, r])
            }
        }
    }
}
