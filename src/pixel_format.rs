// src/pixel_format.rs

//! The pixel formats the viewer understands and their bit geometry.
//!
//! Every format is a packed, linear RGB(A) or greyscale layout. A packed
//! pixel is an unsigned word of `bytes_per_pixel` bytes, stored least
//! significant byte first; each channel occupies `width` bits starting at
//! bit `shift` of that word.
//!
//! [`classify`] maps the geometry a framebuffer reports onto one of these
//! formats. Once a format is chosen its geometry always comes from the static
//! [`PixelFormatInfo`] table, never from the hardware report.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Truecolor and greyscale pixel layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelFormat {
    /// No registered layout matches.
    Unsupported,
    /// 32-bit, red in the top byte, alpha/pad in the low byte.
    R8G8B8X8,
    /// 32-bit, alpha/pad in the top byte, blue in the low byte.
    X8R8G8B8,
    /// 24-bit packed, blue in the low byte.
    R8G8B8,
    /// 15-bit RGB with the top bit unused.
    X1R5G5B5,
    /// 16-bit RGB with a 6-bit green channel.
    R5G6B5,
    /// 8-bit luminance.
    GREY8,
}

/// Width and position of one channel inside a packed pixel word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Channel {
    pub width: u32,
    pub shift: u32,
}

impl Channel {
    const fn new(width: u32, shift: u32) -> Self {
        Channel { width, shift }
    }

    const NONE: Channel = Channel::new(0, 0);

    /// Mask of `width` low bits.
    pub const fn mask(&self) -> u32 {
        if self.width >= 32 {
            u32::MAX
        } else {
            (1u32 << self.width) - 1
        }
    }

    /// Extracts this channel's raw value from a packed word.
    pub const fn extract(&self, word: u32) -> u32 {
        if self.width == 0 {
            0
        } else {
            (word >> self.shift) & self.mask()
        }
    }

    /// Places a raw value (already `width` bits) at this channel's position.
    pub const fn place(&self, value: u32) -> u32 {
        if self.width == 0 {
            0
        } else {
            (value & self.mask()) << self.shift
        }
    }
}

/// Static geometry of a [`PixelFormat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelFormatInfo {
    pub format: PixelFormat,
    pub bits_per_pixel: u32,
    pub bytes_per_pixel: usize,
    pub red: Channel,
    pub green: Channel,
    pub blue: Channel,
    pub alpha: Channel,
    pub name: &'static str,
}

impl PixelFormatInfo {
    /// True for single-channel luminance layouts.
    pub fn is_greyscale(&self) -> bool {
        self.format == PixelFormat::GREY8
    }

    /// True if the layout reserves bits for alpha (or padding in their place).
    pub fn has_alpha(&self) -> bool {
        self.alpha.width > 0
    }

    fn channels(&self) -> [Channel; 4] {
        [self.red, self.green, self.blue, self.alpha]
    }
}

const UNSUPPORTED_INFO: PixelFormatInfo = PixelFormatInfo {
    format: PixelFormat::Unsupported,
    bits_per_pixel: 0,
    bytes_per_pixel: 0,
    red: Channel::NONE,
    green: Channel::NONE,
    blue: Channel::NONE,
    alpha: Channel::NONE,
    name: "unsupported pixel format",
};

/// All registered layouts, in declaration order of [`PixelFormat`].
pub const PIXEL_FORMATS: [PixelFormatInfo; 7] = [
    UNSUPPORTED_INFO,
    PixelFormatInfo {
        format: PixelFormat::R8G8B8X8,
        bits_per_pixel: 32,
        bytes_per_pixel: 4,
        red: Channel::new(8, 24),
        green: Channel::new(8, 16),
        blue: Channel::new(8, 8),
        alpha: Channel::new(8, 0),
        name: "R8G8B8X8",
    },
    PixelFormatInfo {
        format: PixelFormat::X8R8G8B8,
        bits_per_pixel: 32,
        bytes_per_pixel: 4,
        red: Channel::new(8, 16),
        green: Channel::new(8, 8),
        blue: Channel::new(8, 0),
        alpha: Channel::new(8, 24),
        name: "X8R8G8B8",
    },
    PixelFormatInfo {
        format: PixelFormat::R8G8B8,
        bits_per_pixel: 24,
        bytes_per_pixel: 3,
        red: Channel::new(8, 16),
        green: Channel::new(8, 8),
        blue: Channel::new(8, 0),
        alpha: Channel::NONE,
        name: "R8G8B8",
    },
    PixelFormatInfo {
        format: PixelFormat::X1R5G5B5,
        bits_per_pixel: 16,
        bytes_per_pixel: 2,
        red: Channel::new(5, 10),
        green: Channel::new(5, 5),
        blue: Channel::new(5, 0),
        alpha: Channel::new(1, 15),
        name: "X1R5G5B5",
    },
    PixelFormatInfo {
        format: PixelFormat::R5G6B5,
        bits_per_pixel: 16,
        bytes_per_pixel: 2,
        red: Channel::new(5, 11),
        green: Channel::new(6, 5),
        blue: Channel::new(5, 0),
        alpha: Channel::NONE,
        name: "R5G6B5",
    },
    PixelFormatInfo {
        format: PixelFormat::GREY8,
        bits_per_pixel: 8,
        bytes_per_pixel: 1,
        red: Channel::new(8, 0),
        green: Channel::NONE,
        blue: Channel::NONE,
        alpha: Channel::NONE,
        name: "GREY8",
    },
];

impl PixelFormat {
    /// Static geometry for this format.
    pub fn info(self) -> &'static PixelFormatInfo {
        let index = match self {
            PixelFormat::Unsupported => 0,
            PixelFormat::R8G8B8X8 => 1,
            PixelFormat::X8R8G8B8 => 2,
            PixelFormat::R8G8B8 => 3,
            PixelFormat::X1R5G5B5 => 4,
            PixelFormat::R5G6B5 => 5,
            PixelFormat::GREY8 => 6,
        };
        &PIXEL_FORMATS[index]
    }

    pub fn bytes_per_pixel(self) -> usize {
        self.info().bytes_per_pixel
    }

    pub fn is_supported(self) -> bool {
        self != PixelFormat::Unsupported
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.info().name)
    }
}

/// Offset and length of one channel as reported by the display hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Bitfield {
    pub offset: u32,
    pub length: u32,
}

impl Bitfield {
    pub const fn new(offset: u32, length: u32) -> Self {
        Bitfield { offset, length }
    }
}

/// Channel geometry of a display mode, as reported by the hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChannelLayout {
    pub bits_per_pixel: u32,
    pub red: Bitfield,
    pub green: Bitfield,
    pub blue: Bitfield,
    pub transp: Bitfield,
}

/// Picks the registered format that best matches a reported layout.
///
/// The decision only looks at the bit depth and a few channel fields; the
/// branches are order sensitive:
///
/// * 32 bpp: transparency at bit 24 or above selects [`PixelFormat::R8G8B8X8`],
///   transparency at bit 8 or below selects [`PixelFormat::X8R8G8B8`].
/// * 24 bpp is always [`PixelFormat::R8G8B8`].
/// * 16 bpp without transparency is [`PixelFormat::R5G6B5`] if any color
///   channel is 6 bits wide, otherwise [`PixelFormat::X1R5G5B5`]; a 1-bit
///   transparency channel is also [`PixelFormat::X1R5G5B5`].
/// * 15 bpp is always [`PixelFormat::X1R5G5B5`].
pub fn classify(layout: &ChannelLayout) -> PixelFormat {
    match layout.bits_per_pixel {
        32 => {
            if layout.transp.offset >= 24 {
                PixelFormat::R8G8B8X8
            } else if layout.transp.offset <= 8 {
                PixelFormat::X8R8G8B8
            } else {
                PixelFormat::Unsupported
            }
        }
        24 => PixelFormat::R8G8B8,
        16 => match layout.transp.length {
            0 => {
                let six_bit_channel = [layout.red, layout.green, layout.blue]
                    .iter()
                    .any(|c| c.length == 6);
                if six_bit_channel {
                    PixelFormat::R5G6B5
                } else {
                    PixelFormat::X1R5G5B5
                }
            }
            1 => PixelFormat::X1R5G5B5,
            _ => PixelFormat::Unsupported,
        },
        15 => PixelFormat::X1R5G5B5,
        _ => PixelFormat::Unsupported,
    }
}

/// Checks the table invariants for one entry: channels never overlap, stay
/// inside the pixel, and the byte count encloses the channel bits.
pub fn geometry_is_consistent(info: &PixelFormatInfo) -> bool {
    let mut used: u64 = 0;
    let mut total_width = 0;
    for channel in info.channels() {
        if channel.width == 0 {
            continue;
        }
        if channel.shift + channel.width > info.bits_per_pixel {
            return false;
        }
        let bits = u64::from(channel.mask()) << channel.shift;
        if used & bits != 0 {
            return false;
        }
        used |= bits;
        total_width += channel.width;
    }
    info.bytes_per_pixel == (total_width as usize).div_ceil(8)
        && info.bits_per_pixel as usize <= info.bytes_per_pixel * 8
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn layout(bpp: u32, rgb_len: [u32; 3], transp: Bitfield) -> ChannelLayout {
        ChannelLayout {
            bits_per_pixel: bpp,
            red: Bitfield::new(0, rgb_len[0]),
            green: Bitfield::new(0, rgb_len[1]),
            blue: Bitfield::new(0, rgb_len[2]),
            transp,
        }
    }

    #[test]
    fn classify_covers_every_documented_branch() {
        let cases = [
            // 32 bpp
            (layout(32, [8, 8, 8], Bitfield::new(24, 8)), PixelFormat::R8G8B8X8),
            (layout(32, [8, 8, 8], Bitfield::new(28, 4)), PixelFormat::R8G8B8X8),
            (layout(32, [8, 8, 8], Bitfield::new(0, 8)), PixelFormat::X8R8G8B8),
            (layout(32, [8, 8, 8], Bitfield::new(0, 0)), PixelFormat::X8R8G8B8),
            (layout(32, [8, 8, 8], Bitfield::new(8, 8)), PixelFormat::X8R8G8B8),
            (layout(32, [8, 8, 8], Bitfield::new(16, 8)), PixelFormat::Unsupported),
            (layout(32, [8, 8, 8], Bitfield::new(9, 8)), PixelFormat::Unsupported),
            // 24 bpp
            (layout(24, [8, 8, 8], Bitfield::default()), PixelFormat::R8G8B8),
            (layout(24, [0, 0, 0], Bitfield::new(12, 3)), PixelFormat::R8G8B8),
            // 16 bpp
            (layout(16, [5, 6, 5], Bitfield::new(0, 0)), PixelFormat::R5G6B5),
            (layout(16, [6, 5, 5], Bitfield::new(0, 0)), PixelFormat::R5G6B5),
            (layout(16, [5, 5, 6], Bitfield::new(0, 0)), PixelFormat::R5G6B5),
            (layout(16, [5, 5, 5], Bitfield::new(0, 0)), PixelFormat::X1R5G5B5),
            (layout(16, [5, 5, 5], Bitfield::new(15, 1)), PixelFormat::X1R5G5B5),
            (layout(16, [4, 4, 4], Bitfield::new(12, 4)), PixelFormat::Unsupported),
            // 15 bpp
            (layout(15, [5, 5, 5], Bitfield::default()), PixelFormat::X1R5G5B5),
            // other depths
            (layout(8, [8, 0, 0], Bitfield::default()), PixelFormat::Unsupported),
            (layout(0, [0, 0, 0], Bitfield::default()), PixelFormat::Unsupported),
            (layout(64, [16, 16, 16], Bitfield::new(48, 16)), PixelFormat::Unsupported),
        ];

        for (input, expected) in cases {
            assert_eq!(classify(&input), expected, "layout {:?}", input);
        }
    }

    #[test]
    fn classify_rgb565_from_green_length() {
        let input = ChannelLayout {
            bits_per_pixel: 16,
            red: Bitfield::new(11, 5),
            green: Bitfield::new(5, 6),
            blue: Bitfield::new(0, 5),
            transp: Bitfield::new(0, 0),
        };
        assert_eq!(classify(&input), PixelFormat::R5G6B5);
    }

    #[test]
    fn classify_32bpp_high_transparency_is_alpha_low_variant() {
        let input = layout(32, [8, 8, 8], Bitfield::new(24, 8));
        let format = classify(&input);
        assert_eq!(format, PixelFormat::R8G8B8X8);
        assert_eq!(format.info().alpha.shift, 0);
    }

    #[test]
    fn every_table_entry_is_consistent() {
        for info in PIXEL_FORMATS.iter().skip(1) {
            assert!(geometry_is_consistent(info), "{} is inconsistent", info.name);
        }
    }

    #[test]
    fn info_lookup_matches_variant() {
        for info in PIXEL_FORMATS.iter() {
            assert_eq!(info.format.info().format, info.format);
        }
        assert_eq!(PixelFormat::R5G6B5.to_string(), "R5G6B5");
        assert_eq!(PixelFormat::R8G8B8.bytes_per_pixel(), 3);
        assert!(!PixelFormat::Unsupported.is_supported());
    }

    #[test]
    fn channel_extract_and_place_are_inverse() {
        let green = PixelFormat::R5G6B5.info().green;
        let word = green.place(0b101101);
        assert_eq!(word, 0b101101 << 5);
        assert_eq!(green.extract(word | 0xf81f), 0b101101);
    }
}
