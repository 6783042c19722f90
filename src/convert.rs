// src/convert.rs

//! Single-pixel transcoding between registered pixel formats.
//!
//! Conversion is driven entirely by the channel geometry in
//! [`PixelFormatInfo`]: a source pixel is unpacked into per-channel values,
//! each value is resized to the destination width, and the result is packed
//! at the destination shifts.
//!
//! Resizing is a plain shift. Expanding an N-bit channel to M bits shifts it
//! left, leaving the low `M - N` bits zero (the top bits are *not*
//! replicated downward). Reducing shifts right and drops the low bits without
//! rounding.

use crate::error::BlitError;
use crate::pixel_format::{Channel, PixelFormat, PixelFormatInfo};

/// Largest encoded pixel, in bytes.
pub const MAX_BYTES_PER_PIXEL: usize = 4;

/// One pixel already encoded in a specific format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodedPixel {
    format: PixelFormat,
    bytes: [u8; MAX_BYTES_PER_PIXEL],
}

impl EncodedPixel {
    /// Wraps raw bytes already laid out in `format`.
    pub fn from_bytes(format: PixelFormat, raw: &[u8]) -> Result<Self, BlitError> {
        if !format.is_supported() {
            return Err(BlitError::UnsupportedConversion {
                from: format,
                to: format,
            });
        }
        let expected = format.bytes_per_pixel();
        if raw.len() != expected {
            return Err(BlitError::PixelSizeMismatch {
                expected,
                actual: raw.len(),
            });
        }
        let mut bytes = [0u8; MAX_BYTES_PER_PIXEL];
        bytes[..expected].copy_from_slice(raw);
        Ok(EncodedPixel { format, bytes })
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.format.bytes_per_pixel()]
    }

    /// The packed word, least significant byte first.
    pub fn word(&self) -> u32 {
        read_word(self.as_bytes())
    }
}

/// A raw channel value together with its bit width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Sample {
    value: u32,
    width: u32,
}

impl Sample {
    fn resized(self, width: u32) -> u32 {
        resize_channel(self.value, self.width, width)
    }
}

#[derive(Debug, Clone, Copy)]
struct Samples {
    red: Sample,
    green: Sample,
    blue: Sample,
    alpha: Option<Sample>,
}

/// Resizes a channel value from `from` bits to `to` bits by shifting.
pub fn resize_channel(value: u32, from: u32, to: u32) -> u32 {
    if to >= from {
        value << (to - from)
    } else {
        value >> (from - to)
    }
}

fn read_word(bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .rev()
        .fold(0u32, |word, &byte| (word << 8) | u32::from(byte))
}

fn write_word(word: u32, out: &mut [u8]) {
    for (index, byte) in out.iter_mut().enumerate() {
        *byte = (word >> (index * 8)) as u8;
    }
}

fn sample(channel: Channel, word: u32) -> Sample {
    Sample {
        value: channel.extract(word),
        width: channel.width,
    }
}

/// Converts pixels from one registered format to another.
///
/// Any supported format may be a source. Greyscale is accepted as a source
/// only; its luminance is replicated into red, green and blue. Destination
/// alpha is forced fully opaque unless both sides carry an 8-bit alpha
/// channel, in which case it is copied.
#[derive(Debug, Clone, Copy)]
pub struct PixelConverter {
    source: &'static PixelFormatInfo,
    dest: &'static PixelFormatInfo,
    carry_alpha: bool,
}

impl PixelConverter {
    pub fn new(source: PixelFormat, dest: PixelFormat) -> Result<Self, BlitError> {
        let unsupported = BlitError::UnsupportedConversion {
            from: source,
            to: dest,
        };
        if !source.is_supported() || !dest.is_supported() {
            return Err(unsupported);
        }
        let source = source.info();
        let dest = dest.info();
        if dest.is_greyscale() && !source.is_greyscale() {
            return Err(unsupported);
        }
        let carry_alpha = source.alpha.width == 8 && dest.alpha.width == 8;
        Ok(PixelConverter {
            source,
            dest,
            carry_alpha,
        })
    }

    pub fn source_format(&self) -> PixelFormat {
        self.source.format
    }

    pub fn dest_format(&self) -> PixelFormat {
        self.dest.format
    }

    fn decode(&self, word: u32) -> Samples {
        let info = self.source;
        if info.is_greyscale() {
            let luminance = sample(info.red, word);
            return Samples {
                red: luminance,
                green: luminance,
                blue: luminance,
                alpha: None,
            };
        }
        Samples {
            red: sample(info.red, word),
            green: sample(info.green, word),
            blue: sample(info.blue, word),
            alpha: info.has_alpha().then(|| sample(info.alpha, word)),
        }
    }

    fn encode(&self, samples: Samples) -> u32 {
        let info = self.dest;
        if info.is_greyscale() {
            return info.red.place(samples.red.resized(info.red.width));
        }
        let alpha = match samples.alpha {
            Some(alpha) if self.carry_alpha => alpha.resized(info.alpha.width),
            _ => info.alpha.mask(),
        };
        info.red.place(samples.red.resized(info.red.width))
            | info.green.place(samples.green.resized(info.green.width))
            | info.blue.place(samples.blue.resized(info.blue.width))
            | info.alpha.place(alpha)
    }

    /// Converts a packed source word into a packed destination word.
    pub fn convert_word(&self, word: u32) -> u32 {
        self.encode(self.decode(word))
    }

    /// Converts one pixel. Slice lengths must match the bytes per pixel of
    /// the source and destination formats.
    #[inline]
    pub fn convert(&self, source: &[u8], dest: &mut [u8]) {
        debug_assert_eq!(source.len(), self.source.bytes_per_pixel);
        debug_assert_eq!(dest.len(), self.dest.bytes_per_pixel);
        write_word(self.convert_word(read_word(source)), dest);
    }

    /// Converts a tightly packed run of pixels.
    pub fn convert_row(&self, source: &[u8], dest: &mut [u8]) {
        let source_pixels = source.chunks_exact(self.source.bytes_per_pixel);
        let dest_pixels = dest.chunks_exact_mut(self.dest.bytes_per_pixel);
        for (src, dst) in source_pixels.zip(dest_pixels) {
            self.convert(src, dst);
        }
    }
}

/// Encodes one pixel given in `source_format` into `dest_format`.
///
/// This is the helper used to prepare fill colors: conversion happens once
/// and the result is replicated by the fill.
pub fn convert_pixel(
    source: &[u8],
    source_format: PixelFormat,
    dest_format: PixelFormat,
) -> Result<EncodedPixel, BlitError> {
    let expected = source_format.bytes_per_pixel();
    if source.len() != expected {
        return Err(BlitError::PixelSizeMismatch {
            expected,
            actual: source.len(),
        });
    }
    if source_format == dest_format {
        return EncodedPixel::from_bytes(dest_format, source);
    }
    let converter = PixelConverter::new(source_format, dest_format)?;
    let mut out = [0u8; MAX_BYTES_PER_PIXEL];
    let out = &mut out[..dest_format.bytes_per_pixel()];
    converter.convert(source, out);
    EncodedPixel::from_bytes(dest_format, out)
}
