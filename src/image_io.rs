// src/image_io.rs

//! Decoding image files into framebuffer-ready pixels.
//!
//! Images come out as tightly packed [`PixelFormat::X8R8G8B8`] rows, which
//! the blit engine converts to whatever the display uses.

use crate::error::ImageError;
use crate::pixel_format::PixelFormat;
use image::imageops::FilterType;
use log::{debug, info};
use std::path::Path;

/// A decoded image in [`PixelFormat::X8R8G8B8`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl LoadedImage {
    pub const FORMAT: PixelFormat = PixelFormat::X8R8G8B8;

    /// Copies the `width x height` window whose top-left corner is at
    /// `(x, y)`. The window is clamped to the image.
    pub fn cropped(&self, x: u32, y: u32, width: u32, height: u32) -> LoadedImage {
        let x = x.min(self.width);
        let y = y.min(self.height);
        let width = width.min(self.width - x);
        let height = height.min(self.height - y);
        let bpp = Self::FORMAT.bytes_per_pixel();
        let source_stride = self.width as usize * bpp;
        let row_start = x as usize * bpp;
        let row_len = width as usize * bpp;
        if row_len == 0 || height == 0 {
            return LoadedImage {
                width,
                height,
                pixels: Vec::new(),
            };
        }
        let mut pixels = Vec::with_capacity(row_len * height as usize);
        for row in self
            .pixels
            .chunks_exact(source_stride)
            .skip(y as usize)
            .take(height as usize)
        {
            pixels.extend_from_slice(&row[row_start..row_start + row_len]);
        }
        LoadedImage {
            width,
            height,
            pixels,
        }
    }
}

/// Final size for an image of `native_width x native_height` asked to fit
/// `width x height`, where zero means "unconstrained".
pub fn fit_dimensions(
    native_width: u32,
    native_height: u32,
    width: u32,
    height: u32,
    keep_aspect_ratio: bool,
) -> (u32, u32) {
    let (nw, nh) = (u64::from(native_width), u64::from(native_height));
    let (mut w, mut h) = (u64::from(width), u64::from(height));
    if (w == 0 && h == 0) || nw == 0 || nh == 0 {
        return (native_width.max(1), native_height.max(1));
    }
    if w == 0 {
        w = if keep_aspect_ratio { h * nw / nh } else { nw };
    } else if h == 0 {
        h = if keep_aspect_ratio { w * nh / nw } else { nh };
    } else if keep_aspect_ratio {
        if w * nh <= h * nw {
            h = w * nh / nw;
        } else {
            w = h * nw / nh;
        }
    }
    let clamp = |v: u64| v.clamp(1, u64::from(u32::MAX)) as u32;
    (clamp(w), clamp(h))
}

/// Decodes `path` and scales it to fit `width x height` (zero keeps the
/// native size on that axis).
///
/// Pixels come back in [`LoadedImage::FORMAT`]: each one is the
/// little-endian word `0xAARRGGBB`, so the bytes run B, G, R, A.
pub fn load_x8r8g8b8(
    path: impl AsRef<Path>,
    width: u32,
    height: u32,
    keep_aspect_ratio: bool,
) -> Result<LoadedImage, ImageError> {
    let path = path.as_ref();
    let decoded = image::open(path).map_err(|source| ImageError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    let (native_width, native_height) = (decoded.width(), decoded.height());
    if native_width == 0 || native_height == 0 {
        return Err(ImageError::Empty {
            path: path.to_path_buf(),
        });
    }
    debug!(
        "Decoded {} as {}x{}",
        path.display(),
        native_width,
        native_height
    );

    let (target_width, target_height) =
        fit_dimensions(native_width, native_height, width, height, keep_aspect_ratio);
    let decoded = if (target_width, target_height) != (native_width, native_height) {
        info!(
            "Scaling image from {}x{} to {}x{}",
            native_width, native_height, target_width, target_height
        );
        decoded.resize_exact(target_width, target_height, FilterType::Triangle)
    } else {
        decoded
    };

    let mut pixels = decoded.to_rgba8().into_raw();
    // RGBA bytes to the little-endian word 0xAARRGGBB.
    for pixel in pixels.chunks_exact_mut(4) {
        pixel.swap(0, 2);
    }
    Ok(LoadedImage {
        width: target_width,
        height: target_height,
        pixels,
    })
}
