// src/surface.rs

//! Stride-aware access to a mapped pixel surface.
//!
//! A [`Surface`] borrows the mapped bytes of a framebuffer together with the
//! geometry of the active mode. All addressing goes through
//! [`SurfaceGeometry::pixel_offset`]:
//!
//! ```text
//! offset(x, y) = (y + y_offset) * line_stride + (x + x_offset) * bytes_per_pixel
//! ```
//!
//! Rows advance by `line_stride`, which may be larger than
//! `width * bytes_per_pixel` when the hardware pads scanlines.
//!
//! Bounds are a caller contract, but they are checked: a rectangle that does
//! not fit the visible surface or the mapped memory is rejected with a
//! [`BlitError`] before anything is written.

use crate::convert::{EncodedPixel, PixelConverter};
use crate::error::BlitError;
use crate::pixel_format::PixelFormat;
use log::trace;

/// Geometry of the visible surface inside the mapped memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceGeometry {
    pub width: usize,
    pub height: usize,
    pub x_offset: usize,
    pub y_offset: usize,
    pub line_stride: usize,
    pub format: PixelFormat,
}

impl SurfaceGeometry {
    pub fn bytes_per_pixel(&self) -> usize {
        self.format.bytes_per_pixel()
    }

    /// Byte offset of pixel `(x, y)` relative to the start of the mapping.
    pub fn pixel_offset(&self, x: usize, y: usize) -> usize {
        (y + self.y_offset) * self.line_stride + (x + self.x_offset) * self.bytes_per_pixel()
    }

    /// Validates a `width x height` rectangle at `(x, y)` against the visible
    /// surface and a mapping of `mapped_len` bytes.
    fn check_rect(
        &self,
        x: usize,
        y: usize,
        width: usize,
        height: usize,
        mapped_len: usize,
    ) -> Result<(), BlitError> {
        let fits = x
            .checked_add(width)
            .is_some_and(|right| right <= self.width)
            && y
                .checked_add(height)
                .is_some_and(|bottom| bottom <= self.height);
        if !fits {
            return Err(BlitError::OutOfBounds {
                x,
                y,
                width,
                height,
                surface_width: self.width,
                surface_height: self.height,
            });
        }
        if width == 0 || height == 0 {
            return Ok(());
        }
        let last_row_end =
            self.pixel_offset(x, y + height - 1) + width * self.bytes_per_pixel();
        if last_row_end > mapped_len {
            return Err(BlitError::BeyondMapping { x, y });
        }
        Ok(())
    }
}

/// Mutable view of a mapped surface.
pub struct Surface<'a> {
    memory: &'a mut [u8],
    geometry: SurfaceGeometry,
}

impl<'a> Surface<'a> {
    pub fn new(memory: &'a mut [u8], geometry: SurfaceGeometry) -> Self {
        Surface { memory, geometry }
    }

    pub fn geometry(&self) -> &SurfaceGeometry {
        &self.geometry
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.memory
    }

    /// Bytes of the `width`-pixel run starting at `(x, y)`.
    fn run_mut(&mut self, x: usize, y: usize, width: usize) -> &mut [u8] {
        let start = self.geometry.pixel_offset(x, y);
        let len = width * self.geometry.bytes_per_pixel();
        &mut self.memory[start..start + len]
    }

    /// Writes a `source_width x source_height` rectangle of tightly packed
    /// `source_format` pixels at `(x, y)`, converting to the surface format.
    ///
    /// Identical formats are copied row by row without reinterpretation.
    pub fn blit(
        &mut self,
        x: usize,
        y: usize,
        source: &[u8],
        source_width: usize,
        source_height: usize,
        source_format: PixelFormat,
    ) -> Result<(), BlitError> {
        let dest_format = self.geometry.format;
        let converter = if source_format == dest_format {
            None
        } else {
            Some(PixelConverter::new(source_format, dest_format)?)
        };

        // Bounds first: past this point the rectangle fits the surface and
        // its byte size cannot overflow.
        self.geometry
            .check_rect(x, y, source_width, source_height, self.memory.len())?;
        let source_stride = source_width * source_format.bytes_per_pixel();
        let expected = source_stride * source_height;
        if source.len() < expected {
            return Err(BlitError::SourceTooShort {
                expected,
                actual: source.len(),
            });
        }
        if expected == 0 {
            return Ok(());
        }

        trace!(
            "Blitting {}x{} {} rectangle to ({}, {}) as {}",
            source_width,
            source_height,
            source_format,
            x,
            y,
            dest_format
        );

        for (row, source_row) in source[..expected].chunks_exact(source_stride).enumerate() {
            let dest_row = self.run_mut(x, y + row, source_width);
            match &converter {
                None => dest_row.copy_from_slice(source_row),
                Some(converter) => converter.convert_row(source_row, dest_row),
            }
        }
        Ok(())
    }

    /// Replicates one pre-encoded pixel over the whole visible surface.
    pub fn fill(&mut self, pixel: &EncodedPixel) -> Result<(), BlitError> {
        let geometry = self.geometry;
        if pixel.format() != geometry.format {
            return Err(BlitError::PixelFormatMismatch {
                expected: geometry.format,
                actual: pixel.format(),
            });
        }
        geometry.check_rect(0, 0, geometry.width, geometry.height, self.memory.len())?;

        let bytes = pixel.as_bytes();
        for y in 0..geometry.height {
            let row = self.run_mut(0, y, geometry.width);
            for dest in row.chunks_exact_mut(bytes.len()) {
                dest.copy_from_slice(bytes);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::convert_pixel;
    use test_log::test;

    fn padded_geometry(format: PixelFormat) -> SurfaceGeometry {
        // Stride wider than width * bpp, plus a visible origin offset.
        SurfaceGeometry {
            width: 6,
            height: 4,
            x_offset: 2,
            y_offset: 1,
            line_stride: 6 * format.bytes_per_pixel() + 10,
            format,
        }
    }

    fn memory_for(geometry: &SurfaceGeometry) -> Vec<u8> {
        vec![0u8; (geometry.height + geometry.y_offset) * geometry.line_stride]
    }

    #[test]
    fn pixel_offset_follows_stride_and_origin() {
        let geometry = padded_geometry(PixelFormat::R5G6B5);
        assert_eq!(geometry.line_stride, 22);
        assert_eq!(geometry.pixel_offset(0, 0), 22 + 4);
        assert_eq!(geometry.pixel_offset(3, 2), 3 * 22 + 5 * 2);
    }

    #[test]
    fn same_format_blit_is_a_row_copy() {
        let geometry = padded_geometry(PixelFormat::R8G8B8);
        let mut memory = memory_for(&geometry);
        let source: Vec<u8> = (1..=18).collect(); // 3x2 pixels, 3 bytes each

        let mut surface = Surface::new(&mut memory, geometry);
        surface
            .blit(1, 1, &source, 3, 2, PixelFormat::R8G8B8)
            .unwrap();

        let first = geometry.pixel_offset(1, 1);
        let second = geometry.pixel_offset(1, 2);
        assert_eq!(second - first, geometry.line_stride);
        assert_eq!(&memory[first..first + 9], &source[..9]);
        assert_eq!(&memory[second..second + 9], &source[9..]);
        // Everything else is untouched.
        let written: usize = memory.iter().filter(|&&b| b != 0).count();
        assert_eq!(written, 18);
    }

    #[test]
    fn converting_blit_writes_at_computed_offsets() {
        let geometry = padded_geometry(PixelFormat::X8R8G8B8);
        let mut memory = memory_for(&geometry);
        let source = [0x10u8, 0x20, 0x30, 0x40];

        let mut surface = Surface::new(&mut memory, geometry);
        surface
            .blit(4, 2, &source, 2, 2, PixelFormat::GREY8)
            .unwrap();

        for (x, y, grey) in [(4, 2, 0x10u8), (5, 2, 0x20), (4, 3, 0x30), (5, 3, 0x40)] {
            let offset = geometry.pixel_offset(x, y);
            assert_eq!(&memory[offset..offset + 4], &[grey, grey, grey, 0xff]);
        }
    }

    #[test]
    fn out_of_bounds_rectangle_is_rejected_without_writing() {
        let geometry = padded_geometry(PixelFormat::R5G6B5);
        let mut memory = memory_for(&geometry);
        let source = vec![0xffu8; 4 * 2 * 2];

        let mut surface = Surface::new(&mut memory, geometry);
        let result = surface.blit(3, 0, &source, 4, 2, PixelFormat::R5G6B5);
        assert!(matches!(result, Err(BlitError::OutOfBounds { .. })));
        let result = surface.blit(0, 3, &source, 4, 2, PixelFormat::R5G6B5);
        assert!(matches!(result, Err(BlitError::OutOfBounds { .. })));
        assert!(memory.iter().all(|&b| b == 0));
    }

    #[test]
    fn huge_rectangle_is_rejected_before_sizing_the_source() {
        let geometry = padded_geometry(PixelFormat::X8R8G8B8);
        let mut memory = memory_for(&geometry);

        let mut surface = Surface::new(&mut memory, geometry);
        let result = surface.blit(0, 0, &[], usize::MAX / 2, 3, PixelFormat::X8R8G8B8);
        assert!(matches!(result, Err(BlitError::OutOfBounds { .. })));
        let result = surface.blit(0, 0, &[], 3, usize::MAX, PixelFormat::R5G6B5);
        assert!(matches!(result, Err(BlitError::OutOfBounds { .. })));
        assert!(memory.iter().all(|&b| b == 0));
    }

    #[test]
    fn rectangle_past_the_mapping_is_rejected() {
        let geometry = padded_geometry(PixelFormat::R5G6B5);
        // Only height * stride bytes; the y offset pushes the last row out.
        let mut memory = vec![0u8; geometry.height * geometry.line_stride];
        let source = vec![0xffu8; 6 * 2];

        let mut surface = Surface::new(&mut memory, geometry);
        assert!(surface.blit(0, 0, &source, 6, 1, PixelFormat::R5G6B5).is_ok());
        let result = surface.blit(0, 3, &source, 6, 1, PixelFormat::R5G6B5);
        assert_eq!(result, Err(BlitError::BeyondMapping { x: 0, y: 3 }));
    }

    #[test]
    fn short_source_is_rejected() {
        let geometry = padded_geometry(PixelFormat::R8G8B8);
        let mut memory = memory_for(&geometry);
        let mut surface = Surface::new(&mut memory, geometry);
        let result = surface.blit(0, 0, &[0u8; 5], 2, 1, PixelFormat::R8G8B8);
        assert_eq!(
            result,
            Err(BlitError::SourceTooShort {
                expected: 6,
                actual: 5
            })
        );
    }

    #[test]
    fn fill_covers_first_and_last_pixel_and_skips_padding() {
        let geometry = padded_geometry(PixelFormat::X1R5G5B5);
        let mut memory = memory_for(&geometry);
        let color = convert_pixel(&[0x12, 0x34, 0x56], PixelFormat::R8G8B8, PixelFormat::X1R5G5B5)
            .unwrap();

        let mut surface = Surface::new(&mut memory, geometry);
        surface.fill(&color).unwrap();

        let first = geometry.pixel_offset(0, 0);
        let last = geometry.pixel_offset(geometry.width - 1, geometry.height - 1);
        assert_eq!(&memory[first..first + 2], color.as_bytes());
        assert_eq!(&memory[last..last + 2], color.as_bytes());
        // Row padding and the x offset columns stay clear.
        let row_end = geometry.pixel_offset(geometry.width, 0);
        assert!(memory[row_end..geometry.pixel_offset(0, 1)].iter().all(|&b| b == 0));
        assert!(memory[..first].iter().all(|&b| b == 0));
    }

    #[test]
    fn fill_rejects_pixel_of_another_format() {
        let geometry = padded_geometry(PixelFormat::R8G8B8X8);
        let mut memory = memory_for(&geometry);
        let color = convert_pixel(&[0x7f], PixelFormat::GREY8, PixelFormat::R5G6B5).unwrap();
        let mut surface = Surface::new(&mut memory, geometry);
        assert_eq!(
            surface.fill(&color),
            Err(BlitError::PixelFormatMismatch {
                expected: PixelFormat::R8G8B8X8,
                actual: PixelFormat::R5G6B5
            })
        );
    }
}
