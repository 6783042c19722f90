// src/error.rs

//! Error types for the device session, the blit engine and the image loader.

use crate::pixel_format::PixelFormat;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures while opening and negotiating a framebuffer session.
///
/// `ModeQuery`, `ModeSet` and `FixedInfoQuery` are recoverable: they are
/// logged and the session carries on. The others leave the session
/// unavailable.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("failed to open {} for reading/writing", path.display())]
    DeviceOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read variable mode information")]
    ModeQuery(#[source] io::Error),
    #[error("failed to set mode to {width}x{height}@{bits_per_pixel}")]
    ModeSet {
        width: u32,
        height: u32,
        bits_per_pixel: u32,
        #[source]
        source: io::Error,
    },
    #[error("failed to read fixed mode information")]
    FixedInfoQuery(#[source] io::Error),
    #[error("unusable pixel format at {bits_per_pixel} bits per pixel")]
    UnsupportedPixelFormat { bits_per_pixel: u32 },
    #[error("failed to map {len} bytes of framebuffer memory")]
    MemoryMap {
        len: usize,
        #[source]
        source: io::Error,
    },
}

impl SessionError {
    /// True if the session cannot continue after this error.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SessionError::DeviceOpen { .. }
                | SessionError::UnsupportedPixelFormat { .. }
                | SessionError::MemoryMap { .. }
        )
    }
}

/// Precondition violations caught by the blit and fill paths.
///
/// When one of these is returned nothing has been written to the surface.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BlitError {
    #[error("framebuffer session is not available")]
    NotAvailable,
    #[error(
        "rectangle {width}x{height} at ({x}, {y}) exceeds the {surface_width}x{surface_height} surface"
    )]
    OutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
        surface_width: usize,
        surface_height: usize,
    },
    #[error("rectangle at ({x}, {y}) addresses past the end of mapped memory")]
    BeyondMapping { x: usize, y: usize },
    #[error("source buffer holds {actual} bytes, {expected} needed")]
    SourceTooShort { expected: usize, actual: usize },
    #[error("no conversion from {from} to {to}")]
    UnsupportedConversion { from: PixelFormat, to: PixelFormat },
    #[error("pixel is {actual} bytes, {expected} expected")]
    PixelSizeMismatch { expected: usize, actual: usize },
    #[error("pixel is encoded as {actual}, surface is {expected}")]
    PixelFormatMismatch {
        expected: PixelFormat,
        actual: PixelFormat,
    },
}

/// Failures of the image loader.
#[derive(Error, Debug)]
pub enum ImageError {
    #[error("failed to load image {}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("image {} has no pixels", path.display())]
    Empty { path: PathBuf },
}
