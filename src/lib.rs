// src/lib.rs

//! Show images on a Linux framebuffer.
//!
//! A [`Session`] opens a framebuffer device, negotiates a display mode and
//! maps its pixel memory. The blit engine copies pixel rectangles into that
//! memory, converting between the formats in [`pixel_format`] on the way.

pub mod color;
pub mod config;
pub mod console;
pub mod convert;
pub mod error;
pub mod fb;
pub mod image_io;
pub mod pixel_format;
pub mod session;
pub mod surface;
pub mod viewer;

pub use config::{Config, DisplayConfig, ModeRequest};
pub use convert::{convert_pixel, EncodedPixel, PixelConverter};
pub use error::{BlitError, ImageError, SessionError};
pub use pixel_format::{PixelFormat, PixelFormatInfo};
pub use session::{Session, SessionState};
