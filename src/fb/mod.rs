// src/fb/mod.rs

//! Framebuffer devices.
//!
//! [`DisplayDevice`] is the control surface a session negotiates through:
//! query the variable mode, apply a new one, query the fixed mode, and map
//! the pixel memory. [`FbDevice`] talks to a real `/dev/fbN` node;
//! [`mock::MockDevice`] keeps everything in process memory.

use std::io;
use std::ops::DerefMut;

pub mod device;
pub mod mock;
pub mod sys;

pub use device::{FbDevice, Mmap};
pub use sys::{FbBitfield, FixScreenInfo, VarScreenInfo};

/// Default framebuffer node.
pub const DEFAULT_DEVICE: &str = "/dev/fb0";

/// Operations a session needs from a display device.
pub trait DisplayDevice {
    /// Mapped pixel memory. Unmapped when dropped.
    type Mapping: DerefMut<Target = [u8]>;

    fn var_screen_info(&self) -> io::Result<VarScreenInfo>;

    /// Applies `mode`. On success the device may have adjusted it in place.
    fn put_var_screen_info(&self, mode: &mut VarScreenInfo) -> io::Result<()>;

    fn fix_screen_info(&self) -> io::Result<FixScreenInfo>;

    /// Maps `len` bytes of pixel memory read/write and shared.
    fn map(&self, len: usize) -> io::Result<Self::Mapping>;
}

/// Resolution, depth and memory layout of a display mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DisplayMode {
    pub width: u32,
    pub height: u32,
    pub virtual_width: u32,
    pub virtual_height: u32,
    pub bits_per_pixel: u32,
    pub x_offset: u32,
    pub y_offset: u32,
    /// Bytes per scanline, including hardware padding.
    pub line_stride: u32,
}

impl DisplayMode {
    pub fn new(var: &VarScreenInfo, fix: &FixScreenInfo) -> Self {
        DisplayMode {
            width: var.xres,
            height: var.yres,
            virtual_width: var.xres_virtual,
            virtual_height: var.yres_virtual,
            bits_per_pixel: var.bits_per_pixel,
            x_offset: var.xoffset,
            y_offset: var.yoffset,
            line_stride: fix.line_length,
        }
    }

    /// Bytes to map for this mode.
    pub fn mapped_len(&self) -> usize {
        self.height as usize * self.line_stride as usize
    }
}

impl std::fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}x{}@{} (virtual {}x{})",
            self.width, self.height, self.bits_per_pixel, self.virtual_width, self.virtual_height
        )
    }
}
