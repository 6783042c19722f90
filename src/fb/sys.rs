// src/fb/sys.rs

//! Kernel ABI for the Linux framebuffer device (`linux/fb.h`).

use crate::pixel_format::{Bitfield, ChannelLayout};
use std::os::raw::{c_char, c_ulong};

const FBIOGET_VSCREENINFO: libc::c_ulong = 0x4600;
const FBIOPUT_VSCREENINFO: libc::c_ulong = 0x4601;
const FBIOGET_FSCREENINFO: libc::c_ulong = 0x4602;

nix::ioctl_read_bad!(fbioget_vscreeninfo, FBIOGET_VSCREENINFO, VarScreenInfo);
// The kernel writes the mode it actually applied back into the argument.
nix::ioctl_readwrite_bad!(fbioput_vscreeninfo, FBIOPUT_VSCREENINFO, VarScreenInfo);
nix::ioctl_read_bad!(fbioget_fscreeninfo, FBIOGET_FSCREENINFO, FixScreenInfo);

/// `struct fb_bitfield`
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FbBitfield {
    pub offset: u32,
    pub length: u32,
    pub msb_right: u32,
}

impl FbBitfield {
    pub const fn new(offset: u32, length: u32) -> Self {
        FbBitfield {
            offset,
            length,
            msb_right: 0,
        }
    }
}

impl From<FbBitfield> for Bitfield {
    fn from(field: FbBitfield) -> Self {
        Bitfield::new(field.offset, field.length)
    }
}

/// `struct fb_var_screeninfo`: the variable, negotiable part of a mode.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VarScreenInfo {
    pub xres: u32,
    pub yres: u32,
    pub xres_virtual: u32,
    pub yres_virtual: u32,
    pub xoffset: u32,
    pub yoffset: u32,
    pub bits_per_pixel: u32,
    pub grayscale: u32,
    pub red: FbBitfield,
    pub green: FbBitfield,
    pub blue: FbBitfield,
    pub transp: FbBitfield,
    pub nonstd: u32,
    pub activate: u32,
    pub height: u32,
    pub width: u32,
    pub accel_flags: u32,
    pub pixclock: u32,
    pub left_margin: u32,
    pub right_margin: u32,
    pub upper_margin: u32,
    pub lower_margin: u32,
    pub hsync_len: u32,
    pub vsync_len: u32,
    pub sync: u32,
    pub vmode: u32,
    pub rotate: u32,
    pub colorspace: u32,
    pub reserved: [u32; 4],
}

impl VarScreenInfo {
    /// Channel geometry for pixel format classification.
    pub fn channel_layout(&self) -> ChannelLayout {
        ChannelLayout {
            bits_per_pixel: self.bits_per_pixel,
            red: self.red.into(),
            green: self.green.into(),
            blue: self.blue.into(),
            transp: self.transp.into(),
        }
    }
}

/// `struct fb_fix_screeninfo`: properties fixed by the current mode.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixScreenInfo {
    pub id: [c_char; 16],
    pub smem_start: c_ulong,
    pub smem_len: u32,
    pub type_: u32,
    pub type_aux: u32,
    pub visual: u32,
    pub xpanstep: u16,
    pub ypanstep: u16,
    pub ywrapstep: u16,
    pub line_length: u32,
    pub mmio_start: c_ulong,
    pub mmio_len: u32,
    pub accel: u32,
    pub capabilities: u16,
    pub reserved: [u16; 2],
}

impl FixScreenInfo {
    /// Driver identification string.
    pub fn id(&self) -> String {
        let bytes: Vec<u8> = self
            .id
            .iter()
            .take_while(|&&c| c != 0)
            .map(|&c| c as u8)
            .collect();
        String::from_utf8_lossy(&bytes).into_owned()
    }
}
