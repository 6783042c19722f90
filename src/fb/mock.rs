// src/fb/mock.rs

//! An in-memory framebuffer for tests and dry runs.
//!
//! Clones share state, so a test can hand one clone to a session and keep
//! another to inspect the mode writes and inject failures.

use super::sys::{FbBitfield, FixScreenInfo, VarScreenInfo};
use super::DisplayDevice;
use std::cell::RefCell;
use std::io;
use std::rc::Rc;

/// Which device operations should fail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Failures {
    pub var_query: bool,
    pub mode_set: bool,
    pub fix_query: bool,
    pub map: bool,
}

#[derive(Debug)]
struct MockState {
    var: VarScreenInfo,
    fix: FixScreenInfo,
    failures: Failures,
    /// Recompute `line_length` from the new mode on every accepted mode set.
    derive_stride: bool,
    mode_writes: Vec<VarScreenInfo>,
    mapped_lens: Vec<usize>,
}

#[derive(Debug, Clone)]
pub struct MockDevice {
    state: Rc<RefCell<MockState>>,
}

/// Builds a variable mode with the channel geometry typical for `bpp`.
pub fn var_screen_info(width: u32, height: u32, bits_per_pixel: u32) -> VarScreenInfo {
    let (red, green, blue, transp) = match bits_per_pixel {
        32 => (
            FbBitfield::new(16, 8),
            FbBitfield::new(8, 8),
            FbBitfield::new(0, 8),
            FbBitfield::default(),
        ),
        24 => (
            FbBitfield::new(16, 8),
            FbBitfield::new(8, 8),
            FbBitfield::new(0, 8),
            FbBitfield::default(),
        ),
        16 => (
            FbBitfield::new(11, 5),
            FbBitfield::new(5, 6),
            FbBitfield::new(0, 5),
            FbBitfield::default(),
        ),
        15 => (
            FbBitfield::new(10, 5),
            FbBitfield::new(5, 5),
            FbBitfield::new(0, 5),
            FbBitfield::new(15, 1),
        ),
        _ => Default::default(),
    };
    VarScreenInfo {
        xres: width,
        yres: height,
        xres_virtual: width,
        yres_virtual: height,
        bits_per_pixel,
        red,
        green,
        blue,
        transp,
        ..Default::default()
    }
}

fn packed_stride(var: &VarScreenInfo) -> u32 {
    var.xres * var.bits_per_pixel.div_ceil(8)
}

impl MockDevice {
    /// A device in `var` mode with tightly packed scanlines.
    pub fn new(var: VarScreenInfo) -> Self {
        let fix = FixScreenInfo {
            line_length: packed_stride(&var),
            ..Default::default()
        };
        MockDevice {
            state: Rc::new(RefCell::new(MockState {
                var,
                fix,
                failures: Failures::default(),
                derive_stride: true,
                mode_writes: Vec::new(),
                mapped_lens: Vec::new(),
            })),
        }
    }

    /// Pads every scanline to `line_length` bytes. Disables stride derivation.
    pub fn with_line_length(self, line_length: u32) -> Self {
        {
            let mut state = self.state.borrow_mut();
            state.fix.line_length = line_length;
            state.derive_stride = false;
        }
        self
    }

    pub fn with_failures(self, failures: Failures) -> Self {
        self.state.borrow_mut().failures = failures;
        self
    }

    /// The mode the device currently holds.
    pub fn current(&self) -> VarScreenInfo {
        self.state.borrow().var
    }

    /// Every mode accepted through `put_var_screen_info`, in order.
    pub fn mode_writes(&self) -> Vec<VarScreenInfo> {
        self.state.borrow().mode_writes.clone()
    }

    /// Lengths of every mapping handed out.
    pub fn mapped_lens(&self) -> Vec<usize> {
        self.state.borrow().mapped_lens.clone()
    }

    fn refused(what: &str) -> io::Error {
        io::Error::new(io::ErrorKind::PermissionDenied, format!("mock refused {}", what))
    }
}

impl DisplayDevice for MockDevice {
    type Mapping = Vec<u8>;

    fn var_screen_info(&self) -> io::Result<VarScreenInfo> {
        let state = self.state.borrow();
        if state.failures.var_query {
            return Err(Self::refused("FBIOGET_VSCREENINFO"));
        }
        Ok(state.var)
    }

    fn put_var_screen_info(&self, mode: &mut VarScreenInfo) -> io::Result<()> {
        let mut state = self.state.borrow_mut();
        if state.failures.mode_set {
            return Err(Self::refused("FBIOPUT_VSCREENINFO"));
        }
        if mode.bits_per_pixel != state.var.bits_per_pixel || mode.red.length == 0 {
            // Like a driver, pick the channel layout that goes with the depth.
            let typical = var_screen_info(mode.xres, mode.yres, mode.bits_per_pixel);
            mode.red = typical.red;
            mode.green = typical.green;
            mode.blue = typical.blue;
            mode.transp = typical.transp;
        }
        state.var = *mode;
        if state.derive_stride {
            state.fix.line_length = packed_stride(mode);
        }
        state.mode_writes.push(*mode);
        Ok(())
    }

    fn fix_screen_info(&self) -> io::Result<FixScreenInfo> {
        let state = self.state.borrow();
        if state.failures.fix_query {
            return Err(Self::refused("FBIOGET_FSCREENINFO"));
        }
        Ok(state.fix)
    }

    fn map(&self, len: usize) -> io::Result<Vec<u8>> {
        let mut state = self.state.borrow_mut();
        if state.failures.map || len == 0 {
            return Err(Self::refused("mmap"));
        }
        state.mapped_lens.push(len);
        Ok(vec![0u8; len])
    }
}
