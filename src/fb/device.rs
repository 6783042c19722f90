// src/fb/device.rs

//! A real Linux framebuffer node.

use super::sys::{self, FixScreenInfo, VarScreenInfo};
use super::DisplayDevice;
use log::{debug, warn};
use std::fs::{File, OpenOptions};
use std::io;
use std::ops::{Deref, DerefMut};
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use std::ptr::NonNull;

/// An open `/dev/fbN` node. Closed when dropped.
#[derive(Debug)]
pub struct FbDevice {
    file: File,
    path: PathBuf,
}

impl FbDevice {
    /// Opens `path` for reading and writing.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        debug!("Opened {} as fd {}", path.display(), file.as_raw_fd());
        Ok(FbDevice {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DisplayDevice for FbDevice {
    type Mapping = Mmap;

    fn var_screen_info(&self) -> io::Result<VarScreenInfo> {
        let mut info = VarScreenInfo::default();
        // SAFETY: `info` is a live, correctly laid out fb_var_screeninfo.
        unsafe { sys::fbioget_vscreeninfo(self.file.as_raw_fd(), &mut info) }?;
        Ok(info)
    }

    fn put_var_screen_info(&self, mode: &mut VarScreenInfo) -> io::Result<()> {
        // SAFETY: `mode` is a live, correctly laid out fb_var_screeninfo.
        unsafe { sys::fbioput_vscreeninfo(self.file.as_raw_fd(), mode) }?;
        Ok(())
    }

    fn fix_screen_info(&self) -> io::Result<FixScreenInfo> {
        let mut info = FixScreenInfo::default();
        // SAFETY: `info` is a live, correctly laid out fb_fix_screeninfo.
        unsafe { sys::fbioget_fscreeninfo(self.file.as_raw_fd(), &mut info) }?;
        Ok(info)
    }

    fn map(&self, len: usize) -> io::Result<Mmap> {
        Mmap::shared(&self.file, len)
    }
}

/// A shared read/write mapping of device memory. Unmapped on drop.
#[derive(Debug)]
pub struct Mmap {
    ptr: NonNull<u8>,
    len: usize,
}

impl Mmap {
    fn shared(file: &File, len: usize) -> io::Result<Self> {
        if len == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "cannot map an empty framebuffer",
            ));
        }
        // SAFETY: a fresh mapping is requested; the kernel picks the address.
        let ptr = unsafe {
            libc::mmap(
                std::ptr::null_mut(),
                len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                file.as_raw_fd(),
                0,
            )
        };
        if ptr == libc::MAP_FAILED {
            return Err(io::Error::last_os_error());
        }
        let ptr = NonNull::new(ptr.cast::<u8>())
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "mmap returned null"))?;
        debug!("Mapped {} bytes of framebuffer memory at {:p}", len, ptr);
        Ok(Mmap { ptr, len })
    }
}

impl Deref for Mmap {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        // SAFETY: the mapping is `len` bytes and lives as long as `self`.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }
}

impl DerefMut for Mmap {
    fn deref_mut(&mut self) -> &mut [u8] {
        // SAFETY: as above, and `&mut self` guarantees exclusive access.
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl Drop for Mmap {
    fn drop(&mut self) {
        // SAFETY: `ptr`/`len` describe a mapping created by `Mmap::shared`.
        if unsafe { libc::munmap(self.ptr.as_ptr().cast(), self.len) } == -1 {
            warn!(
                "Failed to unmap {} bytes of framebuffer memory: {}",
                self.len,
                io::Error::last_os_error()
            );
        } else {
            debug!("Unmapped {} bytes of framebuffer memory", self.len);
        }
    }
}
