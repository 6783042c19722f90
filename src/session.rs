// src/session.rs

//! A negotiated framebuffer session.
//!
//! Opening walks a fixed sequence of states:
//!
//! ```text
//! Closed -> Opened -> ModeQueried -> ModeNegotiated -> FixedInfoQueried
//!        -> FormatResolved -> Mapped
//! ```
//!
//! Mode queries, the mode set and the fixed-info query are best effort: a
//! failure is logged and negotiation continues with whatever the device
//! reports. An unusable pixel format or a failed mapping is fatal; the
//! session tears down what it acquired and stays unavailable for good.
//!
//! Once the original mode has been read, the session owes the device a
//! restore. That obligation is paid exactly once, by [`Session::destroy`]
//! or on drop, whichever comes first.

use crate::config::ModeRequest;
use crate::convert::{convert_pixel, EncodedPixel};
use crate::error::{BlitError, SessionError};
use crate::fb::{DisplayDevice, DisplayMode, FbDevice, FixScreenInfo, VarScreenInfo};
use crate::pixel_format::{classify, PixelFormat, PixelFormatInfo};
use crate::surface::{Surface, SurfaceGeometry};
use log::{debug, error, info, warn};
use std::path::Path;

/// Where a session is in its open sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Closed,
    Opened,
    ModeQueried,
    ModeNegotiated,
    FixedInfoQueried,
    FormatResolved,
    Mapped,
}

pub struct Session<D: DisplayDevice = FbDevice> {
    device: Option<D>,
    mapping: Option<D::Mapping>,
    state: SessionState,
    format: PixelFormat,
    /// Mode to put back on teardown. `None` once restored, or if it was
    /// never read.
    restore: Option<VarScreenInfo>,
    original_mode: Option<DisplayMode>,
    var: VarScreenInfo,
    fix: FixScreenInfo,
    failure: Option<SessionError>,
}

impl Session<FbDevice> {
    /// Opens the framebuffer at `path` and negotiates `request`.
    ///
    /// Never fails outright: check [`Session::is_available`], and
    /// [`Session::failure`] for the reason when it is not.
    pub fn open(request: &ModeRequest, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        info!("Opening framebuffer {}", path.display());
        match FbDevice::open(path) {
            Ok(device) => Session::with_device(device, request),
            Err(source) => {
                let err = SessionError::DeviceOpen {
                    path: path.to_path_buf(),
                    source,
                };
                error!("{}", describe(&err));
                Session::closed(Some(err))
            }
        }
    }
}

impl<D: DisplayDevice> Session<D> {
    fn closed(failure: Option<SessionError>) -> Self {
        Session {
            device: None,
            mapping: None,
            state: SessionState::Closed,
            format: PixelFormat::Unsupported,
            restore: None,
            original_mode: None,
            var: VarScreenInfo::default(),
            fix: FixScreenInfo::default(),
            failure,
        }
    }

    /// Negotiates `request` on an already opened device.
    pub fn with_device(device: D, request: &ModeRequest) -> Self {
        let mut session = Session::closed(None);
        session.device = Some(device);
        session.state = SessionState::Opened;
        if let Err(err) = session.negotiate(request) {
            error!("{}", describe(&err));
            session.failure = Some(err);
            session.destroy();
        }
        session
    }

    fn negotiate(&mut self, request: &ModeRequest) -> Result<(), SessionError> {
        let Some(device) = self.device.as_ref() else {
            return Ok(());
        };

        let mut mode = match device.var_screen_info() {
            Ok(mode) => {
                let fix = device.fix_screen_info().unwrap_or_default();
                let original = DisplayMode::new(&mode, &fix);
                info!("Original mode is {}", original);
                self.original_mode = Some(original);
                self.restore = Some(mode);
                mode
            }
            Err(source) => {
                let err = SessionError::ModeQuery(source);
                warn!("{}", describe(&err));
                VarScreenInfo::default()
            }
        };
        self.state = SessionState::ModeQueried;

        request.apply(&mut mode);
        let requested = mode;
        if let Err(source) = device.put_var_screen_info(&mut mode) {
            let err = SessionError::ModeSet {
                width: requested.xres,
                height: requested.yres,
                bits_per_pixel: requested.bits_per_pixel,
                source,
            };
            warn!("{}", describe(&err));
        }
        // The driver may have adjusted or refused the request; trust what it
        // reports now.
        match device.var_screen_info() {
            Ok(current) => mode = current,
            Err(source) => warn!("Failed to re-read mode after negotiation: {}", source),
        }
        self.var = mode;
        self.state = SessionState::ModeNegotiated;

        self.fix = match device.fix_screen_info() {
            Ok(fix) => fix,
            Err(source) => {
                let err = SessionError::FixedInfoQuery(source);
                warn!("{}", describe(&err));
                FixScreenInfo::default()
            }
        };
        debug!(
            "Fixed info: id {:?}, line length {}, memory {} bytes",
            self.fix.id(),
            self.fix.line_length,
            self.fix.smem_len
        );
        self.state = SessionState::FixedInfoQueried;

        let format = classify(&self.var.channel_layout());
        if !format.is_supported() {
            return Err(SessionError::UnsupportedPixelFormat {
                bits_per_pixel: self.var.bits_per_pixel,
            });
        }
        self.format = format;
        if self.fix.line_length == 0 {
            self.fix.line_length = self.var.xres_virtual.max(self.var.xres)
                * format.bytes_per_pixel() as u32;
            warn!(
                "No line length reported, assuming packed rows of {} bytes",
                self.fix.line_length
            );
        }
        self.state = SessionState::FormatResolved;

        let current = DisplayMode::new(&self.var, &self.fix);
        let len = current.mapped_len();
        let mapping = device
            .map(len)
            .map_err(|source| SessionError::MemoryMap { len, source })?;
        self.mapping = Some(mapping);
        self.state = SessionState::Mapped;
        info!("Framebuffer mode is {}, pixel format {}", current, format);
        Ok(())
    }

    /// True once the surface is mapped and ready for drawing.
    pub fn is_available(&self) -> bool {
        self.state == SessionState::Mapped && self.mapping.is_some()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Why the session is unavailable, if opening failed.
    pub fn failure(&self) -> Option<&SessionError> {
        self.failure.as_ref()
    }

    pub fn width(&self) -> u32 {
        self.var.xres
    }

    pub fn height(&self) -> u32 {
        self.var.yres
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn format_info(&self) -> &'static PixelFormatInfo {
        self.format.info()
    }

    /// The mode in effect after negotiation.
    pub fn current_mode(&self) -> DisplayMode {
        DisplayMode::new(&self.var, &self.fix)
    }

    /// The mode found before negotiation, if it could be read.
    pub fn original_mode(&self) -> Option<DisplayMode> {
        self.original_mode
    }

    fn geometry(&self) -> SurfaceGeometry {
        SurfaceGeometry {
            width: self.var.xres as usize,
            height: self.var.yres as usize,
            x_offset: self.var.xoffset as usize,
            y_offset: self.var.yoffset as usize,
            line_stride: self.fix.line_length as usize,
            format: self.format,
        }
    }

    /// A drawing view of the mapped memory.
    pub fn surface(&mut self) -> Result<Surface<'_>, BlitError> {
        if !self.is_available() {
            return Err(BlitError::NotAvailable);
        }
        let geometry = self.geometry();
        let mapping = self.mapping.as_mut().ok_or(BlitError::NotAvailable)?;
        Ok(Surface::new(&mut **mapping, geometry))
    }

    /// The mapped bytes, for inspection.
    pub fn mapped_bytes(&self) -> Option<&[u8]> {
        self.mapping.as_ref().map(|mapping| &**mapping)
    }

    /// Draws a tightly packed `width x height` rectangle of `source_format`
    /// pixels with its top-left corner at `(x, y)`.
    pub fn blit(
        &mut self,
        x: usize,
        y: usize,
        source: &[u8],
        width: usize,
        height: usize,
        source_format: PixelFormat,
    ) -> Result<(), BlitError> {
        self.surface()?
            .blit(x, y, source, width, height, source_format)
    }

    /// Encodes one `source_format` pixel in the surface format, for [`Session::clear`].
    pub fn convert_color(
        &self,
        source: &[u8],
        source_format: PixelFormat,
    ) -> Result<EncodedPixel, BlitError> {
        if !self.is_available() {
            return Err(BlitError::NotAvailable);
        }
        convert_pixel(source, source_format, self.format)
    }

    /// Fills the whole visible surface with an already encoded pixel.
    pub fn clear(&mut self, pixel: &EncodedPixel) -> Result<(), BlitError> {
        self.surface()?.fill(pixel)
    }

    /// Unmaps memory, restores the original mode and closes the device.
    ///
    /// Safe to call any number of times, including after a failed open.
    pub fn destroy(&mut self) {
        if self.mapping.take().is_some() {
            debug!("Released framebuffer mapping");
        }
        if let Some(device) = self.device.take() {
            if let Some(mut original) = self.restore.take() {
                match device.put_var_screen_info(&mut original) {
                    Ok(()) => info!(
                        "Restored mode {}x{}@{}",
                        original.xres, original.yres, original.bits_per_pixel
                    ),
                    Err(err) => warn!("Failed to restore original mode: {}", err),
                }
            }
            debug!("Closed framebuffer device");
        }
        self.state = SessionState::Closed;
    }
}

impl<D: DisplayDevice> Drop for Session<D> {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl<D: DisplayDevice> std::fmt::Debug for Session<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .field("format", &self.format)
            .field("mode", &self.current_mode())
            .field("failure", &self.failure)
            .finish()
    }
}

/// The error followed by its underlying cause, if any.
fn describe(err: &SessionError) -> String {
    match std::error::Error::source(err) {
        Some(source) => format!("{}: {}", err, source),
        None => err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fb::mock::{var_screen_info, Failures, MockDevice};
    use test_log::test;

    fn keep_current() -> ModeRequest {
        ModeRequest::default()
    }

    #[test]
    fn unopenable_path_leaves_session_closed() {
        let session = Session::open(&keep_current(), "/nonexistent/fb-device");
        assert!(!session.is_available());
        assert_eq!(session.state(), SessionState::Closed);
        assert!(session.mapped_bytes().is_none());
        assert!(matches!(
            session.failure(),
            Some(SessionError::DeviceOpen { .. })
        ));
    }

    #[test]
    fn keeping_current_mode_maps_height_times_stride() {
        let device = MockDevice::new(var_screen_info(64, 48, 32)).with_line_length(300);
        let session = Session::with_device(device.clone(), &keep_current());
        assert!(session.is_available());
        assert_eq!(session.state(), SessionState::Mapped);
        assert_eq!(session.format(), PixelFormat::X8R8G8B8);
        assert_eq!((session.width(), session.height()), (64, 48));
        assert_eq!(device.mapped_lens(), vec![48 * 300]);
        assert_eq!(session.mapped_bytes().map(<[u8]>::len), Some(48 * 300));
    }

    #[test]
    fn requested_mode_is_applied_and_virtual_size_pinned() {
        let mut var = var_screen_info(1024, 768, 32);
        var.yres_virtual = 1536;
        let device = MockDevice::new(var);
        let session = Session::with_device(device.clone(), &ModeRequest::new(640, 480, 16));
        assert!(session.is_available());
        assert_eq!(session.format(), PixelFormat::R5G6B5);
        let current = session.current_mode();
        assert_eq!((current.width, current.height), (640, 480));
        assert_eq!((current.virtual_width, current.virtual_height), (640, 480));
        assert_eq!(current.line_stride, 1280);
        let original = session.original_mode().unwrap();
        assert_eq!((original.width, original.virtual_height), (1024, 1536));
    }

    #[test]
    fn failed_mode_set_falls_back_to_current_mode() {
        let device = MockDevice::new(var_screen_info(320, 200, 24)).with_failures(Failures {
            mode_set: true,
            ..Default::default()
        });
        let session = Session::with_device(device, &ModeRequest::new(640, 480, 32));
        assert!(session.is_available());
        assert_eq!(session.format(), PixelFormat::R8G8B8);
        assert_eq!((session.width(), session.height()), (320, 200));
        assert!(session.failure().is_none());
    }

    #[test]
    fn unsupported_format_is_fatal_and_restores_mode() {
        let device = MockDevice::new(var_screen_info(320, 200, 32));
        let session = Session::with_device(device.clone(), &ModeRequest::new(0, 0, 12));
        assert!(!session.is_available());
        assert_eq!(session.state(), SessionState::Closed);
        assert!(matches!(
            session.failure(),
            Some(SessionError::UnsupportedPixelFormat { bits_per_pixel: 12 })
        ));
        assert_eq!(device.current().bits_per_pixel, 32);
        assert!(device.mapped_lens().is_empty());
    }

    #[test]
    fn drawing_on_a_closed_session_is_refused() {
        let device = MockDevice::new(var_screen_info(8, 8, 32)).with_failures(Failures {
            map: true,
            ..Default::default()
        });
        let mut session = Session::with_device(device, &keep_current());
        assert!(matches!(
            session.failure(),
            Some(SessionError::MemoryMap { len: 256, .. })
        ));
        assert_eq!(
            session.blit(0, 0, &[0; 4], 1, 1, PixelFormat::X8R8G8B8),
            Err(BlitError::NotAvailable)
        );
        assert_eq!(
            session.convert_color(&[0], PixelFormat::GREY8).unwrap_err(),
            BlitError::NotAvailable
        );
    }

    #[test]
    fn destroy_restores_once() {
        let device = MockDevice::new(var_screen_info(800, 600, 32));
        let mut session = Session::with_device(device.clone(), &ModeRequest::new(640, 480, 0));
        assert_eq!(device.current().xres, 640);
        session.destroy();
        session.destroy();
        drop(session);
        let writes = device.mode_writes();
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[1].xres, 800);
        assert_eq!(device.current().xres, 800);
    }

    #[test]
    fn clear_fills_with_converted_color() {
        let device = MockDevice::new(var_screen_info(4, 2, 16));
        let mut session = Session::with_device(device, &keep_current());
        let pixel = session
            .convert_color(&[0xff, 0xff, 0xff], PixelFormat::R8G8B8)
            .unwrap();
        session.clear(&pixel).unwrap();
        assert!(session.mapped_bytes().unwrap().iter().all(|&b| b == 0xff));
    }
}
