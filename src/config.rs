// src/config.rs

//! Configuration for the viewer.
//!
//! Every field has a default, so an empty JSON object (or no file at all)
//! gives a working setup: the primary framebuffer in its current mode, the
//! image at native size, centered on a black background, waiting for a key
//! before exiting. Command-line flags override whatever the file sets.

use crate::color::Color;
use crate::fb::{VarScreenInfo, DEFAULT_DEVICE};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root of the configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Framebuffer node to open.
    pub device: PathBuf,
    /// Mode to switch to while the image is shown.
    pub mode: ModeRequest,
    /// How the image is placed on screen.
    pub display: DisplayConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            device: PathBuf::from(DEFAULT_DEVICE),
            mode: ModeRequest::default(),
            display: DisplayConfig::default(),
        }
    }
}

impl Config {
    /// Reads a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        Ok(config)
    }
}

/// A requested display mode. Zero in any field keeps the current value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModeRequest {
    pub width: u32,
    pub height: u32,
    pub bits_per_pixel: u32,
}

impl ModeRequest {
    pub fn new(width: u32, height: u32, bits_per_pixel: u32) -> Self {
        ModeRequest {
            width,
            height,
            bits_per_pixel,
        }
    }

    /// Overwrites the requested fields of `mode` and pins the virtual
    /// resolution to the physical one (no panning).
    pub fn apply(&self, mode: &mut VarScreenInfo) {
        if self.width != 0 {
            mode.xres = self.width;
        }
        if self.height != 0 {
            mode.yres = self.height;
        }
        if self.bits_per_pixel != 0 {
            mode.bits_per_pixel = self.bits_per_pixel;
        }
        mode.xres_virtual = mode.xres;
        mode.yres_virtual = mode.yres;
    }
}

/// Image placement settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Draw once and exit instead of waiting for a key.
    pub oneshot: bool,
    /// Scale the image to fit the screen.
    pub autozoom: bool,
    /// Keep the aspect ratio when scaling.
    pub keep_aspect_ratio: bool,
    /// Center the image; otherwise it is drawn at the top-left corner.
    pub center: bool,
    /// Fill color for the area around the image.
    pub background: Color,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            oneshot: false,
            autozoom: false,
            keep_aspect_ratio: true,
            center: true,
            background: Color::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::NamedColor;
    use std::io::Write;
    use test_log::test;

    #[test]
    fn defaults_use_primary_framebuffer_in_current_mode() {
        let config = Config::default();
        assert_eq!(config.device, PathBuf::from("/dev/fb0"));
        assert_eq!(config.mode, ModeRequest::new(0, 0, 0));
        assert!(!config.display.oneshot);
        assert!(config.display.keep_aspect_ratio);
        assert_eq!(config.display.background, Color::Named(NamedColor::Black));
    }

    #[test]
    fn partial_json_keeps_remaining_defaults() {
        let config: Config = serde_json::from_str(
            r#"{"device": "/dev/fb1", "mode": {"bits_per_pixel": 16}, "display": {"oneshot": true}}"#,
        )
        .unwrap();
        assert_eq!(config.device, PathBuf::from("/dev/fb1"));
        assert_eq!(config.mode, ModeRequest::new(0, 0, 16));
        assert!(config.display.oneshot);
        assert!(config.display.center);
    }

    #[test]
    fn load_reads_file_and_reports_bad_json() {
        let mut good = tempfile::NamedTempFile::new().unwrap();
        write!(good, r#"{{"display": {{"background": {{"grey": 64}}}}}}"#).unwrap();
        let config = Config::load(good.path()).unwrap();
        assert_eq!(config.display.background, Color::Grey(64));

        let mut bad = tempfile::NamedTempFile::new().unwrap();
        write!(bad, "not json").unwrap();
        let err = Config::load(bad.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse config file"));

        assert!(Config::load("/nonexistent/fbview.json").is_err());
    }

    #[test]
    fn apply_overwrites_only_requested_fields_and_pins_virtual_size() {
        let mut mode = VarScreenInfo {
            xres: 1024,
            yres: 768,
            xres_virtual: 1024,
            yres_virtual: 1536,
            bits_per_pixel: 32,
            ..Default::default()
        };
        ModeRequest::new(800, 0, 0).apply(&mut mode);
        assert_eq!((mode.xres, mode.yres, mode.bits_per_pixel), (800, 768, 32));
        assert_eq!((mode.xres_virtual, mode.yres_virtual), (800, 768));
    }
}
