// src/viewer.rs

//! Putting a decoded image on screen.

use crate::config::DisplayConfig;
use crate::error::BlitError;
use crate::fb::DisplayDevice;
use crate::image_io::LoadedImage;
use crate::session::Session;
use log::{debug, info};

/// Where an image lands on screen, after cropping to fit.
///
/// `source_x`/`source_y` locate the visible window inside the image. A
/// centered image larger than the screen shows its middle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub x: u32,
    pub y: u32,
    pub source_x: u32,
    pub source_y: u32,
    pub width: u32,
    pub height: u32,
}

impl Placement {
    pub fn new(
        image_width: u32,
        image_height: u32,
        screen_width: u32,
        screen_height: u32,
        center: bool,
    ) -> Self {
        let width = image_width.min(screen_width);
        let height = image_height.min(screen_height);
        let (x, y, source_x, source_y) = if center {
            (
                (screen_width - width) / 2,
                (screen_height - height) / 2,
                (image_width - width) / 2,
                (image_height - height) / 2,
            )
        } else {
            (0, 0, 0, 0)
        };
        Placement {
            x,
            y,
            source_x,
            source_y,
            width,
            height,
        }
    }
}

/// Clears the screen to the background color and draws `image` on it.
pub fn present<D: DisplayDevice>(
    session: &mut Session<D>,
    image: &LoadedImage,
    display: &DisplayConfig,
) -> Result<Placement, BlitError> {
    let (format, bytes) = display.background.to_source_pixel();
    let background = session.convert_color(&bytes, format)?;
    session.clear(&background)?;

    let placement = Placement::new(
        image.width,
        image.height,
        session.width(),
        session.height(),
        display.center,
    );
    let cropped;
    let visible = if (placement.width, placement.height) == (image.width, image.height) {
        image
    } else {
        debug!(
            "Cropping {}x{} image to {}x{} at ({}, {})",
            image.width,
            image.height,
            placement.width,
            placement.height,
            placement.source_x,
            placement.source_y
        );
        cropped = image.cropped(
            placement.source_x,
            placement.source_y,
            placement.width,
            placement.height,
        );
        &cropped
    };

    session.blit(
        placement.x as usize,
        placement.y as usize,
        &visible.pixels,
        visible.width as usize,
        visible.height as usize,
        LoadedImage::FORMAT,
    )?;
    info!(
        "Drew {}x{} image at ({}, {})",
        placement.width, placement.height, placement.x, placement.y
    );
    Ok(placement)
}
