// src/main.rs

use anyhow::{anyhow, Context};
use clap::Parser;
use fbview::console::wait_for_keypress;
use fbview::image_io::load_x8r8g8b8;
use fbview::{viewer, Config, Session};
use log::{error, info};
use std::path::PathBuf;
use std::process::ExitCode;

/// Show an image on a Linux framebuffer.
#[derive(Parser, Debug)]
#[command(name = "fbview", version, about)]
struct Args {
    /// Display the image and quit without waiting for a key.
    #[arg(short = '1', long)]
    oneshot: bool,

    /// Scale the image to fit the screen.
    #[arg(short = 'a', long)]
    autozoom: bool,

    /// JSON configuration file.
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Horizontal resolution to switch to.
    #[arg(long)]
    width: Option<u32>,

    /// Vertical resolution to switch to.
    #[arg(long)]
    height: Option<u32>,

    /// Bits per pixel to switch to.
    #[arg(long)]
    bpp: Option<u32>,

    /// Stretch to the screen instead of keeping the aspect ratio.
    #[arg(long)]
    no_aspect: bool,

    /// Framebuffer device, e.g. /dev/fb0. Empty uses the configured default.
    device: String,

    /// Image file to show.
    image: PathBuf,
}

impl Args {
    fn apply_to(&self, config: &mut Config) {
        if !self.device.is_empty() {
            config.device = PathBuf::from(&self.device);
        }
        if let Some(width) = self.width {
            config.mode.width = width;
        }
        if let Some(height) = self.height {
            config.mode.height = height;
        }
        if let Some(bpp) = self.bpp {
            config.mode.bits_per_pixel = bpp;
        }
        config.display.oneshot |= self.oneshot;
        config.display.autozoom |= self.autozoom;
        if self.no_aspect {
            config.display.keep_aspect_ratio = false;
        }
    }
}

/// Why the viewer gave up, mapped onto the process exit code.
enum Failure {
    Usage(anyhow::Error),
    DeviceUnavailable(anyhow::Error),
    ImageLoad(anyhow::Error),
    Runtime(anyhow::Error),
}

impl Failure {
    fn exit_code(&self) -> u8 {
        match self {
            Failure::Runtime(_) => 1,
            Failure::Usage(_) => 2,
            Failure::DeviceUnavailable(_) => 3,
            Failure::ImageLoad(_) => 4,
        }
    }

    fn error(&self) -> &anyhow::Error {
        match self {
            Failure::Usage(e)
            | Failure::DeviceUnavailable(e)
            | Failure::ImageLoad(e)
            | Failure::Runtime(e) => e,
        }
    }
}

fn run(args: Args) -> Result<(), Failure> {
    let mut config = match &args.config {
        Some(path) => Config::load(path).map_err(Failure::Usage)?,
        None => Config::default(),
    };
    args.apply_to(&mut config);

    let mut session = Session::open(&config.mode, &config.device);
    if !session.is_available() {
        let reason = session
            .failure()
            .map(|e| e.to_string())
            .unwrap_or_else(|| "unknown error".to_string());
        return Err(Failure::DeviceUnavailable(anyhow!(
            "Failed to initialize framebuffer {}: {}",
            config.device.display(),
            reason
        )));
    }

    let (fit_width, fit_height) = if config.display.autozoom {
        (session.width(), session.height())
    } else {
        (0, 0)
    };
    let image = load_x8r8g8b8(
        &args.image,
        fit_width,
        fit_height,
        config.display.keep_aspect_ratio,
    )
    .map_err(|e| Failure::ImageLoad(e.into()))?;

    viewer::present(&mut session, &image, &config.display)
        .context("Failed to draw image")
        .map_err(Failure::Runtime)?;

    if !config.display.oneshot {
        info!("Press any key to exit.");
        wait_for_keypress()
            .context("Failed to read from stdin")
            .map_err(Failure::Runtime)?;
    }

    session.destroy();
    Ok(())
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(2)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_micros()
        .init();

    info!("Starting fbview...");
    match run(args) {
        Ok(()) => {
            info!("fbview exited successfully.");
            ExitCode::SUCCESS
        }
        Err(failure) => {
            error!("{:#}", failure.error());
            ExitCode::from(failure.exit_code())
        }
    }
}
