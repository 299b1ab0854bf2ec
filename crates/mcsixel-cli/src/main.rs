//! img2sixel - Print images as SIXEL graphics
//!
//! Decodes a PNG, JPEG, GIF or WebP image and writes it as a SIXEL stream.

use clap::Parser;
use mcsixel::{DitherMethod, EncodeOptions, Encoder, SIXEL_PALETTE_MAX};
use std::fs::File;
use std::io::{self, Read};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "img2sixel")]
#[command(version)]
#[command(about = "Convert an image to SIXEL graphics", long_about = None)]
struct Cli {
    /// Input image file (PNG, JPEG, GIF, WebP); reads stdin when omitted or `-`
    input: Option<PathBuf>,

    /// Output SIXEL file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Maximum number of colors (1-256)
    #[arg(short, long, default_value = "256")]
    colors: u16,

    /// Map colors to the nearest palette entry without dithering
    #[arg(long)]
    no_dither: bool,

    /// Log quantization and encoding details to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn load_image(input: Option<&PathBuf>) -> Result<image::DynamicImage, Box<dyn std::error::Error>> {
    match input {
        Some(path) if path.as_os_str() != "-" => {
            let img = image::open(path)
                .map_err(|e| format!("Failed to open '{}': {}", path.display(), e))?;
            Ok(img)
        }
        _ => {
            let mut buf = Vec::new();
            io::stdin().read_to_end(&mut buf)?;
            let img = image::load_from_memory(&buf)
                .map_err(|e| format!("Failed to decode image from stdin: {}", e))?;
            Ok(img)
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .target(env_logger::Target::Stderr)
        .init();

    let img = load_image(cli.input.as_ref())?;

    let opts = EncodeOptions {
        max_colors: cli.colors.clamp(1, SIXEL_PALETTE_MAX as u16),
        dither: if cli.no_dither {
            DitherMethod::None
        } else {
            DitherMethod::FloydSteinberg
        },
    };
    log::info!(
        "encoding {}x{} image with up to {} colors",
        img.width(),
        img.height(),
        opts.max_colors
    );

    let encoder = Encoder::new(opts);
    match cli.output {
        Some(path) => {
            let file = File::create(&path)
                .map_err(|e| format!("Failed to create '{}': {}", path.display(), e))?;
            encoder.encode(&img, file)?;
            log::info!("written to '{}'", path.display());
        }
        None => {
            encoder.encode(&img, io::stdout().lock())?;
        }
    }

    Ok(())
}
