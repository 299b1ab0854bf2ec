//! # mcsixel
//!
//! A Rust SIXEL encoder built around a median-cut color quantizer.
//!
//! ## Features
//!
//! - **Quantizer**: median-cut palette reduction to at most 256 colors
//! - **Encoder**: banded, run-length compressed SIXEL output with a fixed
//!   1:1 raster attribute header
//!
//! ## Quick Start
//!
//! ### Encoding raw RGBA data
//!
//! ```ignore
//! use mcsixel::{sixel_encode, EncodeOptions};
//!
//! // RGBA image data (4 bytes per pixel), alpha is ignored
//! let rgba = vec![255u8, 0, 0, 255, 0, 255, 0, 255]; // red and green pixels
//! let sixel = sixel_encode(&rgba, 2, 1, &EncodeOptions::default())?;
//! print!("{}", sixel);
//! ```
//!
//! ### Encoding a decoded image into any writer
//!
//! ```ignore
//! use mcsixel::{EncodeOptions, Encoder};
//!
//! let img = image::open("snake.png")?;
//! Encoder::new(EncodeOptions::default()).encode(&img, std::io::stdout().lock())?;
//! ```
//!
//! ### Reusing an existing palette
//!
//! ```ignore
//! use mcsixel::{Color, EncodeOptions, Encoder, IndexedImage};
//!
//! let palette = vec![Color::new(0, 0, 0), Color::new(255, 255, 255)];
//! let image = IndexedImage::new(2, 1, palette, vec![0, 1])?;
//! let sixel = Encoder::new(EncodeOptions::default()).encode_indexed_to_string(&image)?;
//! ```

use thiserror::Error;

pub mod color;
pub mod dither;
pub mod encoder;
pub mod palette;
pub mod quant;
pub mod rle;

pub use color::{Axis, Color, ColorSet, IndexedImage, Raster};
pub use dither::{DitherMethod, Ditherer, FloydSteinberg, NearestColor};
pub use encoder::{
    band_colors, encode_band, pixel_masks, sixel_encode, sixel_encode_default, write_sixel,
    BandLine, EncodeOptions, Encoder,
};
pub use palette::{scale_channel, PaletteMap};
pub use quant::{quantize, MedianCut};
pub use rle::{rle_decode, rle_encode};

/// Errors that can occur during quantization or SIXEL encoding.
#[derive(Debug, Error)]
pub enum SixelError {
    /// A caller supplied an argument that violates a precondition
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The quantizer broke one of its own invariants; this is a bug, not bad input
    #[error("internal quantizer fault: {0}")]
    Internal(String),

    /// Buffer size doesn't match expected size for dimensions
    #[error("buffer size mismatch: expected {expected}, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    /// Integer overflow while computing buffer sizes
    #[error("integer overflow")]
    IntegerOverflow,

    /// Writing to the output sink failed
    #[error("write error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for SIXEL operations.
pub type Result<T> = core::result::Result<T, SixelError>;

/// Maximum number of palette registers the encoder will define.
pub const SIXEL_PALETTE_MAX: usize = 256;
/// Number of pixel rows covered by one sixel band.
pub const SIXEL_BAND_HEIGHT: usize = 6;
/// Bias added to a 6-bit mask to land in the printable range (`?`).
pub const SIXEL_OFFSET: u8 = 63;
/// Prefix of a run-length repeat introducer.
pub const SIXEL_REPEAT: char = '!';
/// DCS introducer (ESC P).
pub const SIXEL_INTRODUCER: &str = "\x1bP";
/// String terminator (ESC \).
pub const SIXEL_TERMINATOR: &str = "\x1b\\";
