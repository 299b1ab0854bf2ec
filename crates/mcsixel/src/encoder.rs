//! SIXEL encoder built on the median-cut quantizer.
//!
//! Images that already carry a palette of at most 256 colors are written
//! as-is; everything else is quantized with [`MedianCut`] and then mapped
//! onto the resulting palette by a [`Ditherer`].

use std::io::{BufWriter, Write};

use crate::color::{pixel_count, Color, ColorSet, IndexedImage, Raster};
use crate::dither::{DitherMethod, Ditherer};
use crate::palette::PaletteMap;
use crate::quant::MedianCut;
use crate::rle::rle_encode;
use crate::{
    Result, SixelError, SIXEL_BAND_HEIGHT, SIXEL_INTRODUCER, SIXEL_OFFSET, SIXEL_PALETTE_MAX,
    SIXEL_TERMINATOR,
};

/// Options for the SIXEL encoder.
#[derive(Clone, Debug)]
pub struct EncodeOptions {
    /// Maximum number of colors in the palette (1-256).
    /// Fewer colors = smaller SIXEL output but less accurate colors.
    pub max_colors: u16,

    /// How full-color pixels are mapped onto the quantized palette.
    pub dither: DitherMethod,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            max_colors: SIXEL_PALETTE_MAX as u16,
            dither: DitherMethod::FloydSteinberg,
        }
    }
}

/// One color's row of sixels within a band.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BandLine {
    /// Palette register the line is drawn with.
    pub color_index: u8,
    /// Run-length compressed sixel characters, one per column before compression.
    pub data: String,
}

/// Quantizes, maps and writes images as SIXEL.
#[derive(Clone, Debug)]
pub struct Encoder<D = DitherMethod> {
    max_colors: u16,
    ditherer: D,
}

impl Encoder<DitherMethod> {
    pub fn new(opts: EncodeOptions) -> Self {
        Self {
            max_colors: opts.max_colors,
            ditherer: opts.dither,
        }
    }
}

impl Default for Encoder<DitherMethod> {
    fn default() -> Self {
        Self::new(EncodeOptions::default())
    }
}

impl<D: Ditherer> Encoder<D> {
    /// Replace the palette mapping step.
    pub fn ditherer<E: Ditherer>(self, ditherer: E) -> Encoder<E> {
        Encoder {
            max_colors: self.max_colors,
            ditherer,
        }
    }

    /// Quantize `image` and map its pixels onto the new palette.
    ///
    /// When the image has no more distinct colors than `max_colors`, the
    /// palette is exactly that color set and pixels are looked up directly;
    /// otherwise the configured ditherer does the mapping.
    pub fn index<R: Raster + ?Sized>(&self, image: &R) -> Result<IndexedImage> {
        let quantizer = MedianCut::new(self.max_colors as usize)?;
        let colors = ColorSet::from_raster(image);
        let exact = colors.len() <= quantizer.max_colors();
        let palette = quantizer.quantize_colors(colors)?;

        if exact {
            if let Some(indexed) = PaletteMap::new(&palette)?.index_raster(image) {
                return Ok(indexed);
            }
        }
        self.ditherer.dither(image, &palette)
    }

    /// Quantize, map and write `image` to `out`.
    pub fn encode<R: Raster + ?Sized, W: Write>(&self, image: &R, out: W) -> Result<()> {
        let indexed = self.index(image)?;
        write_sixel(&indexed, out)
    }

    /// Write an image that already has its palette. Never quantizes or dithers.
    pub fn encode_indexed<W: Write>(&self, image: &IndexedImage, out: W) -> Result<()> {
        log::debug!(
            "reusing existing palette of {} colors",
            image.palette().len()
        );
        write_sixel(image, out)
    }

    /// Like [`Encoder::encode`], collecting the output into a string.
    #[must_use = "this returns the encoded SIXEL string"]
    pub fn encode_to_string<R: Raster + ?Sized>(&self, image: &R) -> Result<String> {
        let mut buf = Vec::new();
        self.encode(image, &mut buf)?;
        into_string(buf)
    }

    /// Like [`Encoder::encode_indexed`], collecting the output into a string.
    #[must_use = "this returns the encoded SIXEL string"]
    pub fn encode_indexed_to_string(&self, image: &IndexedImage) -> Result<String> {
        let mut buf = Vec::new();
        self.encode_indexed(image, &mut buf)?;
        into_string(buf)
    }
}

/// Encode RGBA image data into a SIXEL string.
///
/// # Arguments
/// * `rgba` - Raw RGBA pixel data (4 bytes per pixel: R, G, B, A); alpha is ignored
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `opts` - Encoding options
///
/// # Example
/// ```ignore
/// use mcsixel::{sixel_encode, EncodeOptions};
///
/// let rgba = vec![255u8, 0, 0, 255, 0, 255, 0, 255]; // 2 pixels: red, green
/// let sixel = sixel_encode(&rgba, 2, 1, &EncodeOptions::default())?;
/// println!("{}", sixel);
/// ```
#[must_use = "this returns the encoded SIXEL string"]
pub fn sixel_encode(
    rgba: &[u8],
    width: usize,
    height: usize,
    opts: &EncodeOptions,
) -> Result<String> {
    let image = RgbaSlice::new(rgba, width, height)?;
    Encoder::new(opts.clone()).encode_to_string(&image)
}

/// Encode RGBA with default options.
#[inline]
#[must_use = "this returns the encoded SIXEL string"]
pub fn sixel_encode_default(rgba: &[u8], width: usize, height: usize) -> Result<String> {
    sixel_encode(rgba, width, height, &EncodeOptions::default())
}

/// Write the complete SIXEL sequence for `image` to `out`.
///
/// Output is buffered; a failed write aborts immediately and whatever was
/// already flushed stays written.
pub fn write_sixel<W: Write>(image: &IndexedImage, out: W) -> Result<()> {
    let palette = PaletteMap::new(image.palette())?;
    let (width, height) = (image.width(), image.height());
    log::debug!(
        "encoding {}x{} image with {} palette registers",
        width,
        height,
        palette.len()
    );

    let mut out = BufWriter::new(out);

    // DCS introducer, then raster attributes: 1:1 pixel aspect, width, height
    out.write_all(SIXEL_INTRODUCER.as_bytes())?;
    write!(out, "q\"1;1;{};{}", width, height)?;

    palette.write_definitions(&mut out)?;

    if width > 0 {
        let height = height as usize;
        for top in (0..height).step_by(SIXEL_BAND_HEIGHT) {
            let lines = encode_band(image, top as u32);
            log::trace!("band at row {}: {} colors", top, lines.len());

            for (i, line) in lines.iter().enumerate() {
                if i > 0 {
                    // Carriage return to start of band for next color overlay
                    out.write_all(b"$")?;
                }
                write!(out, "#{}", line.color_index)?;
                out.write_all(line.data.as_bytes())?;
            }

            if top + SIXEL_BAND_HEIGHT < height {
                // Move to next band
                out.write_all(b"-")?;
            }
        }
    }

    out.write_all(SIXEL_TERMINATOR.as_bytes())?;
    out.flush()?;
    Ok(())
}

/// Palette indices present in the band starting at row `top`.
///
/// Order is discovery order, scanning column by column and top to bottom
/// within each column.
pub fn band_colors(image: &IndexedImage, top: u32) -> Vec<u8> {
    let bottom = band_bottom(image, top);
    let mut seen = [false; SIXEL_PALETTE_MAX];
    let mut colors = Vec::new();
    for x in 0..image.width() {
        for y in top..bottom {
            let index = image.index_at(x, y);
            if !seen[index as usize] {
                seen[index as usize] = true;
                colors.push(index);
            }
        }
    }
    colors
}

/// Per-column 6-bit masks for `color_index` in the band starting at `top`.
///
/// Bit `i` is set when row `top + i` exists and holds `color_index`. Values
/// are raw, without the printable offset.
pub fn pixel_masks(image: &IndexedImage, top: u32, color_index: u8) -> Vec<u8> {
    let bottom = band_bottom(image, top);
    (0..image.width())
        .map(|x| {
            let mut bits = 0u8;
            for (bit, y) in (top..bottom).enumerate() {
                if image.index_at(x, y) == color_index {
                    bits |= 1 << bit;
                }
            }
            bits
        })
        .collect()
}

/// Build the compressed sixel line of every color in the band at `top`.
pub fn encode_band(image: &IndexedImage, top: u32) -> Vec<BandLine> {
    band_colors(image, top)
        .into_iter()
        .map(|color_index| {
            let line: String = pixel_masks(image, top, color_index)
                .into_iter()
                .map(|bits| (SIXEL_OFFSET + bits) as char)
                .collect();
            BandLine {
                color_index,
                data: rle_encode(&line),
            }
        })
        .collect()
}

/// Exclusive last row of the band at `top`.
fn band_bottom(image: &IndexedImage, top: u32) -> u32 {
    top.saturating_add(SIXEL_BAND_HEIGHT as u32)
        .min(image.height())
}

fn into_string(buf: Vec<u8>) -> Result<String> {
    String::from_utf8(buf)
        .map_err(|e| SixelError::Internal(format!("encoder produced non-ASCII output: {}", e)))
}

/// Borrowed RGBA buffer viewed as a raster.
struct RgbaSlice<'a> {
    data: &'a [u8],
    width: u32,
    height: u32,
}

impl<'a> RgbaSlice<'a> {
    fn new(data: &'a [u8], width: usize, height: usize) -> Result<Self> {
        let width = u32::try_from(width).map_err(|_| SixelError::IntegerOverflow)?;
        let height = u32::try_from(height).map_err(|_| SixelError::IntegerOverflow)?;
        let expected = pixel_count(width, height)?
            .checked_mul(4)
            .ok_or(SixelError::IntegerOverflow)?;
        if data.len() != expected {
            return Err(SixelError::BufferSizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }
}

impl Raster for RgbaSlice<'_> {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn color_at(&self, x: u32, y: u32) -> Color {
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        Color::new(
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_encode_simple() {
        let rgba = vec![255u8, 0, 0, 255]; // 1x1 red pixel
        let result = sixel_encode(&rgba, 1, 1, &EncodeOptions::default());
        let sixel = result.unwrap();
        assert_eq!(sixel, "\x1bPq\"1;1;1;1#0;2;100;0;0#0@\x1b\\");
    }

    #[test]
    fn test_encode_2x2() {
        let rgba = vec![
            255, 0, 0, 255, // red
            0, 255, 0, 255, // green
            0, 0, 255, 255, // blue
            255, 255, 0, 255, // yellow
        ];
        let sixel = sixel_encode(&rgba, 2, 2, &EncodeOptions::default()).unwrap();
        assert_eq!(
            sixel,
            "\x1bPq\"1;1;2;2\
             #0;2;100;0;0#1;2;0;100;0#2;2;0;0;100#3;2;100;100;0\
             #0@?$#2A?$#1?@$#3?A\
             \x1b\\"
        );
    }

    #[test]
    fn test_buffer_mismatch() {
        let rgba = vec![0u8; 16];
        assert!(matches!(
            sixel_encode(&rgba, 10, 10, &EncodeOptions::default()),
            Err(SixelError::BufferSizeMismatch {
                expected: 400,
                actual: 16
            })
        ));
    }

    #[test]
    fn test_zero_dimensions_have_no_bands() {
        let sixel = sixel_encode(&[], 0, 4, &EncodeOptions::default()).unwrap();
        assert_eq!(sixel, "\x1bPq\"1;1;0;4\x1b\\");
        let sixel = sixel_encode(&[], 4, 0, &EncodeOptions::default()).unwrap();
        assert_eq!(sixel, "\x1bPq\"1;1;4;0\x1b\\");
    }

    #[test]
    fn test_invalid_max_colors() {
        let opts = EncodeOptions {
            max_colors: 0,
            ..Default::default()
        };
        assert!(matches!(
            sixel_encode(&[0, 0, 0, 255], 1, 1, &opts),
            Err(SixelError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_short_last_band_masks() {
        // 7 rows: the second band holds a single row
        let image = IndexedImage::new(2, 7, vec![Color::new(0, 0, 0)], vec![0; 14]).unwrap();
        assert_eq!(pixel_masks(&image, 0, 0), vec![63, 63]);
        assert_eq!(pixel_masks(&image, 6, 0), vec![1, 1]);
    }

    #[test]
    fn test_band_colors_discovery_order() {
        // column 0: 2 over 1, column 1: 0 over 2
        let palette = vec![Color::default(); 3];
        let image = IndexedImage::new(2, 2, palette, vec![2, 0, 1, 2]).unwrap();
        assert_eq!(band_colors(&image, 0), vec![2, 1, 0]);
    }

    #[test]
    fn test_encode_band_compresses_runs() {
        let palette = vec![Color::new(0, 0, 0), Color::new(255, 255, 255)];
        let mut indices = vec![0u8; 8 * 6];
        indices[8 * 5 + 7] = 1; // bottom-right pixel
        let image = IndexedImage::new(8, 6, palette, indices).unwrap();

        let lines = encode_band(&image, 0);
        assert_eq!(
            lines,
            vec![
                BandLine {
                    color_index: 0,
                    data: "!7~^".into()
                },
                BandLine {
                    color_index: 1,
                    data: "!7?_".into()
                },
            ]
        );
    }

    #[test]
    fn test_write_failure_propagates() {
        struct FailingWriter;
        impl Write for FailingWriter {
            fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let image = IndexedImage::new(1, 1, vec![Color::default()], vec![0]).unwrap();
        assert!(matches!(
            write_sixel(&image, FailingWriter),
            Err(SixelError::Io(_))
        ));
    }
}
