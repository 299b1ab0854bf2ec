//! Mapping full-color images onto a fixed palette.

use crate::color::{pixel_count, Color, IndexedImage, Raster};
use crate::{Result, SixelError, SIXEL_PALETTE_MAX};

/// Turns a full-color raster into an [`IndexedImage`] over a fixed palette.
///
/// Implementations must only emit indices below `palette.len()`, so every
/// output pixel is exactly a member of `palette`.
pub trait Ditherer {
    fn dither<R: Raster + ?Sized>(&self, image: &R, palette: &[Color]) -> Result<IndexedImage>;
}

/// Floyd-Steinberg error diffusion.
///
/// ```text
///          curr    7/16
///  3/16    5/16    1/16
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct FloydSteinberg;

/// Plain nearest-color mapping, no error diffusion.
#[derive(Clone, Copy, Debug, Default)]
pub struct NearestColor;

/// Ditherer selection for [`EncodeOptions`](crate::EncodeOptions).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DitherMethod {
    #[default]
    FloydSteinberg,
    None,
}

impl Ditherer for DitherMethod {
    fn dither<R: Raster + ?Sized>(&self, image: &R, palette: &[Color]) -> Result<IndexedImage> {
        match self {
            DitherMethod::FloydSteinberg => FloydSteinberg.dither(image, palette),
            DitherMethod::None => NearestColor.dither(image, palette),
        }
    }
}

impl Ditherer for NearestColor {
    fn dither<R: Raster + ?Sized>(&self, image: &R, palette: &[Color]) -> Result<IndexedImage> {
        let (width, height) = image.dimensions();
        let len = check_palette(palette, width, height)?;

        let mut indices = Vec::with_capacity(len);
        for y in 0..height {
            for x in 0..width {
                indices.push(nearest_index(palette, image.color_at(x, y)));
            }
        }
        Ok(IndexedImage::from_parts(width, height, palette.to_vec(), indices))
    }
}

impl Ditherer for FloydSteinberg {
    fn dither<R: Raster + ?Sized>(&self, image: &R, palette: &[Color]) -> Result<IndexedImage> {
        let (width, height) = image.dimensions();
        let len = check_palette(palette, width, height)?;
        let (w, h) = (width as usize, height as usize);

        let mut buf: Vec<[i32; 3]> = Vec::with_capacity(len);
        for y in 0..height {
            for x in 0..width {
                let c = image.color_at(x, y);
                buf.push([c.r as i32, c.g as i32, c.b as i32]);
            }
        }

        let mut indices = vec![0u8; len];
        for y in 0..h {
            for x in 0..w {
                let pos = y * w + x;
                let [r, g, b] = buf[pos].map(|v| v.clamp(0, 255));
                let wanted = Color::new(r as u8, g as u8, b as u8);
                let index = nearest_index(palette, wanted);
                indices[pos] = index;

                let got = palette[index as usize];
                let error = [
                    r - got.r as i32,
                    g - got.g as i32,
                    b - got.b as i32,
                ];
                if error == [0, 0, 0] {
                    continue;
                }

                if x + 1 < w {
                    diffuse(&mut buf[pos + 1], error, 7);
                }
                if y + 1 < h {
                    if x > 0 {
                        diffuse(&mut buf[pos + w - 1], error, 3);
                    }
                    diffuse(&mut buf[pos + w], error, 5);
                    if x + 1 < w {
                        diffuse(&mut buf[pos + w + 1], error, 1);
                    }
                }
            }
        }

        Ok(IndexedImage::from_parts(width, height, palette.to_vec(), indices))
    }
}

/// Add `numerator/16` of `error` to a pixel.
#[inline]
fn diffuse(pixel: &mut [i32; 3], error: [i32; 3], numerator: i32) {
    for (p, e) in pixel.iter_mut().zip(error) {
        *p += e * numerator / 16;
    }
}

/// Index of the closest palette entry; the lowest index wins ties.
pub(crate) fn nearest_index(palette: &[Color], color: Color) -> u8 {
    let mut best = 0;
    let mut best_distance = u32::MAX;
    for (i, &candidate) in palette.iter().enumerate() {
        let distance = candidate.distance_sq(color);
        if distance < best_distance {
            best = i;
            best_distance = distance;
            if distance == 0 {
                break;
            }
        }
    }
    best as u8
}

/// Validates the palette and returns the pixel count.
fn check_palette(palette: &[Color], width: u32, height: u32) -> Result<usize> {
    if palette.len() > SIXEL_PALETTE_MAX {
        return Err(SixelError::InvalidArgument(format!(
            "palette has {} entries, at most {} are supported",
            palette.len(),
            SIXEL_PALETTE_MAX
        )));
    }
    let len = pixel_count(width, height)?;
    if palette.is_empty() && len > 0 {
        return Err(SixelError::InvalidArgument(
            "cannot map pixels onto an empty palette".into(),
        ));
    }
    Ok(len)
}
