//! Color primitives and the raster views the encoder reads from.

use std::collections::HashSet;

use image::{DynamicImage, GenericImageView, ImageBuffer, Rgb, RgbImage, Rgba, RgbaImage};

use crate::{Result, SixelError, SIXEL_PALETTE_MAX};

/// An opaque 8-bit RGB color. Alpha is never modeled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Component value along `axis`.
    #[inline]
    pub fn channel(self, axis: Axis) -> u8 {
        match axis {
            Axis::Red => self.r,
            Axis::Green => self.g,
            Axis::Blue => self.b,
        }
    }

    /// Renormalize 16-bit samples by dropping the low byte.
    #[inline]
    pub fn from_rgb16(r: u16, g: u16, b: u16) -> Self {
        Self::new((r >> 8) as u8, (g >> 8) as u8, (b >> 8) as u8)
    }

    /// Squared euclidean distance in RGB space.
    #[inline]
    pub fn distance_sq(self, other: Color) -> u32 {
        let dr = self.r as i32 - other.r as i32;
        let dg = self.g as i32 - other.g as i32;
        let db = self.b as i32 - other.b as i32;
        (dr * dr + dg * dg + db * db) as u32
    }
}

impl From<[u8; 3]> for Color {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self::new(r, g, b)
    }
}

impl From<Rgb<u8>> for Color {
    fn from(p: Rgb<u8>) -> Self {
        Self::from(p.0)
    }
}

impl From<Rgba<u8>> for Color {
    fn from(p: Rgba<u8>) -> Self {
        let [r, g, b, _] = p.0;
        Self::new(r, g, b)
    }
}

/// A color-space axis. Declaration order is the tie-break order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    Red,
    Green,
    Blue,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::Red, Axis::Green, Axis::Blue];
}

/// Rectangular, per-pixel color lookup.
///
/// This is the seam to whatever decoded the source image; implementations
/// renormalize their native depth to 8 bits per channel.
pub trait Raster {
    /// `(width, height)` in pixels.
    fn dimensions(&self) -> (u32, u32);

    /// Color at `(x, y)`. Callers stay within `dimensions()`.
    fn color_at(&self, x: u32, y: u32) -> Color;
}

impl<T: Raster + ?Sized> Raster for &T {
    fn dimensions(&self) -> (u32, u32) {
        (**self).dimensions()
    }

    fn color_at(&self, x: u32, y: u32) -> Color {
        (**self).color_at(x, y)
    }
}

impl Raster for RgbImage {
    fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    fn color_at(&self, x: u32, y: u32) -> Color {
        Color::from(*self.get_pixel(x, y))
    }
}

impl Raster for RgbaImage {
    fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    fn color_at(&self, x: u32, y: u32) -> Color {
        Color::from(*self.get_pixel(x, y))
    }
}

impl Raster for ImageBuffer<Rgb<u16>, Vec<u16>> {
    fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    fn color_at(&self, x: u32, y: u32) -> Color {
        let [r, g, b] = self.get_pixel(x, y).0;
        Color::from_rgb16(r, g, b)
    }
}

impl Raster for ImageBuffer<Rgba<u16>, Vec<u16>> {
    fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    fn color_at(&self, x: u32, y: u32) -> Color {
        let [r, g, b, _] = self.get_pixel(x, y).0;
        Color::from_rgb16(r, g, b)
    }
}

impl Raster for DynamicImage {
    fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    fn color_at(&self, x: u32, y: u32) -> Color {
        // 16-bit samples use the same `>> 8` rule as the plain buffers
        match self {
            DynamicImage::ImageRgb16(buf) => buf.color_at(x, y),
            DynamicImage::ImageRgba16(buf) => buf.color_at(x, y),
            DynamicImage::ImageLuma16(buf) => {
                let [l] = buf.get_pixel(x, y).0;
                Color::from_rgb16(l, l, l)
            }
            DynamicImage::ImageLumaA16(buf) => {
                let [l, _] = buf.get_pixel(x, y).0;
                Color::from_rgb16(l, l, l)
            }
            _ => Color::from(GenericImageView::get_pixel(self, x, y)),
        }
    }
}

/// The distinct colors of an image, in first-seen (row-major) order.
///
/// Membership is by exact RGB match, so duplicate pixels carry no weight.
#[derive(Clone, Debug, Default)]
pub struct ColorSet {
    seen: HashSet<Color>,
    colors: Vec<Color>,
}

impl ColorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan every pixel of `image`.
    pub fn from_raster<R: Raster + ?Sized>(image: &R) -> Self {
        let (width, height) = image.dimensions();
        let mut set = Self::new();
        for y in 0..height {
            for x in 0..width {
                set.insert(image.color_at(x, y));
            }
        }
        set
    }

    /// Returns `true` if the color was not present before.
    pub fn insert(&mut self, color: Color) -> bool {
        if self.seen.insert(color) {
            self.colors.push(color);
            true
        } else {
            false
        }
    }

    pub fn contains(&self, color: Color) -> bool {
        self.seen.contains(&color)
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Color> + '_ {
        self.colors.iter().copied()
    }

    pub fn into_vec(self) -> Vec<Color> {
        self.colors
    }
}

/// A raster stored as palette indices plus the palette itself.
///
/// Every index is guaranteed to be below `palette().len()`, and the palette
/// never exceeds [`SIXEL_PALETTE_MAX`] entries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexedImage {
    width: u32,
    height: u32,
    palette: Vec<Color>,
    indices: Vec<u8>,
}

impl IndexedImage {
    /// Build an indexed image, validating sizes and index ranges.
    pub fn new(width: u32, height: u32, palette: Vec<Color>, indices: Vec<u8>) -> Result<Self> {
        if palette.len() > SIXEL_PALETTE_MAX {
            return Err(SixelError::InvalidArgument(format!(
                "palette has {} entries, at most {} are supported",
                palette.len(),
                SIXEL_PALETTE_MAX
            )));
        }
        let expected = pixel_count(width, height)?;
        if indices.len() != expected {
            return Err(SixelError::BufferSizeMismatch {
                expected,
                actual: indices.len(),
            });
        }
        if let Some(&bad) = indices.iter().find(|&&i| i as usize >= palette.len()) {
            return Err(SixelError::InvalidArgument(format!(
                "index {} out of range for a palette of {} colors",
                bad,
                palette.len()
            )));
        }
        Ok(Self::from_parts(width, height, palette, indices))
    }

    /// Assemble without validation; callers uphold the type's invariants.
    pub(crate) fn from_parts(width: u32, height: u32, palette: Vec<Color>, indices: Vec<u8>) -> Self {
        debug_assert_eq!(indices.len(), width as usize * height as usize);
        Self {
            width,
            height,
            palette,
            indices,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn palette(&self) -> &[Color] {
        &self.palette
    }

    pub fn indices(&self) -> &[u8] {
        &self.indices
    }

    /// Palette index of the pixel at `(x, y)`.
    #[inline]
    pub fn index_at(&self, x: u32, y: u32) -> u8 {
        self.indices[y as usize * self.width as usize + x as usize]
    }

}

impl Raster for IndexedImage {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn color_at(&self, x: u32, y: u32) -> Color {
        self.palette[self.index_at(x, y) as usize]
    }
}

/// `width * height`, failing on overflow.
pub(crate) fn pixel_count(width: u32, height: u32) -> Result<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .ok_or(SixelError::IntegerOverflow)
}
