//! Palette register definitions.

use std::collections::HashMap;
use std::fmt;
use std::io::{self, Write};

use crate::color::{Color, IndexedImage, Raster};
use crate::{Result, SixelError, SIXEL_PALETTE_MAX};

/// Rescale an 8-bit channel to the 0-100 percentage scale SIXEL uses.
#[inline]
pub fn scale_channel(value: u8) -> u8 {
    (value as u32 * 100 / 255) as u8
}

/// Color to register lookup for one palette, plus its `#i;2;r;g;b` header.
#[derive(Clone, Debug)]
pub struct PaletteMap<'a> {
    palette: &'a [Color],
    lookup: HashMap<Color, u8>,
}

impl<'a> PaletteMap<'a> {
    pub fn new(palette: &'a [Color]) -> Result<Self> {
        if palette.len() > SIXEL_PALETTE_MAX {
            return Err(SixelError::InvalidArgument(format!(
                "palette size {} exceeds the maximum of {} colors",
                palette.len(),
                SIXEL_PALETTE_MAX
            )));
        }

        let mut lookup = HashMap::with_capacity(palette.len());
        for (index, &color) in palette.iter().enumerate() {
            // duplicates resolve to their first register
            lookup.entry(color).or_insert(index as u8);
        }
        Ok(Self { palette, lookup })
    }

    pub fn len(&self) -> usize {
        self.palette.len()
    }

    pub fn is_empty(&self) -> bool {
        self.palette.is_empty()
    }

    /// Register holding `color`, if it is in the palette.
    pub fn index_of(&self, color: Color) -> Option<u8> {
        self.lookup.get(&color).copied()
    }

    /// Index `image` by exact color match.
    ///
    /// Returns `None` as soon as a pixel is not a palette member.
    pub fn index_raster<R: Raster + ?Sized>(&self, image: &R) -> Option<IndexedImage> {
        let (width, height) = image.dimensions();
        let mut indices = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                indices.push(self.index_of(image.color_at(x, y))?);
            }
        }
        Some(IndexedImage::from_parts(
            width,
            height,
            self.palette.to_vec(),
            indices,
        ))
    }

    /// Write every register definition, in ascending index order.
    pub fn write_definitions<W: Write>(&self, out: &mut W) -> io::Result<()> {
        write!(out, "{}", self)
    }
}

/// The register definitions, `#<index>;2;<r%>;<g%>;<b%>` per entry.
impl fmt::Display for PaletteMap<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, c) in self.palette.iter().enumerate() {
            write!(
                f,
                "#{};2;{};{};{}",
                index,
                scale_channel(c.r),
                scale_channel(c.g),
                scale_channel(c.b)
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_scale_channel_bounds() {
        assert_eq!(scale_channel(0), 0);
        assert_eq!(scale_channel(255), 100);
        assert_eq!(scale_channel(128), 50);
    }

    #[test]
    fn test_scale_channel_is_monotonic() {
        let mut last = 0;
        for v in 0..=255u8 {
            let scaled = scale_channel(v);
            assert!(scaled >= last, "{} scaled to {} after {}", v, scaled, last);
            last = scaled;
        }
    }

    #[test]
    fn test_definitions() {
        let palette = [Color::new(255, 0, 0), Color::new(0, 128, 255)];
        let map = PaletteMap::new(&palette).unwrap();
        assert_eq!(map.to_string(), "#0;2;100;0;0#1;2;0;50;100");

        let mut out = Vec::new();
        map.write_definitions(&mut out).unwrap();
        assert_eq!(out, b"#0;2;100;0;0#1;2;0;50;100");
    }

    #[test]
    fn test_lookup() {
        let palette = [
            Color::new(1, 2, 3),
            Color::new(4, 5, 6),
            Color::new(1, 2, 3),
        ];
        let map = PaletteMap::new(&palette).unwrap();
        assert_eq!(map.len(), 3);
        assert_eq!(map.index_of(Color::new(4, 5, 6)), Some(1));
        assert_eq!(map.index_of(Color::new(1, 2, 3)), Some(0));
        assert_eq!(map.index_of(Color::new(9, 9, 9)), None);
    }

    #[test]
    fn test_oversized_palette_rejected() {
        let palette = vec![Color::default(); SIXEL_PALETTE_MAX + 1];
        assert!(matches!(
            PaletteMap::new(&palette),
            Err(SixelError::InvalidArgument(_))
        ));
        assert!(PaletteMap::new(&palette[..SIXEL_PALETTE_MAX]).is_ok());
    }

    #[test]
    fn test_empty_palette() {
        let map = PaletteMap::new(&[]).unwrap();
        assert!(map.is_empty());
        assert_eq!(map.len(), 0);
        assert_eq!(map.to_string(), "");
        assert!(!PaletteMap::new(&[Color::default()]).unwrap().is_empty());
    }

    #[test]
    fn test_index_raster() {
        let img = image::RgbImage::from_fn(2, 1, |x, _| image::Rgb([x as u8, 0, 0]));
        let palette = [Color::new(1, 0, 0), Color::new(0, 0, 0)];
        let map = PaletteMap::new(&palette).unwrap();
        let indexed = map.index_raster(&img).unwrap();
        assert_eq!(indexed.indices(), &[1, 0]);

        let partial = [Color::new(0, 0, 0)];
        assert!(PaletteMap::new(&partial).unwrap().index_raster(&img).is_none());
    }
}
