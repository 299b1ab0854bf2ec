/*****************************************************************************
 *
 * quantization
 *
 *****************************************************************************/

//! Median-cut palette generation.
//!
//! Based on Paul Heckbert's "Color Image Quantization for Frame Buffer
//! Display" (SIGGRAPH '82): the most populous bucket of distinct colors is
//! repeatedly cut at its median along the channel with the widest range,
//! then every bucket is averaged into one palette entry.

use crate::color::{Axis, Color, ColorSet, Raster};
use crate::{Result, SixelError, SIXEL_PALETTE_MAX};

/// Median-cut quantizer producing at most `max_colors` palette entries.
#[derive(Clone, Copy, Debug)]
pub struct MedianCut {
    max_colors: usize,
}

impl MedianCut {
    /// `max_colors` must lie in `1..=256`.
    pub fn new(max_colors: usize) -> Result<Self> {
        if !(1..=SIXEL_PALETTE_MAX).contains(&max_colors) {
            return Err(SixelError::InvalidArgument(format!(
                "max_colors must be between 1 and {}, got {}",
                SIXEL_PALETTE_MAX, max_colors
            )));
        }
        Ok(Self { max_colors })
    }

    pub fn max_colors(&self) -> usize {
        self.max_colors
    }

    /// Build a palette for `image` from scratch.
    ///
    /// `seed` must be empty: this quantizer never extends an existing
    /// palette, and a non-empty seed is rejected with
    /// [`SixelError::InvalidArgument`].
    pub fn quantize<R: Raster + ?Sized>(&self, seed: &[Color], image: &R) -> Result<Vec<Color>> {
        if !seed.is_empty() {
            return Err(SixelError::InvalidArgument(format!(
                "median cut builds palettes from scratch, got a seed of {} colors",
                seed.len()
            )));
        }
        self.quantize_colors(ColorSet::from_raster(image))
    }

    /// Reduce an already accumulated color set.
    pub fn quantize_colors(&self, colors: ColorSet) -> Result<Vec<Color>> {
        let unique = colors.len();
        if unique <= self.max_colors {
            log::debug!(
                "median cut: {} unique colors fit in {}, no reduction needed",
                unique,
                self.max_colors
            );
            return Ok(colors.into_vec());
        }

        let mut buckets: Vec<Bucket> = Vec::with_capacity(self.max_colors);
        buckets.push(Bucket(colors.into_vec()));

        while buckets.len() < self.max_colors {
            let largest = largest_bucket(&buckets)
                .ok_or_else(|| SixelError::Internal("no bucket left to split".into()))?;

            let bucket = std::mem::take(&mut buckets[largest]);
            let size = bucket.len();
            let (lower, upper) = bucket.split();
            let upper = upper.ok_or_else(|| {
                SixelError::Internal(format!("bucket of {} colors cannot be split", size))
            })?;
            buckets[largest] = lower;
            buckets.push(upper);
        }

        let palette = buckets
            .iter()
            .map(Bucket::average)
            .collect::<Result<Vec<_>>>()?;

        if palette.len() > self.max_colors {
            return Err(SixelError::Internal(format!(
                "generated {} colors, only {} were requested",
                palette.len(),
                self.max_colors
            )));
        }

        log::debug!(
            "median cut: reduced {} unique colors to {} palette entries",
            unique,
            palette.len()
        );
        Ok(palette)
    }
}

/// Quantize `image` to at most `max_colors` colors with median cut.
pub fn quantize<R: Raster + ?Sized>(image: &R, max_colors: usize) -> Result<Vec<Color>> {
    MedianCut::new(max_colors)?.quantize(&[], image)
}

/// One palette slot candidate: the colors it will be averaged from.
#[derive(Clone, Debug, Default)]
struct Bucket(Vec<Color>);

impl Bucket {
    fn len(&self) -> usize {
        self.0.len()
    }

    /// Axis with the widest value range; earlier axes win ties.
    fn longest_axis(&self) -> Axis {
        let mut min = [u8::MAX; 3];
        let mut max = [u8::MIN; 3];
        for &color in &self.0 {
            for (i, axis) in Axis::ALL.into_iter().enumerate() {
                let v = color.channel(axis);
                min[i] = min[i].min(v);
                max[i] = max[i].max(v);
            }
        }

        let mut best = Axis::Red;
        let mut best_range = 0;
        for (i, axis) in Axis::ALL.into_iter().enumerate() {
            let range = max[i].saturating_sub(min[i]);
            if range > best_range {
                best = axis;
                best_range = range;
            }
        }
        best
    }

    /// Cut at the median of the longest axis.
    ///
    /// A bucket with fewer than two colors comes back whole, with no upper half.
    fn split(mut self) -> (Bucket, Option<Bucket>) {
        if self.len() < 2 {
            return (self, None);
        }
        let axis = self.longest_axis();
        // sort_by_key is stable, equal values keep their insertion order
        self.0.sort_by_key(|c| c.channel(axis));
        let upper = self.0.split_off(self.len() / 2);
        (self, Some(Bucket(upper)))
    }

    /// Per-channel truncating mean.
    fn average(&self) -> Result<Color> {
        if self.0.is_empty() {
            return Err(SixelError::Internal(
                "empty bucket cannot produce a color".into(),
            ));
        }
        let (r, g, b) = self.0.iter().fold((0u64, 0u64, 0u64), |(r, g, b), c| {
            (r + c.r as u64, g + c.g as u64, b + c.b as u64)
        });
        let n = self.0.len() as u64;
        Ok(Color::new((r / n) as u8, (g / n) as u8, (b / n) as u8))
    }
}

/// Index of the bucket with the most colors; the first one wins ties.
fn largest_bucket(buckets: &[Bucket]) -> Option<usize> {
    let mut largest: Option<(usize, usize)> = None;
    for (i, bucket) in buckets.iter().enumerate() {
        if bucket.len() == 0 {
            continue;
        }
        match largest {
            Some((_, size)) if bucket.len() <= size => {}
            _ => largest = Some((i, bucket.len())),
        }
    }
    largest.map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| Rgb([(x * 16) as u8, (y * 16) as u8, 0]))
    }

    #[test]
    fn test_returns_at_most_requested_colors() {
        let img = gradient(16, 16);
        let palette = quantize(&img, 16).unwrap();
        assert_eq!(palette.len(), 16);
    }

    #[test]
    fn test_fewer_unique_colors_than_requested() {
        let mut img = RgbImage::new(2, 2);
        img.put_pixel(0, 0, Rgb([255, 0, 0]));
        img.put_pixel(0, 1, Rgb([0, 255, 0]));
        img.put_pixel(1, 0, Rgb([0, 0, 255]));
        img.put_pixel(1, 1, Rgb([255, 255, 0]));

        let palette = quantize(&img, 8).unwrap();
        assert_eq!(palette.len(), 4);
        for c in [
            Color::new(255, 0, 0),
            Color::new(0, 255, 0),
            Color::new(0, 0, 255),
            Color::new(255, 255, 0),
        ] {
            assert!(palette.contains(&c), "missing {:?}", c);
        }
    }

    #[test]
    fn test_seeded_palette_is_rejected() {
        let img = RgbImage::new(1, 1);
        let result = MedianCut::new(4)
            .unwrap()
            .quantize(&[Color::new(0, 0, 0)], &img);
        assert!(matches!(result, Err(SixelError::InvalidArgument(_))));
    }

    #[test]
    fn test_max_colors_range() {
        assert!(matches!(MedianCut::new(0), Err(SixelError::InvalidArgument(_))));
        assert!(matches!(MedianCut::new(257), Err(SixelError::InvalidArgument(_))));
        assert!(MedianCut::new(1).is_ok());
        assert!(MedianCut::new(256).is_ok());
    }

    #[test]
    fn test_single_color_palette_is_mean() {
        let mut set = ColorSet::new();
        set.insert(Color::new(0, 10, 100));
        set.insert(Color::new(3, 20, 200));
        set.insert(Color::new(6, 31, 0));
        let palette = MedianCut::new(1).unwrap().quantize_colors(set).unwrap();
        assert_eq!(palette, vec![Color::new(3, 20, 100)]);
    }

    #[test]
    fn test_longest_axis_prefers_earlier_on_ties() {
        let bucket = Bucket(vec![Color::new(0, 0, 0), Color::new(10, 10, 10)]);
        assert_eq!(bucket.longest_axis(), Axis::Red);

        let bucket = Bucket(vec![Color::new(0, 5, 0), Color::new(10, 50, 20)]);
        assert_eq!(bucket.longest_axis(), Axis::Green);

        let bucket = Bucket(vec![Color::new(7, 7, 0), Color::new(7, 7, 1)]);
        assert_eq!(bucket.longest_axis(), Axis::Blue);
    }

    #[test]
    fn test_split_halves_along_longest_axis() {
        let bucket = Bucket(vec![
            Color::new(0, 200, 0),
            Color::new(0, 10, 0),
            Color::new(0, 100, 0),
            Color::new(0, 50, 0),
            Color::new(0, 150, 0),
        ]);
        let (lower, upper) = bucket.split();
        let upper = upper.unwrap();
        assert_eq!(lower.0, vec![Color::new(0, 10, 0), Color::new(0, 50, 0)]);
        assert_eq!(
            upper.0,
            vec![
                Color::new(0, 100, 0),
                Color::new(0, 150, 0),
                Color::new(0, 200, 0)
            ]
        );
    }

    #[test]
    fn test_split_of_singleton_has_no_upper_half() {
        let (lower, upper) = Bucket(vec![Color::new(1, 2, 3)]).split();
        assert_eq!(lower.len(), 1);
        assert!(upper.is_none());
    }

    #[test]
    fn test_empty_bucket_average_is_internal() {
        assert!(matches!(
            Bucket::default().average(),
            Err(SixelError::Internal(_))
        ));
    }

    #[test]
    fn test_largest_bucket_first_wins() {
        let buckets = vec![
            Bucket(vec![Color::default(); 2]),
            Bucket(vec![Color::default(); 3]),
            Bucket(vec![Color::default(); 3]),
        ];
        assert_eq!(largest_bucket(&buckets), Some(1));
        assert_eq!(largest_bucket(&[]), None);
        assert_eq!(largest_bucket(&[Bucket::default()]), None);
    }

    #[test]
    fn test_quantize_is_deterministic() {
        let img = RgbImage::from_fn(40, 30, |x, y| {
            Rgb([(x * 6) as u8, (y * 8) as u8, ((x + y) * 3) as u8])
        });
        let a = quantize(&img, 32).unwrap();
        let b = quantize(&img, 32).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
    }
}
