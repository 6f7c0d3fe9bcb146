//! The residue buffer: ink that no accepted stroke has covered yet.
//!
//! Values are signed 32-bit so the rescaled ink (up to
//! `blur * gray_resolution`) fits without clipping at any usable blur,
//! and never drop below zero: subtraction saturates.

use image::GrayImage;

use crate::resample::resize_area;
use crate::types::Dimensions;

/// Mutable ink grid at residue resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResidueBuffer {
    dimensions: Dimensions,
    data: Vec<i32>,
    gray_resolution: u16,
}

impl ResidueBuffer {
    /// Build the residue for `blur` from the source image.
    ///
    /// The source is area-resampled so its width becomes
    /// `preview_width / blur`, inverted so dark pixels hold ink, and
    /// rescaled so full black equals `blur * gray_resolution`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_source(
        source: &GrayImage,
        preview_width: u32,
        blur: f32,
        gray_resolution: u16,
    ) -> Self {
        let scale = f64::from(preview_width) / f64::from(blur) / f64::from(source.width());
        let resampled = resize_area(source, scale);
        let full_scale = f64::from(blur) * f64::from(gray_resolution);
        let data = resampled
            .pixels()
            .map(|p| {
                let ink = f64::from(255 - p.0[0]);
                (ink * full_scale / 255.0)
                    .round()
                    .clamp(0.0, f64::from(i32::MAX)) as i32
            })
            .collect();
        Self {
            dimensions: Dimensions::of(&resampled),
            data,
            gray_resolution,
        }
    }

    /// Residue resolution, which is also the kernel canvas.
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Width in residue pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.dimensions.width
    }

    /// Height in residue pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.dimensions.height
    }

    /// Ink at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinates are outside the buffer.
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> i32 {
        self.data[self.index(x, y)]
    }

    /// Raw values in row-major order.
    #[must_use]
    pub fn as_raw(&self) -> &[i32] {
        &self.data
    }

    /// Sum of every value.
    #[must_use]
    pub fn sum(&self) -> i64 {
        self.data.iter().map(|&v| i64::from(v)).sum()
    }

    /// Mean ink per pixel, normalized by the per-pixel full-scale value.
    ///
    /// An all-black source rebuilt at blur `b` has darkness `b`; an
    /// all-white one has darkness 0.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn darkness(&self) -> f32 {
        let pixels = self.dimensions.pixel_count();
        if pixels == 0 {
            return 0.0;
        }
        (self.sum() as f64 / pixels as f64 / f64::from(self.gray_resolution)) as f32
    }

    /// Mean residue over the pixels where `mask` is non-zero.
    ///
    /// Pixels outside the footprint contribute nothing. An empty
    /// footprint scores 0.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn mean_under(&self, mask: &GrayImage) -> f64 {
        debug_assert_eq!(Dimensions::of(mask), self.dimensions);
        let (total, count) = self
            .data
            .iter()
            .zip(mask.as_raw())
            .filter(|&(_, &m)| m != 0)
            .fold((0i64, 0u64), |(t, c), (&v, _)| (t + i64::from(v), c + 1));
        if count == 0 {
            0.0
        } else {
            total as f64 / count as f64
        }
    }

    /// Subtract `mask` in place, saturating at zero.
    pub fn subtract(&mut self, mask: &GrayImage) {
        debug_assert_eq!(Dimensions::of(mask), self.dimensions);
        for (v, &m) in self.data.iter_mut().zip(mask.as_raw()) {
            if m != 0 {
                *v = v.saturating_sub(i32::from(m)).max(0);
            }
        }
    }

    fn index(&self, x: u32, y: u32) -> usize {
        assert!(
            x < self.dimensions.width && y < self.dimensions.height,
            "({x}, {y}) outside {}x{} residue",
            self.dimensions.width,
            self.dimensions.height,
        );
        (y as usize) * (self.dimensions.width as usize) + x as usize
    }
}
