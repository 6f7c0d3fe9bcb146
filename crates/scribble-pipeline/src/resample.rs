//! Area-averaging resize.
//!
//! Each output pixel is the coverage-weighted mean of the source pixels
//! its footprint overlaps. When shrinking this is a box filter with
//! exact fractional edges, which keeps the total ink of the image: a
//! uniform image stays uniform at any scale, and the mean brightness is
//! preserved. Enlarging degrades gracefully to a blocky interpolation.
//!
//! The filter is separable, so rows are resampled first and then
//! columns.

use image::{GrayImage, Luma};

use crate::types::Dimensions;

/// Output dimensions for scaling `source` by `scale`, rounded to the
/// nearest pixel and never smaller than 1x1.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn scaled_dimensions(source: Dimensions, scale: f64) -> Dimensions {
    let scale_axis = |n: u32| ((f64::from(n) * scale).round() as u32).max(1);
    Dimensions {
        width: scale_axis(source.width),
        height: scale_axis(source.height),
    }
}

/// Resize `image` by `scale` with area interpolation.
#[must_use = "returns the resized image"]
pub fn resize_area(image: &GrayImage, scale: f64) -> GrayImage {
    let target = scaled_dimensions(Dimensions::of(image), scale);
    resize_area_to(image, target)
}

/// Resize `image` to exactly `target` with area interpolation.
#[must_use = "returns the resized image"]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn resize_area_to(image: &GrayImage, target: Dimensions) -> GrayImage {
    let (src_w, src_h) = image.dimensions();
    if (src_w, src_h) == (target.width, target.height) {
        return image.clone();
    }
    if src_w == 0 || src_h == 0 {
        return GrayImage::new(target.width, target.height);
    }

    let x_weights = axis_weights(src_w, target.width);
    let y_weights = axis_weights(src_h, target.height);

    // Horizontal pass: src_h rows of target.width samples.
    let mut rows = vec![0.0_f32; (target.width * src_h) as usize];
    for y in 0..src_h {
        let row_out = &mut rows[(y * target.width) as usize..((y + 1) * target.width) as usize];
        for (out, taps) in row_out.iter_mut().zip(&x_weights) {
            *out = taps
                .iter()
                .map(|&(x, w)| f32::from(image.get_pixel(x, y).0[0]) * w)
                .sum();
        }
    }

    // Vertical pass.
    GrayImage::from_fn(target.width, target.height, |x, y| {
        let v: f32 = y_weights[y as usize]
            .iter()
            .map(|&(sy, w)| rows[(sy * target.width + x) as usize] * w)
            .sum();
        Luma([v.round().clamp(0.0, 255.0) as u8])
    })
}

/// For each output index, the source indices it overlaps and their
/// normalized weights.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn axis_weights(src: u32, dst: u32) -> Vec<Vec<(u32, f32)>> {
    let ratio = f64::from(src) / f64::from(dst);
    (0..dst)
        .map(|i| {
            let start = f64::from(i) * ratio;
            let end = (f64::from(i) + 1.0) * ratio;
            let first = start.floor() as u32;
            let last = (end.ceil() as u32).min(src);
            let mut taps: Vec<(u32, f32)> = (first..last)
                .filter_map(|j| {
                    let lo = start.max(f64::from(j));
                    let hi = end.min(f64::from(j) + 1.0);
                    (hi > lo).then(|| (j, (hi - lo) as f32))
                })
                .collect();
            let total: f32 = taps.iter().map(|&(_, w)| w).sum();
            if total > 0.0 {
                for tap in &mut taps {
                    tap.1 /= total;
                }
            } else {
                taps = vec![(first.min(src - 1), 1.0)];
            }
            taps
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimensions_round_to_nearest() {
        let d = scaled_dimensions(
            Dimensions {
                width: 100,
                height: 75,
            },
            0.5,
        );
        assert_eq!((d.width, d.height), (50, 38));
    }

    #[test]
    fn dimensions_never_collapse_to_zero() {
        let d = scaled_dimensions(
            Dimensions {
                width: 10,
                height: 3,
            },
            0.01,
        );
        assert_eq!((d.width, d.height), (1, 1));
    }

    #[test]
    fn uniform_image_stays_uniform_when_shrinking() {
        let img = GrayImage::from_pixel(100, 60, Luma([77]));
        let small = resize_area(&img, 0.37);
        assert_eq!(small.dimensions(), (37, 22));
        assert!(small.pixels().all(|p| p.0[0] == 77));
    }

    #[test]
    fn uniform_image_stays_uniform_when_enlarging() {
        let img = GrayImage::from_pixel(10, 10, Luma([200]));
        let big = resize_area(&img, 4.5);
        assert_eq!(big.dimensions(), (45, 45));
        assert!(big.pixels().all(|p| p.0[0] == 200));
    }

    #[test]
    fn halving_averages_two_by_two_blocks() {
        let img = GrayImage::from_fn(4, 2, |x, y| match (x / 2, y) {
            (0, 0) => Luma([0]),
            (0, _) => Luma([100]),
            _ => Luma([255]),
        });
        let half = resize_area(&img, 0.5);
        assert_eq!(half.dimensions(), (2, 1));
        assert_eq!(half.get_pixel(0, 0).0[0], 50);
        assert_eq!(half.get_pixel(1, 0).0[0], 255);
    }

    #[test]
    fn fractional_footprint_weights_partial_pixels() {
        // Three source pixels into two: the middle pixel is split evenly.
        let img = GrayImage::from_fn(3, 1, |x, _| Luma([[0, 90, 180][x as usize]]));
        let out = resize_area_to(
            &img,
            Dimensions {
                width: 2,
                height: 1,
            },
        );
        // Left covers [0, 1.5): (0 * 1 + 90 * 0.5) / 1.5 = 30.
        assert_eq!(out.get_pixel(0, 0).0[0], 30);
        // Right covers [1.5, 3): (90 * 0.5 + 180 * 1) / 1.5 = 150.
        assert_eq!(out.get_pixel(1, 0).0[0], 150);
    }

    #[test]
    fn same_size_is_identity() {
        let img = GrayImage::from_fn(5, 4, |x, y| Luma([(x * 10 + y) as u8]));
        assert_eq!(resize_area(&img, 1.0), img);
    }
}
