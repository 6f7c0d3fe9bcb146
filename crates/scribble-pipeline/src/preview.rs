//! Preview frames, comparison thumbnails, and the composite result.
//!
//! Strokes live in residue space, which is `blur` times coarser than
//! the preview. Everything here maps them back up by scaling with
//! `blur` before drawing or concatenating.

use std::sync::Arc;

use image::{GrayImage, Luma};

use crate::raster::{add_saturating, gaussian_blur, side_by_side};
use crate::render::draw_strokes;
use crate::shape::{ConcatCurve, MultiCurve, Stroke, TransformedCurve};
use crate::strokes::StrokeSet;
use crate::types::{Dimensions, Point};

/// Simulated raster preview: the preview image blurred by `blur` and
/// brightened by `threshold * 255`.
#[must_use]
pub fn raster_preview(preview: &GrayImage, blur: f32, threshold: f32) -> GrayImage {
    let blurred = gaussian_blur(preview, blur);
    add_saturating(&blurred, threshold * 255.0)
}

/// Strokes above `threshold` drawn black on white at preview size.
///
/// Line width equals `blur`, so each stroke covers roughly the preview
/// area of the residue pixels it was subtracted from.
#[must_use]
pub fn vector_preview<A>(
    dimensions: Dimensions,
    strokes: &StrokeSet<A>,
    blur: f32,
    threshold: f32,
) -> GrayImage {
    let mut canvas = GrayImage::from_pixel(dimensions.width, dimensions.height, Luma([255]));
    let shapes: Vec<Stroke> = strokes
        .above(threshold)
        .map(|r| to_preview_space(&r.shape, blur))
        .collect();
    draw_strokes(
        &mut canvas,
        shapes.iter().map(|s| -> &dyn MultiCurve { s.as_ref() }),
        blur,
    );
    canvas
}

/// Preview image on the left, vector rendering on the right.
#[must_use]
pub fn thumbnail(preview: &GrayImage, vector: &GrayImage) -> GrayImage {
    side_by_side(preview, vector)
}

/// Every stroke above `threshold`, in key order and preview space,
/// joined into one shape.
#[must_use]
pub fn composite<A>(strokes: &StrokeSet<A>, blur: f32, threshold: f32) -> ConcatCurve {
    ConcatCurve::new(
        strokes
            .above(threshold)
            .map(|r| to_preview_space(&r.shape, blur))
            .collect(),
    )
}

/// Scale a residue-space stroke up to preview space.
#[must_use]
pub fn to_preview_space(shape: &Stroke, blur: f32) -> Stroke {
    Arc::new(TransformedCurve::new(
        Arc::clone(shape),
        Point::new(0.0, 0.0),
        f64::from(blur),
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::curve::PointsCurve;
    use crate::shape::SingleCurve;
    use crate::strokes::StrokeRecord;

    fn horizontal(y: f64) -> StrokeRecord<()> {
        StrokeRecord {
            shape: Arc::new(SingleCurve(PointsCurve::line(
                Point::new(1.0, y),
                Point::new(9.0, y),
            ))),
            attachment: (),
        }
    }

    fn dims(width: u32, height: u32) -> Dimensions {
        Dimensions { width, height }
    }

    #[test]
    fn raster_preview_brightens_by_threshold() {
        let preview = GrayImage::from_pixel(16, 16, Luma([100]));
        let out = raster_preview(&preview, 1.0, 0.2);
        // Uniform input stays uniform under blur; 100 + 51 = 151.
        assert!(
            out.pixels().all(|p| (150..=152).contains(&p.0[0])),
            "{:?}",
            out.get_pixel(8, 8)
        );
    }

    #[test]
    fn raster_preview_saturates_at_white() {
        let preview = GrayImage::from_pixel(8, 8, Luma([240]));
        let out = raster_preview(&preview, 2.0, 0.5);
        assert!(out.pixels().all(|p| p.0[0] == 255));
    }

    #[test]
    fn vector_preview_without_strokes_is_white() {
        let set = StrokeSet::<()>::new();
        let out = vector_preview(dims(20, 20), &set, 2.0, 0.0);
        assert!(out.pixels().all(|p| p.0[0] == 255));
    }

    #[test]
    fn vector_preview_scales_strokes_by_blur() {
        let mut set = StrokeSet::new();
        set.insert(0.5, horizontal(5.0));
        let out = vector_preview(dims(40, 40), &set, 2.0, 0.1);
        // Residue row 5 lands on preview row 10.
        assert!(out.get_pixel(10, 10).0[0] < 128);
        assert_eq!(out.get_pixel(10, 30).0[0], 255);
    }

    #[test]
    fn vector_preview_skips_strokes_at_or_below_threshold() {
        let mut set = StrokeSet::new();
        set.insert(0.5, horizontal(2.0));
        set.insert(0.3, horizontal(8.0));
        let out = vector_preview(dims(40, 40), &set, 2.0, 0.3);
        assert!(out.get_pixel(10, 4).0[0] < 128);
        assert_eq!(out.get_pixel(10, 16).0[0], 255);
    }

    #[test]
    fn composite_keeps_strokes_above_threshold_in_preview_space() {
        let mut set = StrokeSet::new();
        set.insert(0.9, horizontal(1.0));
        set.insert(0.6, horizontal(2.0));
        set.insert(0.2, horizontal(3.0));
        let curve = composite(&set, 3.0, 0.5);
        assert_eq!(curve.len(), 2);
        let b = curve.bounds().unwrap();
        assert_eq!(b.to_array(), [3.0, 3.0, 27.0, 6.0]);
        assert!((curve.total_time() - 48.0).abs() < 1e-9);
    }

    #[test]
    fn thumbnail_is_double_width() {
        let left = GrayImage::from_pixel(10, 6, Luma([0]));
        let right = GrayImage::from_pixel(10, 6, Luma([255]));
        let t = thumbnail(&left, &right);
        assert_eq!(t.dimensions(), (20, 6));
        assert_eq!(t.get_pixel(9, 0).0[0], 0);
        assert_eq!(t.get_pixel(10, 0).0[0], 255);
    }
}
