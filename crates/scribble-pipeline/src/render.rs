//! Stroke rasterization.
//!
//! Two renderers with different jobs:
//!
//! - [`render_mask`] paints hard 1-pixel footprints with
//!   `imageproc`'s line drawing. The selector scores and subtracts
//!   these, so every covered pixel must carry exactly the mask
//!   intensity.
//! - [`draw_strokes`] paints anti-aliased, round-capped strokes of any
//!   width with `tiny-skia`, for preview frames and thumbnails.

use image::{GrayImage, Luma};
use imageproc::drawing::draw_line_segment_mut;
use tiny_skia::{LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform};

use crate::shape::MultiCurve;
use crate::types::Polyline;

/// Paint the footprint of `shape` into `mask` at `intensity`.
///
/// Pixels already set are overwritten, never accumulated. The caller is
/// responsible for clearing the mask beforehand.
#[allow(clippy::cast_possible_truncation)]
pub fn render_mask(mask: &mut GrayImage, shape: &dyn MultiCurve, intensity: u8) {
    let color = Luma([intensity]);
    for path in shape.paths() {
        let points = path.points();
        if let [only] = points {
            let p = (only.x as f32, only.y as f32);
            draw_line_segment_mut(mask, p, p, color);
        }
        for w in points.windows(2) {
            draw_line_segment_mut(
                mask,
                (w[0].x as f32, w[0].y as f32),
                (w[1].x as f32, w[1].y as f32),
                color,
            );
        }
    }
}

/// Draw `shapes` in black over `canvas` with the given line width.
///
/// Coverage is composited over the existing pixels, so drawing onto a
/// white canvas produces gray anti-aliased edges.
#[allow(clippy::cast_possible_truncation, clippy::cast_lossless)]
pub fn draw_strokes<'a, I>(canvas: &mut GrayImage, shapes: I, line_width: f32)
where
    I: IntoIterator<Item = &'a dyn MultiCurve>,
{
    let mut pb = PathBuilder::new();
    for shape in shapes {
        for path in shape.paths() {
            append_polyline(&mut pb, &path);
        }
    }

    // Nothing to draw.
    let Some(path) = pb.finish() else {
        return;
    };
    let Some(mut pixmap) = Pixmap::new(canvas.width(), canvas.height()) else {
        return;
    };

    let stroke = Stroke {
        width: line_width,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Stroke::default()
    };
    let mut paint = Paint::default();
    paint.set_color_rgba8(0, 0, 0, 255);
    paint.anti_alias = true;

    pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);

    // Black over gray: out = gray * (1 - alpha).
    let data = pixmap.data();
    for (i, pixel) in canvas.pixels_mut().enumerate() {
        let alpha = u16::from(data[i * 4 + 3]);
        if alpha > 0 {
            let v = u16::from(pixel.0[0]) * (255 - alpha) / 255;
            pixel.0[0] = v as u8;
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn append_polyline(pb: &mut PathBuilder, polyline: &Polyline) {
    let points = polyline.points();
    let Some(first) = points.first() else {
        return;
    };
    pb.move_to(first.x as f32, first.y as f32);
    if points.len() == 1 {
        // A lone point still leaves a round dot.
        pb.line_to(first.x as f32, first.y as f32);
    }
    for p in &points[1..] {
        pb.line_to(p.x as f32, p.y as f32);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::PointsCurve;
    use crate::shape::SingleCurve;
    use crate::types::Point;

    fn horizontal(y: f64, x0: f64, x1: f64) -> SingleCurve<PointsCurve> {
        SingleCurve(PointsCurve::line(Point::new(x0, y), Point::new(x1, y)))
    }

    #[test]
    fn mask_covers_line_pixels_with_intensity() {
        let mut mask = GrayImage::new(10, 5);
        render_mask(&mut mask, &horizontal(2.0, 1.0, 8.0), 128);
        for x in 2..=7 {
            assert_eq!(mask.get_pixel(x, 2).0[0], 128, "pixel ({x}, 2)");
        }
        assert_eq!(mask.get_pixel(0, 2).0[0], 0);
        assert_eq!(mask.get_pixel(9, 2).0[0], 0);
        assert!((0..10).all(|x| mask.get_pixel(x, 0).0[0] == 0));
    }

    #[test]
    fn mask_overlap_does_not_accumulate() {
        let mut mask = GrayImage::new(10, 5);
        render_mask(&mut mask, &horizontal(2.0, 1.0, 8.0), 100);
        render_mask(&mut mask, &horizontal(2.0, 3.0, 5.0), 100);
        assert_eq!(mask.get_pixel(4, 2).0[0], 100);
    }

    #[test]
    fn mask_ignores_out_of_bounds_parts() {
        let mut mask = GrayImage::new(4, 4);
        render_mask(&mut mask, &horizontal(1.0, -10.0, 20.0), 50);
        assert!((0..4).all(|x| mask.get_pixel(x, 1).0[0] == 50));
    }

    #[test]
    fn strokes_darken_white_canvas() {
        let mut canvas = GrayImage::from_pixel(20, 20, Luma([255]));
        let line = horizontal(10.0, 2.0, 18.0);
        draw_strokes(&mut canvas, [&line as &dyn MultiCurve], 3.0);
        assert!(canvas.get_pixel(10, 10).0[0] < 50);
        assert_eq!(canvas.get_pixel(10, 2).0[0], 255);
    }

    #[test]
    fn no_strokes_leaves_canvas_untouched() {
        let mut canvas = GrayImage::from_pixel(8, 8, Luma([255]));
        draw_strokes(&mut canvas, std::iter::empty(), 2.0);
        assert!(canvas.pixels().all(|p| p.0[0] == 255));
    }
}
