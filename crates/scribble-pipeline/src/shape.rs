//! Composite stroke shapes.
//!
//! A [`MultiCurve`] is a sequence of pen-down curves, with pen-up travel
//! between them. Every accepted stroke is a `MultiCurve`, and so is the
//! final result: strokes are wrapped ([`SingleCurve`]), moved into
//! preview space ([`TransformedCurve`]) and chained ([`ConcatCurve`])
//! without copying their geometry.

use std::fmt;
use std::sync::Arc;

use crate::curve::Curve;
use crate::types::{Bounds, Point, Polyline};

/// Vertex spacing used when flattening curves that are not polylines.
pub const FLATTEN_STEP: f64 = 1.0;

/// A shared, immutable stroke shape.
pub type Stroke = Arc<dyn MultiCurve>;

/// A drawable sequence of curves.
pub trait MultiCurve: fmt::Debug + Send + Sync {
    /// Pen-down paths in drawing order.
    fn paths(&self) -> Vec<Polyline>;

    /// Bounding box of every path, or `None` for an empty shape.
    fn bounds(&self) -> Option<Bounds>;

    /// Total pen-down travel.
    fn total_time(&self) -> f64 {
        self.paths().iter().map(Polyline::length).sum()
    }
}

/// A single curve viewed as a one-path [`MultiCurve`].
#[derive(Debug, Clone)]
pub struct SingleCurve<C>(pub C);

impl<C: Curve> MultiCurve for SingleCurve<C> {
    fn paths(&self) -> Vec<Polyline> {
        vec![self.0.to_polyline(FLATTEN_STEP)]
    }

    fn bounds(&self) -> Option<Bounds> {
        Some(self.0.bounds())
    }

    fn total_time(&self) -> f64 {
        self.0.total_time()
    }
}

/// Several shapes drawn one after another.
#[derive(Debug, Clone, Default)]
pub struct ConcatCurve {
    parts: Vec<Stroke>,
}

impl ConcatCurve {
    /// Chain `parts`, drawn in the given order.
    #[must_use]
    pub const fn new(parts: Vec<Stroke>) -> Self {
        Self { parts }
    }

    /// The concatenated shapes, in drawing order.
    #[must_use]
    pub fn parts(&self) -> &[Stroke] {
        &self.parts
    }

    /// Whether there is nothing to draw.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Number of chained shapes, not paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.parts.len()
    }
}

impl MultiCurve for ConcatCurve {
    fn paths(&self) -> Vec<Polyline> {
        self.parts.iter().flat_map(|p| p.paths()).collect()
    }

    fn bounds(&self) -> Option<Bounds> {
        self.parts
            .iter()
            .filter_map(|p| p.bounds())
            .reduce(Bounds::union)
    }

    fn total_time(&self) -> f64 {
        self.parts.iter().map(|p| p.total_time()).sum()
    }
}

/// A shape scaled about the origin and then offset.
#[derive(Debug, Clone)]
pub struct TransformedCurve {
    inner: Stroke,
    offset: Point,
    scale: f64,
}

impl TransformedCurve {
    /// Map every point `p` of `inner` to `p * scale + offset`.
    ///
    /// A negative `scale` mirrors the shape; bounds stay ordered.
    #[must_use]
    pub const fn new(inner: Stroke, offset: Point, scale: f64) -> Self {
        Self {
            inner,
            offset,
            scale,
        }
    }

    fn apply(&self, p: Point) -> Point {
        Point::new(
            p.x.mul_add(self.scale, self.offset.x),
            p.y.mul_add(self.scale, self.offset.y),
        )
    }
}

impl MultiCurve for TransformedCurve {
    fn paths(&self) -> Vec<Polyline> {
        self.inner
            .paths()
            .into_iter()
            .map(|pl| Polyline::new(pl.points().iter().map(|&p| self.apply(p)).collect()))
            .collect()
    }

    fn bounds(&self) -> Option<Bounds> {
        // A negative scale swaps min and max, so rebuild from both corners.
        self.inner.bounds().map(|b| {
            Bounds::at(self.apply(Point::new(b.min_x, b.min_y)))
                .including(self.apply(Point::new(b.max_x, b.max_y)))
        })
    }

    fn total_time(&self) -> f64 {
        self.inner.total_time() * self.scale.abs()
    }
}
