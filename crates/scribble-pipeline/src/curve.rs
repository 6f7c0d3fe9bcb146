//! Arc-length parameterized curves.
//!
//! A [`Curve`] is traversed by "time", where one unit of time is one
//! pixel of pen travel. [`PointsCurve`] is the polyline implementation
//! used for every stroke the engine produces.
//!
//! Sequential playback goes through a [`Playback`] session. The session
//! owns a forward-only cursor, so a plotter streaming positions at
//! increasing times pays amortized O(1) per query. Random access is
//! available through [`Curve::position_at`], which binary-searches a
//! cumulative length table built once at construction.
//!
//! # Persisted format
//!
//! [`PointsCurve::write_to`] emits a big-endian `i32` point count
//! followed by that many `(x, y)` pairs of big-endian `f64`.

use std::fmt;
use std::io::{self, Read, Write};

use crate::types::{Bounds, Point, Polyline};

/// Errors raised when building or reading a curve.
#[derive(Debug, thiserror::Error)]
pub enum CurveError {
    /// A curve needs at least a start and an end.
    #[error("a curve needs at least 2 points, got {0}")]
    TooFewPoints(usize),

    /// Reading or writing the persisted form failed.
    #[error("curve I/O failed: {0}")]
    Io(#[from] io::Error),
}

/// A path parameterized by travel time.
pub trait Curve: fmt::Debug + Send + Sync {
    /// Time needed to traverse the whole curve.
    fn total_time(&self) -> f64;

    /// Position at `time`, clamped to the curve's start and end.
    fn position_at(&self, time: f64) -> Point;

    /// Axis-aligned bounding box of the curve.
    fn bounds(&self) -> Bounds;

    /// Polyline approximation used for rendering, with vertices no more
    /// than `step` time units apart.
    fn to_polyline(&self, step: f64) -> Polyline {
        let total = self.total_time();
        let step = if step > 0.0 { step } else { 1.0 };
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let n = (total / step).ceil().max(1.0) as usize;
        #[allow(clippy::cast_precision_loss)]
        let points = (0..=n)
            .map(|i| self.position_at(total * i as f64 / n as f64))
            .collect();
        Polyline::new(points)
    }
}

/// A polyline traversed at unit speed.
#[derive(Debug, Clone, PartialEq)]
pub struct PointsCurve {
    points: Vec<Point>,
    /// `cumulative[i]` is the arc length from the start to `points[i]`.
    cumulative: Vec<f64>,
    bounds: Bounds,
}

impl PointsCurve {
    /// Build a curve through `points` in order.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::TooFewPoints`] if fewer than 2 points are
    /// given.
    pub fn new(points: Vec<Point>) -> Result<Self, CurveError> {
        let (&first, rest) = match points.split_first() {
            Some(split) if points.len() >= 2 => split,
            _ => return Err(CurveError::TooFewPoints(points.len())),
        };

        let mut cumulative = Vec::with_capacity(points.len());
        cumulative.push(0.0);
        let mut length = 0.0;
        let mut bounds = Bounds::at(first);
        let mut prev = first;
        for &p in rest {
            length += prev.distance(p);
            cumulative.push(length);
            bounds = bounds.including(p);
            prev = p;
        }

        Ok(Self {
            points,
            cumulative,
            bounds,
        })
    }

    /// A straight segment from `from` to `to`.
    #[must_use]
    pub fn line(from: Point, to: Point) -> Self {
        let length = from.distance(to);
        Self {
            points: vec![from, to],
            cumulative: vec![0.0, length],
            bounds: Bounds::at(from).including(to),
        }
    }

    /// The vertices, in order.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// First vertex.
    #[must_use]
    pub fn start(&self) -> Point {
        self.points[0]
    }

    /// Last vertex.
    #[must_use]
    pub fn end(&self) -> Point {
        self.points[self.points.len() - 1]
    }

    /// Start a sequential playback session at time zero.
    #[must_use]
    pub const fn playback(&self) -> Playback<'_> {
        Playback {
            curve: self,
            index: 0,
            time_at_index: 0.0,
        }
    }

    /// Serialize in the persisted point-list format.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::Io`] if the writer fails.
    pub fn write_to<W: Write>(&self, out: &mut W) -> Result<(), CurveError> {
        let count = i32::try_from(self.points.len()).map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidInput, "too many points to persist")
        })?;
        out.write_all(&count.to_be_bytes())?;
        for p in &self.points {
            out.write_all(&p.x.to_be_bytes())?;
            out.write_all(&p.y.to_be_bytes())?;
        }
        Ok(())
    }

    /// Read a curve written by [`write_to`](Self::write_to).
    ///
    /// Length and bounds are recomputed from the points.
    ///
    /// # Errors
    ///
    /// Returns [`CurveError::Io`] on a short or failing read, and
    /// [`CurveError::TooFewPoints`] if the stored count is below 2.
    pub fn read_from<R: Read>(input: &mut R) -> Result<Self, CurveError> {
        let count = i32::from_be_bytes(read_array(input)?);
        let count = usize::try_from(count).map_err(|_| CurveError::TooFewPoints(0))?;
        if count < 2 {
            return Err(CurveError::TooFewPoints(count));
        }
        let mut points = Vec::with_capacity(count);
        for _ in 0..count {
            let x = f64::from_be_bytes(read_array(input)?);
            let y = f64::from_be_bytes(read_array(input)?);
            points.push(Point::new(x, y));
        }
        Self::new(points)
    }
}

fn read_array<R: Read, const N: usize>(input: &mut R) -> io::Result<[u8; N]> {
    let mut buf = [0u8; N];
    input.read_exact(&mut buf)?;
    Ok(buf)
}

impl Curve for PointsCurve {
    fn total_time(&self) -> f64 {
        self.cumulative[self.cumulative.len() - 1]
    }

    fn position_at(&self, time: f64) -> Point {
        if time.is_nan() || time <= 0.0 {
            return self.start();
        }
        if time >= self.total_time() {
            return self.end();
        }
        // Index of the first vertex strictly beyond `time`; the segment
        // ending there contains `time`.
        let next = self.cumulative.partition_point(|&c| c <= time);
        let i = next - 1;
        let seg = self.cumulative[next] - self.cumulative[i];
        if seg <= 0.0 {
            return self.points[i];
        }
        self.points[i].lerp(self.points[next], (time - self.cumulative[i]) / seg)
    }

    fn bounds(&self) -> Bounds {
        self.bounds
    }

    fn to_polyline(&self, _step: f64) -> Polyline {
        Polyline::new(self.points.clone())
    }
}

/// Sequential reader over a [`PointsCurve`].
///
/// Queries must come in non-decreasing time order. The cursor only ever
/// moves forward, so an earlier time than the previous query returns a
/// point at or after the cursor rather than the true position. Create a
/// new session with [`PointsCurve::playback`] to replay from the start.
#[derive(Debug, Clone)]
pub struct Playback<'a> {
    curve: &'a PointsCurve,
    index: usize,
    time_at_index: f64,
}

impl Playback<'_> {
    /// Position at `time`, advancing the cursor as needed.
    pub fn position_at(&mut self, time: f64) -> Point {
        let points = &self.curve.points;
        if time.is_nan() || time < 0.0 {
            return points[0];
        }
        let mut from_current = time - self.time_at_index;
        loop {
            if self.index == points.len() - 1 {
                return points[self.index];
            }
            let a = points[self.index];
            let b = points[self.index + 1];
            let to_next = a.distance(b);
            if to_next > from_current {
                return a.lerp(b, from_current.max(0.0) / to_next);
            }
            from_current -= to_next;
            self.time_at_index += to_next;
            self.index += 1;
        }
    }

    /// Total time of the underlying curve.
    #[must_use]
    pub fn total_time(&self) -> f64 {
        self.curve.total_time()
    }
}
