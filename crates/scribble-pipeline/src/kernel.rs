//! Candidate stroke generation.
//!
//! A [`KernelFactory`] proposes random strokes inside the residue
//! bounds. Each proposal carries an attachment value the factory can use
//! to continue the next proposal from where this one ended. The
//! attachment type is owned by the factory; the selector and scheduler
//! only pass it back unopened.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::curve::PointsCurve;
use crate::shape::{SingleCurve, Stroke};
use crate::types::{Dimensions, Point};

/// A candidate stroke and the state needed to continue from it.
#[derive(Debug, Clone)]
pub struct KernelInstance<A> {
    /// The proposed stroke, in residue coordinates.
    pub shape: Stroke,
    /// Passed back to the factory to continue from this stroke.
    pub attachment: A,
}

/// Source of candidate strokes.
pub trait KernelFactory: Send {
    /// Factory-private continuation state.
    type Attachment: Clone + Send + Sync + std::fmt::Debug;

    /// Propose a stroke, continuing from `attachment` when given.
    fn create_instance(
        &mut self,
        attachment: Option<&Self::Attachment>,
    ) -> KernelInstance<Self::Attachment>;

    /// Restrict future candidates to a `dimensions`-sized canvas.
    fn set_dimensions(&mut self, dimensions: Dimensions);
}

/// Where the previous line ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineAttachment {
    /// End point of the previous segment.
    pub end: Point,
}

/// Proposes straight segments with uniformly random endpoints.
///
/// When `connected`, each segment starts at the end of the previous
/// one, so the accepted strokes form a single pen-down path.
#[derive(Debug)]
pub struct LineKernelFactory {
    connected: bool,
    dimensions: Dimensions,
    rng: StdRng,
}

impl LineKernelFactory {
    /// Factory seeded from OS entropy.
    #[must_use]
    pub fn new(connected: bool) -> Self {
        Self::from_rng(connected, StdRng::from_entropy())
    }

    /// Factory with a fixed seed, for reproducible runs.
    #[must_use]
    pub fn with_seed(connected: bool, seed: u64) -> Self {
        Self::from_rng(connected, StdRng::seed_from_u64(seed))
    }

    const fn from_rng(connected: bool, rng: StdRng) -> Self {
        Self {
            connected,
            dimensions: Dimensions {
                width: 1,
                height: 1,
            },
            rng,
        }
    }

    /// Whether segments continue from the previous end point.
    #[must_use]
    pub const fn connected(&self) -> bool {
        self.connected
    }

    fn random_point(&mut self) -> Point {
        let w = f64::from(self.dimensions.width);
        let h = f64::from(self.dimensions.height);
        Point::new(self.rng.gen_range(0.0..w), self.rng.gen_range(0.0..h))
    }
}

impl KernelFactory for LineKernelFactory {
    type Attachment = LineAttachment;

    fn create_instance(
        &mut self,
        attachment: Option<&LineAttachment>,
    ) -> KernelInstance<LineAttachment> {
        let start = match attachment {
            Some(a) if self.connected => a.end,
            _ => self.random_point(),
        };
        let end = self.random_point();
        KernelInstance {
            shape: Arc::new(SingleCurve(PointsCurve::line(start, end))),
            attachment: LineAttachment { end },
        }
    }

    fn set_dimensions(&mut self, dimensions: Dimensions) {
        self.dimensions = Dimensions {
            width: dimensions.width.max(1),
            height: dimensions.height.max(1),
        };
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn dims(width: u32, height: u32) -> Dimensions {
        Dimensions { width, height }
    }

    #[test]
    fn candidates_stay_inside_dimensions() {
        let mut factory = LineKernelFactory::with_seed(false, 7);
        factory.set_dimensions(dims(30, 12));
        for _ in 0..200 {
            let instance = factory.create_instance(None);
            let b = instance.shape.bounds().unwrap();
            assert!(b.min_x >= 0.0 && b.max_x < 30.0, "{b:?}");
            assert!(b.min_y >= 0.0 && b.max_y < 12.0, "{b:?}");
        }
    }

    #[test]
    fn connected_lines_start_at_attachment() {
        let mut factory = LineKernelFactory::with_seed(true, 1);
        factory.set_dimensions(dims(50, 50));
        let first = factory.create_instance(None);
        let second = factory.create_instance(Some(&first.attachment));
        let start = second.shape.paths()[0].points()[0];
        assert_eq!(start, first.attachment.end);
    }

    #[test]
    fn unconnected_lines_ignore_attachment() {
        let mut factory = LineKernelFactory::with_seed(false, 1);
        factory.set_dimensions(dims(50, 50));
        let anchor = LineAttachment {
            end: Point::new(-5.0, -5.0),
        };
        let instance = factory.create_instance(Some(&anchor));
        assert_ne!(instance.shape.paths()[0].points()[0], anchor.end);
    }

    #[test]
    fn same_seed_same_candidates() {
        let mut a = LineKernelFactory::with_seed(false, 99);
        let mut b = LineKernelFactory::with_seed(false, 99);
        a.set_dimensions(dims(64, 64));
        b.set_dimensions(dims(64, 64));
        for _ in 0..10 {
            assert_eq!(
                a.create_instance(None).attachment,
                b.create_instance(None).attachment
            );
        }
    }
}
