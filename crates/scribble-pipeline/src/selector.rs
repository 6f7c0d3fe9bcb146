//! Greedy stroke selection.
//!
//! Each step samples a batch of candidates, scores every one by the mean
//! residue under its footprint, and commits the best: its footprint is
//! subtracted from the residue. Scoring by mean rather than sum favors
//! strokes that lie entirely on dark regions over long strokes that
//! merely cross them.

use image::GrayImage;

use crate::kernel::{KernelFactory, KernelInstance};
use crate::render::render_mask;
use crate::residue::ResidueBuffer;

/// Pick the best of `num_attempts` candidates and subtract it from
/// `residue`.
///
/// Footprints are rendered at `intensity`, which is also the amount
/// subtracted per covered pixel. Ties keep the earliest candidate.
/// Returns `None` only when `num_attempts` is zero, in which case the
/// residue is untouched.
pub fn select_and_apply<F: KernelFactory>(
    factory: &mut F,
    residue: &mut ResidueBuffer,
    num_attempts: usize,
    intensity: u8,
    attachment: Option<&F::Attachment>,
) -> Option<KernelInstance<F::Attachment>> {
    let (width, height) = (residue.width(), residue.height());
    let mut mask = GrayImage::new(width, height);
    let mut best_mask = GrayImage::new(width, height);
    let mut best: Option<(f64, KernelInstance<F::Attachment>)> = None;

    for _ in 0..num_attempts {
        let instance = factory.create_instance(attachment);

        mask.fill(0);
        render_mask(&mut mask, instance.shape.as_ref(), intensity);
        let score = residue.mean_under(&mask);

        if best.as_ref().is_none_or(|(best_score, _)| score > *best_score) {
            std::mem::swap(&mut mask, &mut best_mask);
            best = Some((score, instance));
        }
    }

    let (_, instance) = best?;
    residue.subtract(&best_mask);
    Some(instance)
}
