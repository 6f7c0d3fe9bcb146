//! Synchronous stroke-fitting engine.
//!
//! [`Engine`] owns everything one job mutates: the decoded source, its
//! preview-resolution copy, the residue buffer, the accepted strokes,
//! and the kernel factory. It performs one action per call and keeps no
//! notion of live parameters; the caller decides when to rebuild, when
//! to add strokes, and what to render.
//!
//! ```text
//! Engine::new ──► rebuild(blur) ──► add_stroke() ─┬─► render_preview(..)
//!                      ▲                 ▲        └─► build_result(..)
//!                      │                 └── while needs_more_strokes
//!                      └── blur changed
//! ```

use image::GrayImage;

use crate::kernel::KernelFactory;
use crate::preview::{composite, raster_preview, thumbnail, vector_preview};
use crate::raster::decode_grayscale;
use crate::resample::resize_area;
use crate::residue::ResidueBuffer;
use crate::selector::select_and_apply;
use crate::shape::ConcatCurve;
use crate::strokes::{StrokeRecord, StrokeSet};
use crate::types::{Dimensions, Mode, ScribbleConfig, ScribbleError};

/// Outcome of one accepted stroke.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeProgress {
    /// Residual darkness divided by blur, in `0.0..=1.0` for any source.
    pub darkness: f32,
    /// Strokes accepted since the last rebuild.
    pub strokes: usize,
}

/// The final drawing for one blur and threshold.
#[derive(Debug, Clone)]
pub struct ScribbleResult {
    /// Accepted strokes above the threshold, in preview space.
    pub curve: ConcatCurve,
    /// Preview image beside the vector rendering.
    pub thumbnail: GrayImage,
}

/// Greedy stroke fitting over one source image.
#[derive(Debug)]
pub struct Engine<F: KernelFactory> {
    config: ScribbleConfig,
    source: GrayImage,
    preview: GrayImage,
    residue: Option<ResidueBuffer>,
    blur: Option<f32>,
    strokes: StrokeSet<F::Attachment>,
    factory: F,
}

impl<F: KernelFactory> Engine<F> {
    /// Create an engine over an already decoded grayscale image.
    ///
    /// The preview copy is built here; the residue is not, so
    /// [`rebuild`](Self::rebuild) must run before strokes are added.
    ///
    /// # Errors
    ///
    /// Returns [`ScribbleError::InvalidConfig`] if `config` fails
    /// validation, or [`ScribbleError::EmptyImage`] if `source` has no
    /// pixels.
    pub fn new(
        source: GrayImage,
        config: ScribbleConfig,
        factory: F,
    ) -> Result<Self, ScribbleError> {
        config.validate()?;
        let Dimensions { width, height } = Dimensions::of(&source);
        if width == 0 || height == 0 {
            return Err(ScribbleError::EmptyImage { width, height });
        }

        let scale = f64::from(config.preview_width) / f64::from(width);
        let preview = resize_area(&source, scale);

        Ok(Self {
            config,
            source,
            preview,
            residue: None,
            blur: None,
            strokes: StrokeSet::new(),
            factory,
        })
    }

    /// Decode `bytes` and create an engine over the result.
    ///
    /// # Errors
    ///
    /// Returns any decode error from
    /// [`decode_grayscale`](crate::raster::decode_grayscale), or the
    /// errors of [`new`](Self::new).
    pub fn from_bytes(
        bytes: &[u8],
        config: ScribbleConfig,
        factory: F,
    ) -> Result<Self, ScribbleError> {
        let source = decode_grayscale(bytes)?;
        Self::new(source, config, factory)
    }

    /// The validated configuration.
    #[must_use]
    pub const fn config(&self) -> &ScribbleConfig {
        &self.config
    }

    /// The decoded source at full resolution.
    #[must_use]
    pub const fn source(&self) -> &GrayImage {
        &self.source
    }

    /// The source resized to the preview width.
    #[must_use]
    pub const fn preview(&self) -> &GrayImage {
        &self.preview
    }

    /// The residue, once [`rebuild`](Self::rebuild) has run.
    #[must_use]
    pub const fn residue(&self) -> Option<&ResidueBuffer> {
        self.residue.as_ref()
    }

    /// Strokes accepted since the last rebuild.
    #[must_use]
    pub const fn strokes(&self) -> &StrokeSet<F::Attachment> {
        &self.strokes
    }

    /// Blur the residue was last built for.
    #[must_use]
    pub const fn blur(&self) -> Option<f32> {
        self.blur
    }

    /// Whether the residue is missing or was built for another blur.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn needs_rebuild(&self, blur: f32) -> bool {
        self.residue.is_none() || self.blur != Some(blur)
    }

    /// Rebuild the residue for `blur`, dropping every accepted stroke.
    ///
    /// # Errors
    ///
    /// Returns [`ScribbleError::InvalidBlur`] unless `blur` is finite
    /// and positive. The engine is left unchanged in that case.
    pub fn rebuild(&mut self, blur: f32) -> Result<(), ScribbleError> {
        if !blur.is_finite() || blur <= 0.0 {
            return Err(ScribbleError::InvalidBlur(blur));
        }

        let residue = ResidueBuffer::from_source(
            &self.source,
            self.config.preview_width,
            blur,
            self.config.gray_resolution,
        );
        self.factory.set_dimensions(residue.dimensions());
        self.residue = Some(residue);
        self.blur = Some(blur);
        self.strokes.clear();
        Ok(())
    }

    /// Whether another stroke should be added at `threshold`.
    ///
    /// True while no stroke exists yet, or while the weakest stroke is
    /// still darker than `threshold` and the stroke cap is not reached.
    #[must_use]
    pub fn needs_more_strokes(&self, threshold: f32) -> bool {
        match self.strokes.last_darkness() {
            None => true,
            Some(darkness) => {
                darkness > threshold && self.strokes.len() < self.config.max_strokes
            }
        }
    }

    /// Select the best of `num_attempts` candidates, subtract it from
    /// the residue, and record it.
    ///
    /// Candidates continue from the attachment of the most recently
    /// accepted stroke.
    ///
    /// # Errors
    ///
    /// Returns [`ScribbleError::NoResidue`] if [`rebuild`](Self::rebuild)
    /// has not run yet.
    #[allow(clippy::cast_possible_truncation)]
    pub fn add_stroke(&mut self) -> Result<StrokeProgress, ScribbleError> {
        let (Some(residue), Some(blur)) = (self.residue.as_mut(), self.blur) else {
            return Err(ScribbleError::NoResidue);
        };

        let attachment = self.strokes.last().map(|(_, r)| r.attachment.clone());
        // validate() bounds gray_resolution to 1..=255.
        let intensity = self.config.gray_resolution.min(255) as u8;
        let instance = select_and_apply(
            &mut self.factory,
            residue,
            self.config.num_attempts,
            intensity,
            attachment.as_ref(),
        )
        .ok_or_else(|| ScribbleError::InvalidConfig("num_attempts must be positive".into()))?;

        let darkness = residue.darkness() / blur;
        self.strokes.insert(
            darkness,
            StrokeRecord {
                shape: instance.shape,
                attachment: instance.attachment,
            },
        );
        Ok(StrokeProgress {
            darkness,
            strokes: self.strokes.len(),
        })
    }

    /// Render a preview frame.
    ///
    /// Raster mode ignores the strokes entirely; vector mode draws the
    /// ones above `threshold`.
    #[must_use]
    pub fn render_preview(&self, mode: Mode, blur: f32, threshold: f32) -> GrayImage {
        match mode {
            Mode::Raster => raster_preview(&self.preview, blur, threshold),
            Mode::Vector => vector_preview(
                Dimensions::of(&self.preview),
                &self.strokes,
                blur,
                threshold,
            ),
        }
    }

    /// Composite curve and comparison thumbnail at `blur` and
    /// `threshold`.
    #[must_use]
    pub fn build_result(&self, blur: f32, threshold: f32) -> ScribbleResult {
        let vector = vector_preview(
            Dimensions::of(&self.preview),
            &self.strokes,
            blur,
            threshold,
        );
        ScribbleResult {
            curve: composite(&self.strokes, blur, threshold),
            thumbnail: thumbnail(&self.preview, &vector),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use image::Luma;

    use super::*;
    use crate::kernel::LineKernelFactory;
    use crate::shape::MultiCurve;

    fn small_config() -> ScribbleConfig {
        ScribbleConfig {
            preview_width: 48,
            num_attempts: 10,
            ..ScribbleConfig::default()
        }
    }

    fn engine(value: u8) -> Engine<LineKernelFactory> {
        let source = GrayImage::from_pixel(100, 100, Luma([value]));
        Engine::new(source, small_config(), LineKernelFactory::with_seed(false, 5)).unwrap()
    }

    #[test]
    fn preview_has_configured_width() {
        let e = engine(128);
        assert_eq!(e.preview().dimensions(), (48, 48));
    }

    #[test]
    fn rejects_empty_and_invalid_input() {
        let factory = LineKernelFactory::with_seed(false, 1);
        assert!(matches!(
            Engine::new(GrayImage::new(0, 4), small_config(), factory),
            Err(ScribbleError::EmptyImage { .. })
        ));
        let factory = LineKernelFactory::with_seed(false, 1);
        assert!(matches!(
            Engine::from_bytes(&[], small_config(), factory),
            Err(ScribbleError::EmptyInput)
        ));
        let bad = ScribbleConfig {
            num_attempts: 0,
            ..small_config()
        };
        let factory = LineKernelFactory::with_seed(false, 1);
        assert!(matches!(
            Engine::new(GrayImage::new(4, 4), bad, factory),
            Err(ScribbleError::InvalidConfig(_))
        ));
    }

    #[test]
    fn rebuild_rejects_bad_blur() {
        let mut e = engine(0);
        for blur in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            assert!(matches!(e.rebuild(blur), Err(ScribbleError::InvalidBlur(_))));
        }
        assert!(e.residue().is_none());
        assert!(e.needs_rebuild(2.0));
    }

    #[test]
    fn add_stroke_requires_rebuild() {
        let mut e = engine(0);
        assert!(matches!(e.add_stroke(), Err(ScribbleError::NoResidue)));
    }

    #[test]
    fn white_source_has_zero_darkness() {
        let mut e = engine(255);
        e.rebuild(2.0).unwrap();
        assert!(e.residue().unwrap().darkness().abs() < f32::EPSILON);
        let progress = e.add_stroke().unwrap();
        assert!(progress.darkness.abs() < f32::EPSILON);
        assert!(!e.needs_more_strokes(0.05));
    }

    #[test]
    fn black_source_darkness_equals_blur() {
        let mut e = engine(0);
        e.rebuild(2.0).unwrap();
        let d = e.residue().unwrap().darkness();
        assert!((d - 2.0).abs() < 1e-3, "darkness {d}");
    }

    #[test]
    fn darkness_never_rises_and_keys_match_order() {
        let mut e = engine(90);
        e.rebuild(2.0).unwrap();
        let mut previous = f32::INFINITY;
        for i in 1..=40 {
            let p = e.add_stroke().unwrap();
            assert_eq!(p.strokes, i);
            assert!(p.darkness <= previous, "stroke {i}: {previous} -> {}", p.darkness);
            previous = p.darkness;
        }
        let darkness: Vec<f32> = e.strokes().iter().map(|(k, _)| k.darkness()).collect();
        assert!(darkness.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn rebuild_clears_strokes_and_resizes_residue() {
        let mut e = engine(60);
        e.rebuild(1.0).unwrap();
        e.add_stroke().unwrap();
        assert_eq!(e.residue().unwrap().width(), 48);

        assert!(e.needs_rebuild(3.0));
        e.rebuild(3.0).unwrap();
        assert!(e.strokes().is_empty());
        assert_eq!(e.residue().unwrap().width(), 16);
        assert!(!e.needs_rebuild(3.0));
    }

    #[test]
    fn stroke_cap_stops_growth() {
        let source = GrayImage::from_pixel(100, 100, Luma([0]));
        let config = ScribbleConfig {
            max_strokes: 3,
            ..small_config()
        };
        let mut e = Engine::new(source, config, LineKernelFactory::with_seed(false, 2)).unwrap();
        e.rebuild(2.0).unwrap();
        while e.needs_more_strokes(0.0) {
            e.add_stroke().unwrap();
        }
        assert_eq!(e.strokes().len(), 3);
    }

    #[test]
    fn result_holds_thumbnail_and_strokes_above_threshold() {
        let mut e = engine(40);
        e.rebuild(2.0).unwrap();
        for _ in 0..20 {
            e.add_stroke().unwrap();
        }
        let result = e.build_result(2.0, 0.0);
        assert_eq!(result.curve.len(), 20);
        assert_eq!(result.thumbnail.dimensions(), (96, 48));

        let b = result.curve.bounds().unwrap();
        assert!(b.min_x >= 0.0 && b.max_x <= 48.0, "{b:?}");

        let none = e.build_result(2.0, 1.0);
        assert!(none.curve.is_empty());
    }

    #[test]
    fn raster_preview_ignores_strokes() {
        let mut e = engine(100);
        e.rebuild(2.0).unwrap();
        let before = e.render_preview(Mode::Raster, 2.0, 0.1);
        e.add_stroke().unwrap();
        assert_eq!(e.render_preview(Mode::Raster, 2.0, 0.1), before);
    }

    #[test]
    fn vector_preview_darkens_as_strokes_accumulate() {
        let mut e = engine(0);
        e.rebuild(2.0).unwrap();
        let empty = e.render_preview(Mode::Vector, 2.0, 0.0);
        assert!(empty.pixels().all(|p| p.0[0] == 255));
        for _ in 0..10 {
            e.add_stroke().unwrap();
        }
        let drawn = e.render_preview(Mode::Vector, 2.0, 0.0);
        assert!(drawn.pixels().any(|p| p.0[0] < 128));
    }
}
