//! Shared types for the scribble stroke fitting engine.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Re-export `GrayImage` so downstream crates can handle preview frames
/// and thumbnails without depending on `image` directly.
pub use image::GrayImage;

/// A 2D point in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position (pixels from left edge).
    pub x: f64,
    /// Vertical position (pixels from top edge).
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Linear interpolation towards `other`; `ratio` 0 gives `self`,
    /// 1 gives `other`.
    #[must_use]
    pub fn lerp(self, other: Self, ratio: f64) -> Self {
        Self {
            x: (other.x - self.x).mul_add(ratio, self.x),
            y: (other.y - self.y).mul_add(ratio, self.y),
        }
    }
}

/// A sequence of connected points forming one pen-down path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline(Vec<Point>);

impl Polyline {
    /// Create a new polyline from a vector of points.
    #[must_use]
    pub const fn new(points: Vec<Point>) -> Self {
        Self(points)
    }

    /// Returns `true` if the polyline has no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of points in the polyline.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns a slice of all points.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.0
    }

    /// Total length of all segments.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.0.windows(2).map(|w| w[0].distance(w[1])).sum()
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Dimensions of an existing image.
    #[must_use]
    pub fn of(image: &GrayImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
        }
    }

    /// Total pixel count.
    #[must_use]
    pub const fn pixel_count(self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// Axis-aligned bounding box.
///
/// Returned by value from shapes, so a caller holding one can never
/// alter the shape's stored bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    /// Bounds of a single point.
    #[must_use]
    pub const fn at(p: Point) -> Self {
        Self {
            min_x: p.x,
            min_y: p.y,
            max_x: p.x,
            max_y: p.y,
        }
    }

    /// Smallest box containing `self` and `p`.
    #[must_use]
    pub const fn including(self, p: Point) -> Self {
        Self {
            min_x: self.min_x.min(p.x),
            min_y: self.min_y.min(p.y),
            max_x: self.max_x.max(p.x),
            max_y: self.max_y.max(p.y),
        }
    }

    /// Smallest box containing both boxes.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// `[min_x, min_y, max_x, max_y]`.
    #[must_use]
    pub const fn to_array(self) -> [f64; 4] {
        [self.min_x, self.min_y, self.max_x, self.max_y]
    }
}

/// What the preview frames show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Mode {
    /// The source image blurred and brightened by the threshold, which
    /// approximates how the final drawing will look.
    #[default]
    Raster,
    /// The accumulated strokes that are above the threshold.
    Vector,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Raster => f.write_str("Raster"),
            Self::Vector => f.write_str("Vector"),
        }
    }
}

/// Fixed engine parameters. These do not change while a job runs; the
/// live parameters (blur, threshold, mode) are held by the worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScribbleConfig {
    /// Width of preview frames in pixels. The residue buffer is this
    /// width divided by the blur factor.
    pub preview_width: u32,

    /// Per-pixel full-scale ink value, and the amount one stroke removes
    /// from each pixel it covers.
    pub gray_resolution: u16,

    /// Candidate strokes sampled per accepted stroke.
    pub num_attempts: usize,

    /// Hard cap on accepted strokes for one blur setting.
    pub max_strokes: usize,

    /// Whether each candidate starts where the previous stroke ended.
    pub connected: bool,
}

impl ScribbleConfig {
    pub const DEFAULT_PREVIEW_WIDTH: u32 = 450;
    pub const DEFAULT_GRAY_RESOLUTION: u16 = 128;
    pub const DEFAULT_NUM_ATTEMPTS: usize = 100;
    pub const DEFAULT_MAX_STROKES: usize = 2000;
    pub const DEFAULT_CONNECTED: bool = false;

    /// Check the invariants the engine relies on.
    ///
    /// # Errors
    ///
    /// Returns [`ScribbleError::InvalidConfig`] naming the first field
    /// that is out of range.
    pub fn validate(&self) -> Result<(), ScribbleError> {
        if self.preview_width == 0 {
            return Err(ScribbleError::InvalidConfig(
                "preview_width must be positive".into(),
            ));
        }
        if self.gray_resolution == 0 || self.gray_resolution > 255 {
            return Err(ScribbleError::InvalidConfig(format!(
                "gray_resolution must be in 1..=255, got {}",
                self.gray_resolution
            )));
        }
        if self.num_attempts == 0 {
            return Err(ScribbleError::InvalidConfig(
                "num_attempts must be positive".into(),
            ));
        }
        Ok(())
    }
}

impl Default for ScribbleConfig {
    fn default() -> Self {
        Self {
            preview_width: Self::DEFAULT_PREVIEW_WIDTH,
            gray_resolution: Self::DEFAULT_GRAY_RESOLUTION,
            num_attempts: Self::DEFAULT_NUM_ATTEMPTS,
            max_strokes: Self::DEFAULT_MAX_STROKES,
            connected: Self::DEFAULT_CONNECTED,
        }
    }
}

/// Errors raised by the engine.
#[derive(Debug, thiserror::Error)]
pub enum ScribbleError {
    /// Failed to decode the input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// The image decoded to zero width or height.
    #[error("image has no pixels ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    /// Blur must be a finite, positive factor.
    #[error("blur must be finite and positive, got {0}")]
    InvalidBlur(f32),

    /// Engine configuration is invalid.
    #[error("invalid scribble configuration: {0}")]
    InvalidConfig(String),

    /// A stroke operation was attempted before the residue was built.
    #[error("residue buffer has not been built")]
    NoResidue,
}
