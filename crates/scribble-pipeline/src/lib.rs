//! scribble-pipeline: Greedy stroke fitting (sans-IO).
//!
//! Converts a grayscale raster into an ordered set of pen-plottable
//! strokes. Each step samples random candidate strokes, keeps the one
//! that covers the most remaining ink, and subtracts its footprint:
//!
//! decode -> preview resize -> residue rebuild -> select/subtract
//! (repeated) -> preview render / composite result.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! images and byte slices. Threading, parameter changes, and image
//! loading live in `scribble-worker`.

pub mod curve;
pub mod engine;
pub mod kernel;
pub mod preview;
pub mod raster;
pub mod render;
pub mod resample;
pub mod residue;
pub mod selector;
pub mod shape;
pub mod strokes;
pub mod types;

pub use curve::{Curve, CurveError, Playback, PointsCurve};
pub use engine::{Engine, ScribbleResult, StrokeProgress};
pub use kernel::{KernelFactory, KernelInstance, LineAttachment, LineKernelFactory};
pub use residue::ResidueBuffer;
pub use shape::{ConcatCurve, MultiCurve, SingleCurve, Stroke, TransformedCurve};
pub use strokes::{StrokeKey, StrokeRecord, StrokeSet};
pub use types::{
    Bounds, Dimensions, GrayImage, Mode, Point, Polyline, ScribbleConfig, ScribbleError,
};
