//! Messages a running job sends to its listener.

use scribble_pipeline::{ConcatCurve, GrayImage};

/// One worker notification.
#[derive(Debug, Clone)]
pub enum Event {
    /// A fresh preview frame at preview resolution.
    PreviewFrame(GrayImage),

    /// A stroke was accepted.
    Progress {
        /// Residual darkness divided by blur after the stroke.
        darkness: f32,
        /// Strokes accepted since the last blur change.
        strokes: usize,
    },

    /// Answer to [`Scribbler::request_result`](crate::Scribbler::request_result).
    Result {
        /// Strokes above the threshold, concatenated in preview space.
        curve: ConcatCurve,
        /// Preview image beside the vector rendering.
        thumbnail: GrayImage,
    },
}

impl Event {
    /// Short name for log lines.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::PreviewFrame(_) => "preview",
            Self::Progress { .. } => "progress",
            Self::Result { .. } => "result",
        }
    }
}
