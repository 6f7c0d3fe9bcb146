//! scribble-worker: Background scheduling for scribble jobs.
//!
//! A [`Scribbler`] owns one worker thread running the greedy engine from
//! `scribble-pipeline`. Callers change blur, threshold, and preview mode
//! at any time; the worker reconciles its cached state against the
//! latest values and reports through a bounded channel of [`Event`]s:
//!
//! ```no_run
//! use std::path::PathBuf;
//! use scribble_worker::{Event, JobParams, Scribbler};
//!
//! let job = Scribbler::with_defaults(PathBuf::from("portrait.png"), JobParams::default())?;
//! job.request_result();
//! for event in job.events() {
//!     if let Event::Result { curve, .. } = event {
//!         println!("{} strokes", curve.len());
//!         break;
//!     }
//! }
//! # Ok::<(), scribble_worker::JobError>(())
//! ```

mod event;
mod params;
mod scheduler;
mod source;

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender};
use scribble_pipeline::{KernelFactory, LineKernelFactory, Mode, ScribbleConfig, ScribbleError};
use tracing::{debug, warn};

pub use event::Event;
pub use params::JobParams;
pub use source::{ImageSource, SourceError};

use params::{SharedParams, validate_blur, validate_threshold};
use scheduler::Links;

/// Events buffered before the worker blocks on a slow listener.
pub const EVENT_CAPACITY: usize = 16;

/// Errors raised by job control.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    /// Blur must be a finite, positive factor.
    #[error("blur must be finite and positive, got {0}")]
    InvalidBlur(f32),

    /// Threshold must be finite.
    #[error("threshold must be finite, got {0}")]
    InvalidThreshold(f32),

    /// The image bytes could not be read.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// The engine rejected its input or configuration.
    #[error(transparent)]
    Engine(#[from] ScribbleError),

    /// The worker thread could not be started.
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Handle to one running job.
///
/// Dropping the handle stops the job and joins its thread.
#[derive(Debug)]
pub struct Scribbler {
    shared: Arc<SharedParams>,
    events: Receiver<Event>,
    shutdown: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl Scribbler {
    /// Start a job that loads `source` and fits strokes with `factory`.
    ///
    /// Loading happens on the worker thread; a source that cannot be
    /// read or decoded ends the job without sending any event, which
    /// the listener observes as a disconnected channel.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::InvalidBlur`] or [`JobError::InvalidThreshold`]
    /// for unusable initial parameters, [`JobError::Engine`] for an
    /// invalid `config`, and [`JobError::Spawn`] if the thread cannot be
    /// created.
    pub fn spawn<S, F>(
        source: S,
        params: JobParams,
        config: ScribbleConfig,
        factory: F,
    ) -> Result<Self, JobError>
    where
        S: ImageSource + 'static,
        F: KernelFactory + 'static,
    {
        params.validate()?;
        config.validate()?;

        let shared = Arc::new(SharedParams::new(params));
        let (event_tx, event_rx) = crossbeam_channel::bounded(EVENT_CAPACITY);
        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded(0);
        let links = Links {
            shared: Arc::clone(&shared),
            events: event_tx,
            shutdown: shutdown_rx,
        };

        let worker = thread::Builder::new()
            .name("scribble-worker".into())
            .spawn(move || scheduler::run(&source, config, factory, links))
            .map_err(JobError::Spawn)?;

        Ok(Self {
            shared,
            events: event_rx,
            shutdown: Some(shutdown_tx),
            worker: Some(worker),
        })
    }

    /// Start a job with the default configuration and a line kernel
    /// seeded from entropy.
    ///
    /// # Errors
    ///
    /// See [`spawn`](Self::spawn).
    pub fn with_defaults<S>(source: S, params: JobParams) -> Result<Self, JobError>
    where
        S: ImageSource + 'static,
    {
        let config = ScribbleConfig::default();
        let factory = LineKernelFactory::new(config.connected);
        Self::spawn(source, params, config, factory)
    }

    /// Change the stroke width. Accepted strokes are discarded on the
    /// worker's next wake.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::InvalidBlur`] unless `blur` is finite and
    /// positive; the current value is kept.
    pub fn set_blur(&self, blur: f32) -> Result<(), JobError> {
        validate_blur(blur)?;
        self.shared.update(|s| s.params.blur = blur);
        Ok(())
    }

    /// Change the stopping threshold. Strokes are kept.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::InvalidThreshold`] unless `threshold` is
    /// finite.
    pub fn set_threshold(&self, threshold: f32) -> Result<(), JobError> {
        validate_threshold(threshold)?;
        self.shared.update(|s| s.params.threshold = threshold);
        Ok(())
    }

    /// Change what preview frames show. Strokes are kept.
    pub fn set_mode(&self, mode: Mode) {
        self.shared.update(|s| s.params.mode = mode);
    }

    /// Ask for an [`Event::Result`]. It is sent once growth has stopped
    /// for the current parameters.
    ///
    /// Requests made before the worker answers share one result. A
    /// request also retries an iteration that failed with the current
    /// parameters.
    pub fn request_result(&self) {
        self.shared.update(|s| s.result_requests += 1);
    }

    /// The parameters most recently set.
    #[must_use]
    pub fn params(&self) -> JobParams {
        self.shared.snapshot()
    }

    /// Events from the worker, in the order they were produced.
    #[must_use]
    pub const fn events(&self) -> &Receiver<Event> {
        &self.events
    }

    /// Whether the worker thread has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.worker.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Stop the job and wait for the worker to exit.
    ///
    /// Returns once the thread has joined; no event is sent after that.
    /// Calling it again is a no-op.
    pub fn stop(&mut self) {
        self.shared.update(|s| s.stopped = true);
        // Disconnecting releases a worker blocked on a full channel.
        drop(self.shutdown.take());
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("scribble worker panicked");
            } else {
                debug!("scribble worker joined");
            }
        }
    }
}

impl Drop for Scribbler {
    fn drop(&mut self) {
        self.stop();
    }
}
