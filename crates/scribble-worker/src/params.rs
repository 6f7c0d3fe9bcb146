//! Live job parameters and the block that shares them with the worker.
//!
//! Callers only ever set fields and notify; the worker only ever
//! inspects them under the lock and copies a snapshot out before doing
//! any work.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use scribble_pipeline::Mode;

use crate::JobError;

/// Parameters that may change while a job runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JobParams {
    /// Stroke width in preview pixels. The residue is this many times
    /// coarser than the preview.
    pub blur: f32,
    /// Stroke darkness at or below which growth stops.
    pub threshold: f32,
    /// What preview frames show.
    pub mode: Mode,
}

impl JobParams {
    pub const DEFAULT_BLUR: f32 = 2.0;
    pub const DEFAULT_THRESHOLD: f32 = 0.05;

    /// Check that blur and threshold are usable.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::InvalidBlur`] unless blur is finite and
    /// positive, and [`JobError::InvalidThreshold`] unless threshold is
    /// finite.
    pub fn validate(&self) -> Result<(), JobError> {
        validate_blur(self.blur)?;
        validate_threshold(self.threshold)
    }
}

impl Default for JobParams {
    fn default() -> Self {
        Self {
            blur: Self::DEFAULT_BLUR,
            threshold: Self::DEFAULT_THRESHOLD,
            mode: Mode::default(),
        }
    }
}

pub(crate) fn validate_blur(blur: f32) -> Result<(), JobError> {
    if blur.is_finite() && blur > 0.0 {
        Ok(())
    } else {
        Err(JobError::InvalidBlur(blur))
    }
}

pub(crate) fn validate_threshold(threshold: f32) -> Result<(), JobError> {
    if threshold.is_finite() {
        Ok(())
    } else {
        Err(JobError::InvalidThreshold(threshold))
    }
}

/// Everything guarded by the parameter mutex.
#[derive(Debug)]
pub(crate) struct ParamState {
    pub params: JobParams,
    pub stopped: bool,
    /// Results requested so far; the worker tracks how many it answered.
    pub result_requests: u64,
}

/// Parameter block shared between a [`Scribbler`](crate::Scribbler)
/// handle and its worker.
#[derive(Debug)]
pub(crate) struct SharedParams {
    state: Mutex<ParamState>,
    wake: Condvar,
}

impl SharedParams {
    pub fn new(params: JobParams) -> Self {
        Self {
            state: Mutex::new(ParamState {
                params,
                stopped: false,
                result_requests: 0,
            }),
            wake: Condvar::new(),
        }
    }

    // Poisoning is ignored; updates are plain field stores.
    fn lock(&self) -> MutexGuard<'_, ParamState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply `f` to the state and wake the worker.
    pub fn update(&self, f: impl FnOnce(&mut ParamState)) {
        f(&mut self.lock());
        self.wake.notify_all();
    }

    pub fn snapshot(&self) -> JobParams {
        self.lock().params
    }

    pub fn is_stopped(&self) -> bool {
        self.lock().stopped
    }

    /// Block until `plan` yields work or the job is stopped.
    ///
    /// `plan` runs under the lock each time the worker wakes. Returns
    /// `None` once the job is stopped.
    pub fn wait_for<T>(&self, mut plan: impl FnMut(&ParamState) -> Option<T>) -> Option<T> {
        let mut guard = self.lock();
        loop {
            if guard.stopped {
                return None;
            }
            if let Some(work) = plan(&guard) {
                return Some(work);
            }
            guard = self
                .wake
                .wait(guard)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}
