//! The worker loop.
//!
//! Each wake evaluates what is out of date under the parameter lock,
//! copies a snapshot, and then, with the lock released, performs at
//! most one of each action in a fixed order:
//!
//! ```text
//! rebuild residue ─► add one stroke ─► render preview ─► send result
//!   (blur changed)   (growth pending)    (stale)          (requested,
//!                                                          growth done)
//! ```
//!
//! When nothing is out of date the worker sleeps on the condition
//! variable until a setter wakes it. A failed iteration is not retried
//! until the parameters change or another result is requested.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, select};
use scribble_pipeline::{Engine, KernelFactory, Mode, ScribbleConfig};
use tracing::{debug, error, info, warn};

use crate::JobError;
use crate::event::Event;
use crate::params::{JobParams, ParamState, SharedParams};
use crate::source::ImageSource;

/// What one iteration will do, decided under the parameter lock.
#[derive(Debug, Clone, Copy)]
struct Plan {
    params: JobParams,
    /// Result requests made when the plan was taken.
    requests: u64,
    rebuild: bool,
    more_strokes: bool,
    preview_stale: bool,
    result_requested: bool,
}

enum Flow {
    Continue,
    Stop,
}

/// Channels the worker talks through.
pub(crate) struct Links {
    pub shared: Arc<SharedParams>,
    pub events: Sender<Event>,
    pub shutdown: Receiver<()>,
}

/// Worker thread body: load the image, then schedule until stopped.
///
/// A load failure is logged and ends the job without any event.
pub(crate) fn run<S, F>(source: &S, config: ScribbleConfig, factory: F, links: Links)
where
    S: ImageSource,
    F: KernelFactory,
{
    let engine = match load(source, config, factory) {
        Ok(engine) => engine,
        Err(e) => {
            error!(source = %source.describe(), error = %e, "failed to load image");
            return;
        }
    };
    let (width, height) = engine.source().dimensions();
    info!(source = %source.describe(), width, height, "loaded image");

    Scheduler::new(engine, links).run();
}

fn load<S, F>(source: &S, config: ScribbleConfig, factory: F) -> Result<Engine<F>, JobError>
where
    S: ImageSource,
    F: KernelFactory,
{
    let bytes = source.read()?;
    Ok(Engine::from_bytes(&bytes, config, factory)?)
}

struct Scheduler<F: KernelFactory> {
    engine: Engine<F>,
    links: Links,
    /// Parameters the last completed iteration ran with.
    applied: Option<JobParams>,
    preview_rendered: bool,
    /// Result requests covered by the last result sent.
    answered: u64,
    /// Parameters and request count the last iteration failed with;
    /// retried only once either changes.
    failed: Option<(JobParams, u64)>,
}

impl<F: KernelFactory> Scheduler<F> {
    const fn new(engine: Engine<F>, links: Links) -> Self {
        Self {
            engine,
            links,
            applied: None,
            preview_rendered: false,
            answered: 0,
            failed: None,
        }
    }

    fn run(mut self) {
        while let Some(plan) = self.links.shared.wait_for(|state| self.plan(state)) {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.run_unit(&plan)));
            match outcome {
                Ok(Ok(Flow::Continue)) => self.failed = None,
                Ok(Ok(Flow::Stop)) => break,
                Ok(Err(e)) => {
                    warn!(error = %e, "scribble iteration failed");
                    self.failed = Some((plan.params, plan.requests));
                }
                Err(payload) => {
                    warn!(panic = panic_message(&*payload), "scribble iteration panicked");
                    self.failed = Some((plan.params, plan.requests));
                }
            }
        }
        debug!(strokes = self.engine.strokes().len(), "scribble worker stopped");
    }

    fn plan(&self, state: &ParamState) -> Option<Plan> {
        let params = state.params;
        let requests = state.result_requests;
        if self.failed == Some((params, requests)) {
            return None;
        }

        let rebuild = self.engine.needs_rebuild(params.blur);
        // A rebuild empties the stroke set, which always needs growth.
        let more_strokes = rebuild || self.engine.needs_more_strokes(params.threshold);
        let preview_stale = (params.mode == Mode::Vector && more_strokes)
            || !self.preview_rendered
            || self.applied != Some(params);
        let result_requested = requests > self.answered;

        (rebuild || more_strokes || preview_stale || result_requested).then_some(Plan {
            params,
            requests,
            rebuild,
            more_strokes,
            preview_stale,
            result_requested,
        })
    }

    fn run_unit(&mut self, plan: &Plan) -> Result<Flow, JobError> {
        let JobParams {
            blur,
            threshold,
            mode,
        } = plan.params;

        if plan.rebuild {
            self.engine.rebuild(blur)?;
            if let Some(residue) = self.engine.residue() {
                info!(
                    blur,
                    width = residue.width(),
                    height = residue.height(),
                    darkness = residue.darkness() / blur,
                    "rebuilt residue"
                );
            }
        }

        if plan.more_strokes {
            let progress = self.engine.add_stroke()?;
            debug!(
                strokes = progress.strokes,
                darkness = progress.darkness,
                "accepted stroke"
            );
            if !self.emit(Event::Progress {
                darkness: progress.darkness,
                strokes: progress.strokes,
            }) {
                return Ok(Flow::Stop);
            }
        }

        if plan.preview_stale {
            let frame = self.engine.render_preview(mode, blur, threshold);
            if !self.emit(Event::PreviewFrame(frame)) {
                return Ok(Flow::Stop);
            }
            self.preview_rendered = true;
        }

        if plan.result_requested && !plan.more_strokes {
            let result = self.engine.build_result(blur, threshold);
            info!(
                strokes = result.curve.len(),
                total = self.engine.strokes().len(),
                "sending result"
            );
            if !self.emit(Event::Result {
                curve: result.curve,
                thumbnail: result.thumbnail,
            }) {
                return Ok(Flow::Stop);
            }
            // Requests that arrived since the plan was taken stay pending.
            self.answered = plan.requests;
        }

        self.applied = Some(plan.params);
        Ok(Flow::Continue)
    }

    /// Deliver `event`, giving up if the job stops while the listener
    /// is not reading. Returns whether it was delivered.
    fn emit(&self, event: Event) -> bool {
        if self.links.shared.is_stopped() {
            return false;
        }
        let kind = event.kind();
        select! {
            send(self.links.events, event) -> sent => {
                if sent.is_err() {
                    debug!(kind, "listener disconnected");
                }
                sent.is_ok()
            }
            recv(self.links.shutdown) -> _ => {
                debug!(kind, "dropped event on shutdown");
                false
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
