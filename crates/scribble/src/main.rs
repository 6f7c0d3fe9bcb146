//! scribble: run a stroke-fitting job on an image file.
//!
//! Loads the image on a worker thread, grows strokes until the weakest
//! one falls to the threshold, then writes the comparison thumbnail
//! (source beside the rendered strokes) and reports the stroke count and
//! pen travel length.
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin scribble -- [OPTIONS] <IMAGE_PATH>
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `info`); per-stroke events
//! are logged at `debug`.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use scribble_pipeline::{GrayImage, LineKernelFactory, MultiCurve, ScribbleConfig};
use scribble_worker::{Event, JobParams, Scribbler};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

/// Turn a raster image into greedily fitted pen strokes.
#[derive(Parser)]
#[command(name = "scribble", version)]
struct Cli {
    /// Path to the input image (PNG, JPEG, BMP, WebP).
    image_path: PathBuf,

    /// Stroke width in preview pixels; the residue is this many times
    /// coarser than the preview.
    #[arg(long, default_value_t = JobParams::DEFAULT_BLUR)]
    blur: f32,

    /// Stop once the weakest stroke's darkness falls to this value.
    #[arg(long, default_value_t = JobParams::DEFAULT_THRESHOLD)]
    threshold: f32,

    /// What preview frames show.
    #[arg(long, value_enum, default_value_t = PreviewMode::Raster)]
    mode: PreviewMode,

    /// Preview width in pixels.
    #[arg(long, default_value_t = ScribbleConfig::DEFAULT_PREVIEW_WIDTH)]
    preview_width: u32,

    /// Candidate strokes sampled per accepted stroke.
    #[arg(long, default_value_t = ScribbleConfig::DEFAULT_NUM_ATTEMPTS)]
    num_attempts: usize,

    /// Hard cap on accepted strokes.
    #[arg(long, default_value_t = ScribbleConfig::DEFAULT_MAX_STROKES)]
    max_strokes: usize,

    /// Start each stroke where the previous one ended.
    #[arg(long)]
    connected: bool,

    /// Seed for candidate sampling, for reproducible output.
    #[arg(long)]
    seed: Option<u64>,

    /// Full engine config as a JSON string.
    ///
    /// When provided, the individual engine flags are ignored. The JSON
    /// must be a valid `ScribbleConfig` serialization; missing fields
    /// take their defaults.
    #[arg(long)]
    config_json: Option<String>,

    /// Where to write the comparison thumbnail PNG.
    #[arg(long, default_value = "scribble-thumbnail.png")]
    thumbnail: PathBuf,

    /// Also write the last preview frame to this PNG.
    #[arg(long)]
    preview: Option<PathBuf>,
}

/// Preview mode selection.
#[derive(Clone, Copy, ValueEnum)]
enum PreviewMode {
    /// Source blurred and brightened by the threshold.
    Raster,
    /// Accumulated strokes above the threshold.
    Vector,
}

impl From<PreviewMode> for scribble_pipeline::Mode {
    fn from(mode: PreviewMode) -> Self {
        match mode {
            PreviewMode::Raster => Self::Raster,
            PreviewMode::Vector => Self::Vector,
        }
    }
}

/// Build a [`ScribbleConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual engine flags are ignored.
fn config_from_cli(cli: &Cli) -> Result<ScribbleConfig, String> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    Ok(ScribbleConfig {
        preview_width: cli.preview_width,
        num_attempts: cli.num_attempts,
        max_strokes: cli.max_strokes,
        connected: cli.connected,
        ..ScribbleConfig::default()
    })
}

fn params_from_cli(cli: &Cli) -> JobParams {
    JobParams {
        blur: cli.blur,
        threshold: cli.threshold,
        mode: cli.mode.into(),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    let config = match config_from_cli(&cli) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };
    let params = params_from_cli(&cli);
    info!(?config, ?params, image = %cli.image_path.display(), "starting job");

    let factory = cli.seed.map_or_else(
        || LineKernelFactory::new(config.connected),
        |seed| LineKernelFactory::with_seed(config.connected, seed),
    );
    let job = match Scribbler::spawn(cli.image_path.clone(), params, config, factory) {
        Ok(job) => job,
        Err(e) => {
            eprintln!("Error starting job: {e}");
            return ExitCode::FAILURE;
        }
    };
    job.request_result();

    let mut last_frame: Option<GrayImage> = None;
    let (curve, thumbnail) = loop {
        match job.events().recv() {
            Ok(Event::Progress { darkness, strokes }) => {
                if strokes % 100 == 0 {
                    info!(strokes, darkness, "progress");
                }
            }
            Ok(Event::PreviewFrame(frame)) => {
                debug!(width = frame.width(), height = frame.height(), "preview frame");
                last_frame = Some(frame);
            }
            Ok(Event::Result { curve, thumbnail }) => break (curve, thumbnail),
            Err(_) => {
                // The worker has already logged why.
                error!("job ended without a result");
                return ExitCode::FAILURE;
            }
        }
    };
    drop(job);

    if let Err(e) = thumbnail.save_with_format(&cli.thumbnail, image::ImageFormat::Png) {
        eprintln!("Error writing {}: {e}", cli.thumbnail.display());
        return ExitCode::FAILURE;
    }
    info!(path = %cli.thumbnail.display(), "thumbnail written");

    if let Some(ref path) = cli.preview {
        let Some(frame) = last_frame else {
            eprintln!("No preview frame was produced");
            return ExitCode::FAILURE;
        };
        if let Err(e) = frame.save_with_format(path, image::ImageFormat::Png) {
            eprintln!("Error writing {}: {e}", path.display());
            return ExitCode::FAILURE;
        }
        info!(path = %path.display(), "preview written");
    }

    println!(
        "{} strokes, {:.1} px of pen travel",
        curve.len(),
        curve.total_time()
    );
    ExitCode::SUCCESS
}
