use std::path::{Path, PathBuf};
use std::process;
use std::thread;

use clap::Parser;

use videoanon_core::detection::domain::cascade_detector::{CascadeDetector, ClassifierSet};
use videoanon_core::detection::domain::seed_provider::{FixedSeedProvider, SeedProvider};
use videoanon_core::detection::infrastructure::opencv_cascade_detector::OpencvCascadeDetector;
use videoanon_core::pipeline::anonymize_video_use_case::AnonymizeVideoUseCase;
use videoanon_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use videoanon_core::redaction::infrastructure::opaque_box_redactor::OpaqueBoxRedactor;
use videoanon_core::shared::constants::VIDEO_EXTENSIONS;
use videoanon_core::shared::geometry::Point;
use videoanon_core::tracking::config::{
    TrackerConfig, DEFAULT_MAX_GAP_SECONDS, DEFAULT_MAX_SIZE_FRACTION, DEFAULT_MIN_NEIGHBORS,
    DEFAULT_MIN_SIZE_FRACTION, DEFAULT_SCALE, DEFAULT_START_OFFSET_SECONDS, DEFAULT_TOLERANCE,
};
use videoanon_core::video::domain::video_reader::VideoReader;
use videoanon_core::video::domain::video_writer::VideoWriter;
use videoanon_core::video::infrastructure::ffmpeg_reader::FfmpegReader;
use videoanon_core::video::infrastructure::ffmpeg_writer::FfmpegWriter;

/// Redact a tracked face from videos with an opaque box.
#[derive(Parser)]
#[command(name = "videoanon")]
struct Cli {
    /// Input video file(s). With several inputs, each output name is
    /// derived from its input.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output file (single input only). Defaults to "<input>-anon.mp4";
    /// the extension is always forced to .mp4.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Initial face position in pixels, as X Y. Tracking follows the
    /// face starting from here.
    #[arg(long, num_args = 2, value_names = ["X", "Y"], required = true)]
    seed: Vec<f64>,

    /// Detection fineness; closer to 1 scans more finely but slower.
    #[arg(long, default_value_t = DEFAULT_SCALE)]
    scale: f64,

    /// Minimum neighboring hits per candidate. Raise if spurious faces
    /// get picked up.
    #[arg(long, default_value_t = DEFAULT_MIN_NEIGHBORS)]
    neighbors: i32,

    /// Maximum seed-normalized distance for accepting a candidate.
    #[arg(long, default_value_t = DEFAULT_TOLERANCE)]
    tolerance: f64,

    /// Seconds of video to drop before tracking begins.
    #[arg(long, default_value_t = DEFAULT_START_OFFSET_SECONDS)]
    start_offset: f64,

    /// Smallest acceptable box dimension as a fraction of frame width.
    #[arg(long, default_value_t = DEFAULT_MIN_SIZE_FRACTION)]
    min_size: f64,

    /// Largest acceptable box dimension as a fraction of frame width.
    #[arg(long, default_value_t = DEFAULT_MAX_SIZE_FRACTION)]
    max_size: f64,

    /// Longest tolerated run without a detection, in seconds. Tracking
    /// fails hard past this.
    #[arg(long, default_value_t = DEFAULT_MAX_GAP_SECONDS)]
    max_gap: f64,

    /// Directory holding haarcascade XML files. Falls back to the user
    /// cache, downloading on first use.
    #[arg(long)]
    cascade_dir: Option<PathBuf>,

    /// Replace existing output files.
    #[arg(short = 'f', long)]
    overwrite: bool,

    /// Videos processed in parallel (sessions are independent).
    #[arg(short, long, default_value_t = 1)]
    jobs: usize,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let seed = Point::new(cli.seed[0], cli.seed[1]);
    let config = TrackerConfig {
        scale: cli.scale,
        min_neighbors: cli.neighbors,
        tolerance: cli.tolerance,
        min_size_fraction: cli.min_size,
        max_size_fraction: cli.max_size,
        max_gap_seconds: cli.max_gap,
        start_offset_seconds: cli.start_offset,
    };
    config.validate()?;

    let jobs: Vec<(PathBuf, PathBuf)> = cli
        .inputs
        .iter()
        .map(|input| {
            let output = match &cli.output {
                Some(path) => force_mp4(path),
                None => default_output(input),
            };
            (input.clone(), output)
        })
        .collect();

    for (input, output) in &jobs {
        if !input.exists() {
            return Err(format!("input file not found: {}", input.display()).into());
        }
        if unknown_extension(input) {
            log::warn!(
                "{}: extension not among tested formats ({})",
                input.display(),
                VIDEO_EXTENSIONS.join(", ")
            );
        }
        if output.exists() && !cli.overwrite {
            return Err(format!(
                "output file exists: {} (pass --overwrite to replace)",
                output.display()
            )
            .into());
        }
    }

    let workers = cli.jobs.min(jobs.len().max(1));
    if workers <= 1 {
        for (input, output) in jobs {
            anonymize_one(&input, &output, seed, &config, cli.cascade_dir.as_deref())?;
        }
        return Ok(());
    }

    run_parallel(jobs, workers, seed, &config, cli.cascade_dir.as_deref())
}

/// Fans independent per-video sessions out to `workers` threads.
/// Sessions share nothing; the queue is the only coordination point.
fn run_parallel(
    jobs: Vec<(PathBuf, PathBuf)>,
    workers: usize,
    seed: Point,
    config: &TrackerConfig,
    cascade_dir: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (job_tx, job_rx) = crossbeam_channel::unbounded::<(PathBuf, PathBuf)>();
    for job in jobs {
        job_tx
            .send(job)
            .map_err(|_| "job queue closed unexpectedly")?;
    }
    drop(job_tx);

    let handles: Vec<_> = (0..workers)
        .map(|_| {
            let job_rx = job_rx.clone();
            let config = config.clone();
            let cascade_dir = cascade_dir.map(Path::to_path_buf);
            thread::spawn(move || -> Result<(), String> {
                for (input, output) in job_rx {
                    anonymize_one(&input, &output, seed, &config, cascade_dir.as_deref())
                        .map_err(|e| format!("{}: {e}", input.display()))?;
                }
                Ok(())
            })
        })
        .collect();

    let mut first_error: Option<String> = None;
    for handle in handles {
        match handle.join() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                first_error.get_or_insert(e);
            }
            Err(_) => {
                first_error.get_or_insert_with(|| "worker thread panicked".to_string());
            }
        }
    }

    match first_error {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

fn anonymize_one(
    input: &Path,
    output: &Path,
    seed: Point,
    config: &TrackerConfig,
    cascade_dir: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    log::info!("reading {}", input.display());

    let classifiers = ClassifierSet::standard();
    let detector: Box<dyn CascadeDetector> =
        Box::new(OpencvCascadeDetector::new(&classifiers, cascade_dir)?);
    let seed_provider: Box<dyn SeedProvider> = Box::new(FixedSeedProvider::new(seed));

    let mut reader: Box<dyn VideoReader> = Box::new(FfmpegReader::new());
    let metadata = reader.open(input)?;
    log::info!(
        "{}: {}x{} at {:.2} fps ({})",
        input.display(),
        metadata.width,
        metadata.height,
        metadata.fps,
        metadata.codec
    );
    let writer: Box<dyn VideoWriter> = Box::new(FfmpegWriter::new());

    let use_case = AnonymizeVideoUseCase::new(
        reader,
        writer,
        detector,
        Box::new(OpaqueBoxRedactor),
        seed_provider,
        classifiers,
        config.clone(),
        Box::new(StdoutPipelineLogger::default()),
        None,
    );
    use_case.execute(&metadata, output)?;
    log::info!("video saved to {}", output.display());
    Ok(())
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if cli.output.is_some() && cli.inputs.len() > 1 {
        return Err("--output only applies to a single input; outputs are derived otherwise".into());
    }
    if cli.jobs == 0 {
        return Err("--jobs must be at least 1".into());
    }
    if cli.seed.len() != 2 {
        return Err("--seed takes exactly two values: X Y".into());
    }
    Ok(())
}

fn default_output(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "video".to_string());
    input.with_file_name(format!("{stem}-anon.mp4"))
}

fn force_mp4(path: &Path) -> PathBuf {
    path.with_extension("mp4")
}

fn unknown_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| !VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(true)
}
