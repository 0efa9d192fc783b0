use anyhow::{bail, Context, Result};
use camola_avatar::config::AppConfig;
use camola_avatar::landmarks::{LandmarkSource, ReplaySource, SyntheticSource};
use camola_avatar::output::{OutputSink, PngSequenceOutput, RasterCanvas, RenderSurface, V4L2Output};
use camola_avatar::AvatarPipeline;
use clap::Parser;
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Landmark source: "synthetic" or a path to a .jsonl recording
    #[arg(short, long, default_value = "synthetic")]
    source: String,

    /// Frame output: "none", "png:<dir>" or "v4l2:<device>"
    #[arg(short, long, default_value = "none")]
    output: String,

    /// Canvas width
    #[arg(long, default_value_t = 640)]
    width: u32,

    /// Canvas height
    #[arg(long, default_value_t = 480)]
    height: u32,

    /// Target frames per second
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Stop the synthetic source after this many frames (0 runs forever)
    #[arg(long, default_value_t = 0)]
    frames: u64,

    /// Seed for appearance sampling and the synthetic source
    #[arg(long)]
    seed: Option<u64>,

    /// Path to a TOML tuning file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    if args.width == 0 || args.height == 0 {
        bail!("Canvas size must be non-zero, got {}x{}", args.width, args.height);
    }
    if args.fps == 0 {
        bail!("Target FPS must be at least 1");
    }

    let config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };

    tracing::info!("Camola avatar starting");
    tracing::info!("Canvas: {}x{}", args.width, args.height);
    tracing::info!("Target FPS: {}", args.fps);
    tracing::info!(
        "Session: debounce={}ms, grace={} frames, topology={:?}",
        config.session.debounce_ms,
        config.session.grace_frames,
        config.topology.kind
    );

    let mut source = open_source(&args, &config).context("Failed to initialize landmark source")?;
    let mut output = open_output(&args.output, args.width, args.height)
        .context("Failed to initialize frame output")?;

    if let Some(sink) = &output {
        let (width, height) = sink.resolution();
        tracing::info!("Output: {}x{}", width, height);
    }

    let mut pipeline = match args.seed {
        Some(seed) => AvatarPipeline::seeded(config.session_config(), config.topology.kind, seed),
        None => AvatarPipeline::new(config.session_config(), config.topology.kind),
    };
    let mut canvas = RasterCanvas::new(args.width, args.height);

    // Main loop
    let result = run_pipeline(
        source.as_mut(),
        &mut pipeline,
        &mut canvas,
        &mut output,
        args.fps,
    );

    pipeline.shutdown(&mut canvas);
    result
}

fn open_source(args: &Args, config: &AppConfig) -> Result<Box<dyn LandmarkSource>> {
    if args.source == "synthetic" {
        let seed = args.seed.unwrap_or_else(rand::random);
        let source = SyntheticSource::new(config.topology.kind, args.width, args.height, seed)
            .with_jitter(config.synthetic.jitter)
            .with_dropouts(config.synthetic.dropout_every, config.synthetic.dropout_len)
            .with_max_frames((args.frames > 0).then_some(args.frames));
        return Ok(Box::new(source));
    }

    let source = ReplaySource::open(&args.source, args.width, args.height)?;
    Ok(Box::new(source))
}

fn open_output(target: &str, width: u32, height: u32) -> Result<Option<Box<dyn OutputSink>>> {
    if target == "none" {
        tracing::info!("No frame output, rendering only");
        return Ok(None);
    }

    match target.split_once(':') {
        Some(("png", dir)) if !dir.is_empty() => {
            Ok(Some(Box::new(PngSequenceOutput::new(dir, width, height)?)))
        }
        Some(("v4l2", device)) if !device.is_empty() => {
            Ok(Some(Box::new(V4L2Output::new(device, width, height)?)))
        }
        _ => bail!(
            "Unknown output '{}', expected none, png:<dir> or v4l2:<device>",
            target
        ),
    }
}

fn run_pipeline(
    source: &mut dyn LandmarkSource,
    pipeline: &mut AvatarPipeline,
    canvas: &mut RasterCanvas,
    output: &mut Option<Box<dyn OutputSink>>,
    target_fps: u32,
) -> Result<()> {
    let frame_duration = Duration::from_secs_f32(1.0 / target_fps as f32);
    let mut frame_count = 0u64;
    let mut dropped_count = 0u64;
    let mut total_source_time = Duration::ZERO;
    let mut total_process_time = Duration::ZERO;
    let mut total_output_time = Duration::ZERO;

    let (source_width, source_height) = source.resolution();
    tracing::info!("Landmark frames: {}x{}", source_width, source_height);
    tracing::info!("Starting main pipeline loop");
    tracing::info!("Press Ctrl+C to stop");

    loop {
        let loop_start = Instant::now();

        // Fetch landmarks
        let source_start = Instant::now();
        let Some(payload) = source.next_frame().context("Failed to read landmarks")? else {
            tracing::info!("Landmark stream ended after {} frames", frame_count);
            return Ok(());
        };
        total_source_time += source_start.elapsed();

        // Session, compose and render
        let process_start = Instant::now();
        let report = pipeline.process_frame(payload, Instant::now(), canvas);
        total_process_time += process_start.elapsed();
        if report.error.is_some() {
            dropped_count += 1;
        }

        // Output frame
        let output_start = Instant::now();
        if report.rendered {
            if let (Some(sink), Some(frame)) = (output.as_deref_mut(), canvas.frame()) {
                sink.write_frame(frame).context("Failed to write frame")?;
            }
        }
        total_output_time += output_start.elapsed();

        frame_count += 1;

        // Log stats every 30 frames
        if frame_count % 30 == 0 {
            let avg_source_ms = total_source_time.as_secs_f64() * 1000.0 / frame_count as f64;
            let avg_process_ms = total_process_time.as_secs_f64() * 1000.0 / frame_count as f64;
            let avg_output_ms = total_output_time.as_secs_f64() * 1000.0 / frame_count as f64;
            let total_ms = avg_source_ms + avg_process_ms + avg_output_ms;
            let actual_fps = 1000.0 / total_ms.max(f64::EPSILON);

            tracing::info!(
                "Frame {}: source={:.1}ms, process={:.1}ms, output={:.1}ms, total={:.1}ms, fps={:.1}, dropped={}",
                frame_count,
                avg_source_ms,
                avg_process_ms,
                avg_output_ms,
                total_ms,
                actual_fps,
                dropped_count
            );
            if let Some(attributes) = pipeline.attributes() {
                tracing::debug!("Attributes: {}", attributes);
            }
        }

        // Frame rate limiting
        let elapsed = loop_start.elapsed();
        if elapsed < frame_duration {
            std::thread::sleep(frame_duration - elapsed);
        }
    }
}
