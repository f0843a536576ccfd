use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use phasewarp::{
    FfmpegSink, FfmpegSinkOpts, FrameSink, Layout, MemoryVideoSource, Resolution, Session,
    SessionConfig, SessionMode, SinkConfig, TemplateKind, VideoSource, upscale_to_display,
};

#[derive(Parser, Debug)]
#[command(name = "phasewarp", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Capture, play back and encode the output as MP4 (requires `ffmpeg` on PATH).
    Render(RenderArgs),
    /// Capture, play back and write the presented frame as a PNG.
    Frame(FrameArgs),
    /// Print the layout and ring length a configuration yields for a native size.
    Status(StatusArgs),
}

#[derive(Args, Debug)]
struct PipelineArgs {
    /// Input video file, or a directory of PNG frames.
    #[arg(long)]
    video: PathBuf,

    /// Session configuration JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Fill the control field from a template before painting strokes.
    #[arg(long)]
    template: Option<TemplateKind>,

    /// Brush stroke in processing pixels as `x,y,radius,gray`. Repeatable.
    #[arg(long = "stroke", value_parser = parse_stroke)]
    strokes: Vec<Stroke>,

    /// Simulated render-loop rate.
    #[arg(long, default_value_t = 60)]
    tick_fps: u32,

    /// Playback ticks to run after capture.
    #[arg(long, default_value_t = 120)]
    ticks: u64,
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[command(flatten)]
    pipeline: PipelineArgs,

    /// Output MP4 path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct FrameArgs {
    #[command(flatten)]
    pipeline: PipelineArgs,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Write at processing resolution instead of upscaling to the display size.
    #[arg(long)]
    processing_size: bool,
}

#[derive(Args, Debug)]
struct StatusArgs {
    /// Session configuration JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Native video width.
    #[arg(long)]
    width: Option<u32>,

    /// Native video height.
    #[arg(long)]
    height: Option<u32>,
}

#[derive(Clone, Copy, Debug)]
struct Stroke {
    x: f64,
    y: f64,
    radius: f64,
    gray: i32,
}

fn parse_stroke(s: &str) -> Result<Stroke, String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    let [x, y, r, g] = parts.as_slice() else {
        return Err(format!("expected x,y,radius,gray, got '{s}'"));
    };
    let num = |v: &str| v.parse::<f64>().map_err(|e| format!("'{v}': {e}"));
    Ok(Stroke {
        x: num(x)?,
        y: num(y)?,
        radius: num(r)?,
        gray: g.parse::<i32>().map_err(|e| format!("'{g}': {e}"))?,
    })
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Status(args) => cmd_status(args),
    }
}

fn read_config(path: Option<&Path>) -> anyhow::Result<SessionConfig> {
    match path {
        Some(p) => Ok(SessionConfig::from_path(p)?),
        None => Ok(SessionConfig::default()),
    }
}

fn cmd_status(args: StatusArgs) -> anyhow::Result<()> {
    let cfg = read_config(args.config.as_deref())?;
    let native = match (args.width, args.height) {
        (Some(w), Some(h)) => Some(Resolution::new(w, h)?),
        (None, None) => None,
        _ => anyhow::bail!("--width and --height must be given together"),
    };
    let layout = Layout::derive(native, cfg.max_display_width);
    let report = serde_json::json!({
        "layout": layout,
        "target": cfg.target_len(),
        "capture_interval_ms": cfg.capture_interval().as_secs_f64() * 1000.0,
        "config": cfg,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let session = run_pipeline(&args.pipeline, |_, _| Ok(()))?;
    let layout = session
        .layout()
        .context("session has no loaded video")?;
    let frame = session
        .display_frame()?
        .context("session has no frame to present")?;
    let frame = if args.processing_size {
        frame
    } else {
        upscale_to_display(&frame, layout.display)?
    };

    phasewarp::ensure_parent_dir(&args.out)?;
    frame
        .to_rgba_image()?
        .save_with_format(&args.out, image::ImageFormat::Png)
        .with_context(|| format!("write png '{}'", args.out.display()))?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new(&args.out));
    let mut started = false;
    run_pipeline(&args.pipeline, |idx, session| {
        let frame = session.output().context("session has no output")?;
        if !started {
            sink.begin(SinkConfig {
                res: frame.resolution(),
                fps: args.pipeline.tick_fps,
            })?;
            started = true;
        }
        sink.push_frame(idx, frame)?;
        Ok(())
    })?;
    if started {
        sink.end()?;
    }
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

/// Load, paint, capture, then run `ticks` playback ticks, handing each presented frame to
/// `on_frame`. Timestamps are synthetic and advance by one tick period per iteration.
fn run_pipeline(
    args: &PipelineArgs,
    mut on_frame: impl FnMut(u64, &Session) -> anyhow::Result<()>,
) -> anyhow::Result<Session> {
    if args.tick_fps == 0 {
        anyhow::bail!("--tick-fps must be > 0");
    }
    let cfg = read_config(args.config.as_deref())?;
    let source = open_source(&args.video, cfg.capture_fps)?;

    let mut session = Session::new(cfg)?;
    session.load_video(source);
    if let Some(kind) = args.template {
        session.apply_template(kind);
    }
    for s in &args.strokes {
        session.paint_stroke(s.x, s.y, s.radius, s.gray);
    }

    let period = Duration::from_nanos(1_000_000_000u64.div_ceil(u64::from(args.tick_fps)));
    // Two seconds without a new frame means the source has stalled.
    let stall_ticks = u64::from(args.tick_fps) * 2;
    let mut now = Duration::ZERO;
    let mut idle = 0u64;

    session.play();
    while session.mode() == SessionMode::Capturing {
        let report = session.tick(now);
        now += period;
        if report.captured_slot.is_some() {
            idle = 0;
        } else {
            idle += 1;
        }
        if idle > stall_ticks {
            tracing::warn!("no frames arriving; ending capture");
            session.end_capture();
        }
    }
    if session.mode() != SessionMode::Playing {
        anyhow::bail!(
            "capture produced {} frame(s); at least 2 are needed for playback",
            session.status().captured
        );
    }
    tracing::info!(
        frames = session.status().captured,
        ticks = args.ticks,
        "playing back"
    );

    for idx in 0..args.ticks {
        session.tick(now);
        now += period;
        on_frame(idx, &session)?;
    }
    Ok(session)
}

fn open_source(path: &Path, sample_fps: u32) -> anyhow::Result<Box<dyn VideoSource>> {
    if path.is_dir() {
        return Ok(Box::new(read_png_dir(path)?));
    }
    open_video_file(path, sample_fps)
}

#[cfg(feature = "media-ffmpeg")]
fn open_video_file(path: &Path, sample_fps: u32) -> anyhow::Result<Box<dyn VideoSource>> {
    Ok(Box::new(phasewarp::FfmpegVideoSource::open(
        path, sample_fps,
    )?))
}

#[cfg(not(feature = "media-ffmpeg"))]
fn open_video_file(path: &Path, _sample_fps: u32) -> anyhow::Result<Box<dyn VideoSource>> {
    anyhow::bail!(
        "decoding '{}' requires the `media-ffmpeg` feature; pass a directory of PNG frames instead",
        path.display()
    )
}

fn read_png_dir(dir: &Path) -> anyhow::Result<MemoryVideoSource> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("read frame dir '{}'", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
        })
        .collect();
    paths.sort();
    if paths.is_empty() {
        anyhow::bail!("no PNG frames in '{}'", dir.display());
    }
    let frames = paths
        .iter()
        .map(|p| {
            image::open(p)
                .map(|img| img.to_rgba8())
                .with_context(|| format!("decode frame '{}'", p.display()))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok(MemoryVideoSource::new(frames)?)
}
