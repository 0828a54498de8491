use std::path::PathBuf;
use std::sync::atomic::AtomicBool;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};

mod decode;
mod png_sink;

#[derive(Parser, Debug)]
#[command(name = "gifbeat", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Reconstruct a single output sample as a PNG.
    Frame(FrameArgs),
    /// Reconstruct every output sample as a numbered PNG sequence.
    Export(ExportArgs),
}

#[derive(Args, Debug)]
struct PlaybackArgs {
    /// Input animated GIF.
    #[arg(long)]
    gif: PathBuf,

    /// Export settings JSON; replaces the playback flags below.
    #[arg(long, conflicts_with_all = ["duration", "fps", "frame_duration", "offset"])]
    settings: Option<PathBuf>,

    /// Total playback duration in seconds (normally the audio track length).
    #[arg(long, required_unless_present = "settings")]
    duration: Option<f64>,

    /// Output frames per second.
    #[arg(long, required_unless_present = "settings")]
    fps: Option<u32>,

    /// Seconds each GIF frame is shown.
    #[arg(long, default_value_t = 0.1)]
    frame_duration: f64,

    /// Loop offset in source frames; may be negative.
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    offset: i64,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    #[command(flatten)]
    playback: PlaybackArgs,

    /// Output sample index (0-based).
    #[arg(long)]
    index: u64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct ExportArgs {
    #[command(flatten)]
    playback: PlaybackArgs,

    /// Output directory for the PNG sequence.
    #[arg(long)]
    out_dir: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Export(args) => cmd_export(args),
    }
}

fn open_session(args: &PlaybackArgs) -> anyhow::Result<gifbeat::ExportSession> {
    let gif = decode::read_gif(&args.gif)?;

    let (playback, opts) = match &args.settings {
        Some(path) => {
            let settings = gifbeat::ExportSettings::from_path(path)?;
            if settings.canvas != gif.canvas {
                tracing::warn!(
                    settings = ?settings.canvas,
                    gif = ?gif.canvas,
                    "settings canvas differs from the gif screen size; using the gif's"
                );
            }
            (settings.playback, settings.opts)
        }
        None => {
            let playback = gifbeat::PlaybackParams {
                frame_duration_secs: args.frame_duration,
                offset: args.offset,
                output_fps: gifbeat::Fps::new(args.fps.context("--fps is required")?, 1)?,
                total_duration_secs: args.duration.context("--duration is required")?,
            };
            (playback, gifbeat::ExportOpts::default())
        }
    };

    let session = gifbeat::ExportSession::new(gif.frames, gif.canvas, playback, opts)
        .with_context(|| format!("prepare export for '{}'", args.gif.display()))?;
    Ok(session)
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let session = open_session(&args.playback)?;
    let sample = session.render_sample_at(gifbeat::FrameIndex(args.index))?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    png_sink::write_png(&args.out, &sample.frame)?;

    eprintln!(
        "wrote {} (source frame {}, t={:.6}s)",
        args.out.display(),
        sample.source_index,
        sample.timestamp_secs()
    );
    Ok(())
}

fn cmd_export(args: ExportArgs) -> anyhow::Result<()> {
    let session = open_session(&args.playback)?;
    let mut sink = png_sink::PngSequenceSink::new(&args.out_dir);

    let mut last_pct = None;
    let mut progress = |fraction: f64| {
        let pct = (fraction * 100.0).floor() as u32;
        if last_pct != Some(pct) {
            last_pct = Some(pct);
            eprint!("\rexporting {pct:3}%");
        }
    };
    let outcome = session.run(&mut sink, &mut progress, &AtomicBool::new(false))?;
    eprintln!();

    let stats = outcome.stats();
    eprintln!(
        "wrote {} frames to {} ({} restores, {} clears)",
        sink.written().len(),
        args.out_dir.display(),
        stats.restores,
        stats.clears
    );
    Ok(())
}
