use std::{
    path::{Path, PathBuf},
    sync::atomic::AtomicBool,
    time::UNIX_EPOCH,
};

use anyhow::Context as _;
use clap::{ArgAction, Parser, Subcommand};

use glyphcast::{
    BatchJob, BatchOptions, Charset, ConvertSettings, FfmpegFrameSource, FrameCache,
    FrameSource, FsCacheDirectory, GlyphcastResult, ImageSequenceSource, JobOutcome,
};

#[derive(Parser, Debug)]
#[command(name = "glyphcast", version)]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert image-sequence directories or video files into `.ascache` files.
    Convert(ConvertArgs),
    /// List stored caches, newest first.
    List(ListArgs),
    /// Print one frame of a stored cache.
    Show(ShowArgs),
    /// Delete a stored cache.
    Delete(DeleteArgs),
}

#[derive(Parser, Debug)]
struct ConvertArgs {
    /// Input directory of frame images, or a video file (requires `media-ffmpeg`).
    #[arg(long = "in", required = true, num_args = 1..)]
    inputs: Vec<PathBuf>,

    /// Directory holding `.ascache` files.
    #[arg(long)]
    cache_dir: PathBuf,

    /// Video id to save under (single input only). Defaults to the input's file name.
    #[arg(long)]
    id: Option<String>,

    /// Settings JSON file; flags below override its values.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Glyph columns per frame.
    #[arg(long)]
    columns: Option<u32>,

    /// Brightness multiplier in [0, 2].
    #[arg(long)]
    brightness: Option<f64>,

    /// Glyph ramp: standard, detailed, blocks or minimal.
    #[arg(long)]
    charset: Option<String>,

    /// Capture spacing in milliseconds.
    #[arg(long)]
    interval_ms: Option<u32>,

    /// Convert inputs concurrently.
    #[arg(long, default_value_t = false)]
    parallel: bool,

    /// Worker threads for parallel conversion.
    #[arg(long)]
    threads: Option<usize>,

    /// Leave inputs that already have a cache untouched.
    #[arg(long, default_value_t = false)]
    skip_existing: bool,
}

#[derive(Parser, Debug)]
struct ListArgs {
    /// Directory holding `.ascache` files.
    #[arg(long)]
    cache_dir: PathBuf,

    /// Print the listing as JSON.
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Parser, Debug)]
struct ShowArgs {
    /// Directory holding `.ascache` files.
    #[arg(long)]
    cache_dir: PathBuf,

    /// Video id of the cache.
    #[arg(long)]
    id: String,

    /// Playback time in milliseconds.
    #[arg(long, default_value_t = 0.0)]
    at: f64,

    /// Emit 24-bit color escapes.
    #[arg(long, default_value_t = false)]
    color: bool,
}

#[derive(Parser, Debug)]
struct DeleteArgs {
    /// Directory holding `.ascache` files.
    #[arg(long)]
    cache_dir: PathBuf,

    /// Video id of the cache.
    #[arg(long)]
    id: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match cli.cmd {
        Command::Convert(args) => cmd_convert(args),
        Command::List(args) => cmd_list(args),
        Command::Show(args) => cmd_show(args),
        Command::Delete(args) => cmd_delete(args),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .init();
}

fn cmd_convert(args: ConvertArgs) -> anyhow::Result<()> {
    if args.id.is_some() && args.inputs.len() > 1 {
        anyhow::bail!("--id can only be used with a single --in");
    }

    let mut settings = match &args.settings {
        Some(path) => ConvertSettings::from_path(path)?,
        None => ConvertSettings::default(),
    };
    if let Some(columns) = args.columns {
        settings.num_columns = columns;
    }
    if let Some(brightness) = args.brightness {
        settings.brightness = brightness;
    }
    if let Some(key) = &args.charset {
        settings.charset = Charset::from_key(key);
    }
    if let Some(interval_ms) = args.interval_ms {
        settings.frame_interval_ms = interval_ms;
    }
    let settings = settings.normalized();

    let mut jobs = Vec::with_capacity(args.inputs.len());
    for input in &args.inputs {
        let video_id = match &args.id {
            Some(id) => id.clone(),
            None => default_video_id(input)?,
        };
        if !input.exists() {
            anyhow::bail!("input '{}' does not exist", input.display());
        }
        let input = input.clone();
        let interval_ms = settings.frame_interval_ms;
        jobs.push(BatchJob::new(video_id, move || open_source(&input, interval_ms)));
    }

    let dir = FsCacheDirectory::new(&args.cache_dir);
    let opts = BatchOptions {
        parallel: args.parallel,
        threads: args.threads,
        skip_existing: args.skip_existing,
    };
    let cancel = AtomicBool::new(false);
    let report = glyphcast::convert_batch(jobs, &dir, &settings, &opts, &cancel)?;

    let mut failed = 0usize;
    for (video_id, outcome) in &report.outcomes {
        match outcome {
            JobOutcome::Converted { frames } => {
                eprintln!("converted {video_id} ({frames} frames)");
            }
            JobOutcome::Skipped => eprintln!("skipped {video_id} (cache exists)"),
            JobOutcome::Cancelled => eprintln!("cancelled {video_id}"),
            JobOutcome::Failed(msg) => {
                failed += 1;
                eprintln!("failed {video_id}: {msg}");
            }
        }
    }
    if failed > 0 {
        anyhow::bail!("{failed} of {} conversions failed", report.outcomes.len());
    }
    Ok(())
}

fn default_video_id(input: &Path) -> anyhow::Result<String> {
    input
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .with_context(|| format!("cannot derive a video id from '{}'", input.display()))
}

fn open_source(input: &Path, interval_ms: u32) -> GlyphcastResult<Box<dyn FrameSource + Send>> {
    if input.is_dir() {
        let source = ImageSequenceSource::from_dir(input, interval_ms)?;
        return Ok(Box::new(source));
    }
    let source = FfmpegFrameSource::open(input, interval_ms)?;
    Ok(Box::new(source))
}

fn cmd_list(args: ListArgs) -> anyhow::Result<()> {
    let cache = FrameCache::new(FsCacheDirectory::new(&args.cache_dir));
    let infos = cache.list_cached_videos_with_info()?;

    if args.json {
        let out = serde_json::to_string_pretty(&infos).context("serialize cache listing")?;
        println!("{out}");
        return Ok(());
    }

    for info in &infos {
        let modified = info
            .modified_at
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs().to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{}\t{}\t{} frames\t{} cols\t{} bytes\t{}",
            info.video_id,
            info.display_name,
            info.frame_count,
            info.num_columns,
            info.file_size_bytes,
            modified
        );
    }
    Ok(())
}

fn cmd_show(args: ShowArgs) -> anyhow::Result<()> {
    let mut cache = FrameCache::new(FsCacheDirectory::new(&args.cache_dir));
    cache.load(&args.id)?;

    let charset = cache
        .store()
        .metadata()
        .map(|m| m.charset)
        .unwrap_or_default();
    let frame = cache
        .frame_at_time(args.at)
        .with_context(|| format!("cache '{}' holds no frames", args.id))?;

    let text = if args.color {
        glyphcast::render_ansi(frame, charset)
    } else {
        glyphcast::render_text(frame, charset)
    };
    println!("{text}");
    Ok(())
}

fn cmd_delete(args: DeleteArgs) -> anyhow::Result<()> {
    let cache = FrameCache::new(FsCacheDirectory::new(&args.cache_dir));
    if cache.delete(&args.id)? {
        eprintln!("deleted {}", args.id);
    } else {
        eprintln!("no cache for {}", args.id);
    }
    Ok(())
}
