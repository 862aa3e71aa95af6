use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use blackbox_render::config::{LayoutConfig, Presets};
use blackbox_render::export::{
    BackgroundVideo, ExportEvent, ExportFormat, ExportJob, ExportRequest, ExportSettings, FfmpegVideo,
    ProgressEstimate, SizeEstimateFilter, is_ffmpeg_on_path,
};
use blackbox_render::graph::GraphConfig;
use blackbox_render::render::{Background, CpuBackend, Grapher, GrapherOptions, RasterBackend};
use blackbox_render::telemetry::{
    CsvOptions, FieldCatalog, TelemetrySource, friendly_field_name, load_csv,
};
use blackbox_render::{
    Canvas, MICROS_PER_SEC, Micros, format_filesize, format_time, set_file_extension,
};

#[derive(Parser, Debug)]
#[command(name = "blackbox-render", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the fields and time range of a log.
    Info(InfoArgs),
    /// Render the graphs at one moment as a PNG.
    Frame(FrameArgs),
    /// Export a time range to video (requires `ffmpeg` on PATH) or a PNG sequence.
    Export(ExportArgs),
}

#[derive(Parser, Debug)]
struct LogArgs {
    /// Decoded blackbox CSV.
    #[arg(long)]
    log: PathBuf,

    /// Graph configuration JSON. Defaults to motor/servo/gyro tracks for the log.
    #[arg(long)]
    graphs: Option<PathBuf>,

    /// Display layout JSON.
    #[arg(long)]
    layout: Option<PathBuf>,

    /// Saved layout presets JSON; the active (or `--layout-preset`) preset is used.
    #[arg(long, conflicts_with = "layout")]
    layout_presets: Option<PathBuf>,

    /// Layout preset name within `--layout-presets`.
    #[arg(long, requires = "layout_presets")]
    layout_preset: Option<String>,

    /// TTF/OTF font for labels. Labels are skipped without one.
    #[arg(long)]
    font: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct InfoArgs {
    /// Decoded blackbox CSV.
    #[arg(long)]
    log: PathBuf,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    #[command(flatten)]
    log: LogArgs,

    /// Seconds from the start of the log.
    #[arg(long, default_value_t = 0.0)]
    at: f64,

    #[arg(long, default_value_t = 1280)]
    width: u32,

    #[arg(long, default_value_t = 720)]
    height: u32,

    /// Horizontal zoom factor; 2 shows half a second.
    #[arg(long, default_value_t = 1.0)]
    zoom: f64,

    /// Leave the background transparent.
    #[arg(long, default_value_t = false)]
    transparent: bool,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatArg {
    Webm,
    Mp4,
    Png,
}

impl From<FormatArg> for ExportFormat {
    fn from(f: FormatArg) -> Self {
        match f {
            FormatArg::Webm => Self::Webm,
            FormatArg::Mp4 => Self::Mp4,
            FormatArg::Png => Self::Png,
        }
    }
}

#[derive(Parser, Debug)]
struct ExportArgs {
    #[command(flatten)]
    log: LogArgs,

    /// Export settings JSON; flags below override it.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Output path. For PNG sequences, frames are named `<base>-NNNNNNN<ext>`.
    #[arg(long)]
    out: PathBuf,

    /// Start, in seconds from the start of the log.
    #[arg(long = "in")]
    in_secs: Option<f64>,

    /// End, in seconds from the start of the log.
    #[arg(long = "to")]
    out_secs: Option<f64>,

    #[arg(long, value_enum)]
    format: Option<FormatArg>,

    #[arg(long)]
    fps: Option<u32>,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,

    /// Background flight video.
    #[arg(long)]
    video: Option<PathBuf>,

    /// Video seconds at the start of the log.
    #[arg(long, default_value_t = 0.0)]
    video_offset: f64,

    /// Darkening over the video, 0..=1.
    #[arg(long)]
    dim: Option<f64>,
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
        Command::Info(args) => cmd_info(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Export(args) => cmd_export(args),
    }
}

fn load_source(path: &Path) -> anyhow::Result<Arc<dyn TelemetrySource>> {
    let log = load_csv(path, &CsvOptions::default())
        .with_context(|| format!("load log '{}'", path.display()))?;
    Ok(Arc::new(log))
}

fn graph_config(args: &LogArgs, source: &dyn TelemetrySource) -> anyhow::Result<GraphConfig> {
    match &args.graphs {
        Some(path) => GraphConfig::load(path)
            .with_context(|| format!("load graph config '{}'", path.display())),
        None => {
            let catalog = FieldCatalog::build(source.field_names());
            Ok(GraphConfig::default_for(&catalog, &source.sys_config()))
        }
    }
}

fn layout_config(args: &LogArgs) -> anyhow::Result<LayoutConfig> {
    if let Some(path) = &args.layout {
        return LayoutConfig::load(path)
            .with_context(|| format!("load layout '{}'", path.display()));
    }
    let Some(path) = &args.layout_presets else {
        return Ok(LayoutConfig::default());
    };
    let mut presets = Presets::<LayoutConfig>::new();
    presets
        .load(path, true)
        .with_context(|| format!("load layout presets '{}'", path.display()))?;
    if let Some(name) = &args.layout_preset {
        let preset = presets
            .get(name)
            .with_context(|| format!("no layout preset named '{name}'"))?;
        return Ok(preset.content.clone());
    }
    Ok(presets.active_content().cloned().unwrap_or_default())
}

fn backend(font: Option<&Path>) -> anyhow::Result<CpuBackend> {
    match font {
        Some(path) => {
            let bytes =
                std::fs::read(path).with_context(|| format!("read font '{}'", path.display()))?;
            Ok(CpuBackend::with_font(bytes)?)
        }
        None => Ok(CpuBackend::new()),
    }
}

fn log_time(source: &dyn TelemetrySource, secs: f64) -> Micros {
    source.min_time() + (secs * MICROS_PER_SEC).round() as Micros
}

fn cmd_info(args: InfoArgs) -> anyhow::Result<()> {
    let source = load_source(&args.log)?;
    let (min, max) = (source.min_time(), source.max_time());
    println!("log:      {}", args.log.display());
    println!(
        "duration: {}",
        format_time((max - min) as f64 / 1000.0, true, true)
    );
    println!("time:     {min} .. {max} us");
    println!("fields:   {}", source.field_names().len());
    for (i, name) in source.field_names().iter().enumerate() {
        let friendly = friendly_field_name(name);
        if friendly == *name {
            println!("  {i:>3} {name}");
        } else {
            println!("  {i:>3} {name} ({friendly})");
        }
    }
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let source = load_source(&args.log.log)?;
    let config = graph_config(&args.log, source.as_ref())?;
    let layout = layout_config(&args.log)?;
    let canvas = Canvas::new(args.width, args.height)?;

    let mut grapher = Grapher::new(
        source.clone(),
        &config,
        canvas,
        GrapherOptions {
            gapless: false,
            background: if args.transparent {
                Background::Clear
            } else {
                Background::Fill
            },
            layout,
        },
    );
    for issue in &grapher.resolution().issues {
        tracing::warn!(?issue, "graph config issue");
    }
    grapher.set_graph_zoom(args.zoom);

    let mut backend = backend(args.log.font.as_deref())?;
    let scene = grapher.render(log_time(source.as_ref(), args.at));
    let frame = backend.render_scene(scene)?;

    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    image::save_buffer_with_format(
        &args.out,
        &frame.to_straight_rgba8(),
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_export(args: ExportArgs) -> anyhow::Result<()> {
    let source = load_source(&args.log.log)?;

    let mut settings = match &args.settings {
        Some(path) => {
            let s = std::fs::read_to_string(path)
                .with_context(|| format!("read export settings '{}'", path.display()))?;
            ExportSettings::from_json_str(&s)?
        }
        None => ExportSettings::default(),
    };
    if let Some(f) = args.format {
        settings.format = f.into();
    }
    if let Some(fps) = args.fps {
        settings.frame_rate = fps;
    }
    if let Some(w) = args.width {
        settings.width = w;
    }
    if let Some(h) = args.height {
        settings.height = h;
    }
    if let Some(dim) = args.dim {
        settings.video_dim = dim;
    }

    if settings.format.is_container() && !is_ffmpeg_on_path() {
        anyhow::bail!("ffmpeg is required for {} export", settings.format.extension());
    }

    // A bare container name gets the format's extension so players recognise the file.
    let out = if settings.format.is_container() && args.out.extension().is_none() {
        set_file_extension(&args.out, &format!(".{}", settings.format.extension()))?
    } else {
        args.out.clone()
    };

    let mut request = ExportRequest::new(graph_config(&args.log, source.as_ref())?, &out);
    request.layout = layout_config(&args.log)?;
    request.in_time = args.in_secs.map(|s| log_time(source.as_ref(), s));
    request.out_time = args.out_secs.map(|s| log_time(source.as_ref(), s));
    request.video_offset = args.video_offset;
    request.settings = settings;

    let video = match &args.video {
        Some(path) if request.settings.video_dim < 1.0 => {
            let v = FfmpegVideo::open(path, request.settings.width, request.settings.height)
                .with_context(|| format!("open video '{}'", path.display()))?;
            Some(Box::new(v) as Box<dyn BackgroundVideo>)
        }
        _ => None,
    };

    let backend: Box<dyn RasterBackend> = Box::new(backend(args.log.font.as_deref())?);
    let mut job = ExportJob::new(source, &request, request.open_sink(), backend, video)?;

    let started = Instant::now();
    let mut last_decile = 0;
    let mut sizes = SizeEstimateFilter::default();
    job.subscribe(move |event| match *event {
        ExportEvent::Progress {
            frame_index,
            frame_count,
            bytes_written,
        } => {
            let est = ProgressEstimate::new(frame_index, frame_count, bytes_written, started.elapsed());
            let decile = (est.percent / 10.0) as u32;
            if decile > last_decile {
                last_decile = decile;
                tracing::info!(
                    frames = %format!("{}/{}", est.frames_done, est.frame_count),
                    percent = %format!("{:.1}", est.percent),
                    remaining = ?est.remaining,
                    "rendering"
                );
            }
            if let Some(bytes) = sizes.update(&est, bytes_written) {
                tracing::debug!(estimate = %format_filesize(bytes), "output size");
            }
        }
        ExportEvent::Complete { .. } => {}
    });

    let outcome = job.run();
    if let Some(err) = job.error() {
        anyhow::bail!("export failed after {} frames: {err}", outcome.frames);
    }
    eprintln!("wrote {} frames to {}", outcome.frames, out.display());
    Ok(())
}
