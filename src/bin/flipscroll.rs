use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt};

use flipscroll::{
    FrameIndex, FrameRGBA, FsLoader, ManualScheduler, PlaybackView, SceneConfig, SurfaceSize,
    Tick, TickReport, TickerScheduler, frame_for_progress,
};

#[derive(Parser, Debug)]
#[command(name = "flipscroll", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the frame shown at one scroll position as a PNG.
    Frame(FrameArgs),
    /// Render a scroll sweep to numbered PNGs.
    Scrub(ScrubArgs),
    /// Print the scroll -> frame -> overlay table without loading images.
    Inspect(InspectArgs),
}

#[derive(Parser, Debug)]
struct SceneArgs {
    /// Scene JSON path, or a built-in preset (`hero`, `ring`).
    #[arg(long)]
    scene: String,

    /// Viewport size as WIDTHxHEIGHT.
    #[arg(long, default_value = "1920x1080")]
    viewport: SurfaceSize,

    /// Track height in pixels; defaults to the scene's stage height.
    #[arg(long)]
    track_height: Option<f64>,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    #[command(flatten)]
    scene: SceneArgs,

    /// Directory that frame paths are relative to.
    #[arg(long)]
    assets: PathBuf,

    /// Offset of the track's top edge from the viewport top (negative once scrolled past).
    #[arg(long, allow_hyphen_values = true)]
    scroll: f64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct ScrubArgs {
    #[command(flatten)]
    scene: SceneArgs,

    /// Directory that frame paths are relative to.
    #[arg(long)]
    assets: PathBuf,

    /// Track top offset of the first step.
    #[arg(long, allow_hyphen_values = true)]
    from: f64,

    /// Track top offset of the last step.
    #[arg(long, allow_hyphen_values = true)]
    to: f64,

    /// Number of steps (at least 1).
    #[arg(long, default_value_t = 10)]
    steps: usize,

    /// Output directory for `step-NNNN.png` files.
    #[arg(long)]
    out_dir: PathBuf,

    /// Pace the sweep at this refresh rate instead of as fast as possible.
    #[arg(long)]
    realtime: Option<f64>,
}

#[derive(Parser, Debug)]
struct InspectArgs {
    #[command(flatten)]
    scene: SceneArgs,

    /// Number of evenly spaced samples across the track's full travel.
    #[arg(long, default_value_t = 11)]
    steps: usize,
}

fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Scrub(args) => cmd_scrub(args),
        Command::Inspect(args) => cmd_inspect(args),
    }
}

fn read_scene(name: &str) -> anyhow::Result<SceneConfig> {
    let scene = match SceneConfig::preset(name) {
        Some(scene) => scene,
        None => SceneConfig::from_path(name).with_context(|| format!("load scene '{name}'"))?,
    };
    scene.validate()?;
    Ok(scene)
}

/// Track layout at `top` for the given viewport, honouring a track height override.
fn measure(scene: &SceneConfig, args: &SceneArgs, top: f64) -> flipscroll::Measurement {
    let mut stage = scene.stage;
    if let Some(h) = args.track_height
        && args.viewport.height > 0
    {
        stage.track_height_vh = h * 100.0 / f64::from(args.viewport.height);
    }
    stage.measure(args.viewport, top)
}

fn open_view<S: flipscroll::FrameScheduler>(
    scene: &SceneConfig,
    assets: &Path,
    scheduler: S,
) -> anyhow::Result<PlaybackView<S>> {
    let loader = Arc::new(FsLoader::new(assets));
    let mut view = PlaybackView::new(scene, loader, scheduler, scene.load_opts())?;
    view.mount()?;
    view.wait_loaded();
    if let Some(report) = view.load_report()
        && report.loaded < report.requested
    {
        tracing::warn!(
            loaded = report.loaded,
            requested = report.requested,
            "some frames are missing and will render as background"
        );
    }
    Ok(view)
}

fn write_png(frame: &FrameRGBA, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    let mut data = frame.data.clone();
    if frame.premultiplied {
        unpremultiply_in_place(&mut data);
    }
    image::save_buffer_with_format(
        path,
        &data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", path.display()))
}

fn unpremultiply_in_place(data: &mut [u8]) {
    for px in data.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((u16::from(*c) * 255 + a / 2) / a).min(255) as u8;
        }
    }
}

fn rendered(tick: Tick) -> anyhow::Result<TickReport> {
    match tick {
        Tick::Rendered(report) => Ok(report),
        Tick::Skipped => anyhow::bail!("tick skipped: empty viewport"),
        Tick::NotScheduled => anyhow::bail!("tick was not scheduled (bug)"),
    }
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let scene = read_scene(&args.scene.scene)?;
    let mut view = open_view(&scene, &args.assets, ManualScheduler::new())?;

    let m = measure(&scene, &args.scene, args.scroll);
    let probe = move || Some(m);
    let req = view
        .scheduler_mut()
        .take_due()
        .into_iter()
        .next()
        .context("render loop did not schedule a tick")?;
    let report = rendered(view.on_frame(req, &probe)?)?;

    let frame = view.canvas().snapshot().context("canvas is empty")?;
    write_png(&frame, &args.out)?;
    view.unmount();

    eprintln!(
        "wrote {} (frame {}, progress {:.4})",
        args.out.display(),
        report.frame.0,
        report.progress
    );
    Ok(())
}

fn scrub_top(args: &ScrubArgs, step: usize) -> f64 {
    if args.steps <= 1 {
        return args.from;
    }
    let t = step as f64 / (args.steps - 1) as f64;
    args.from + (args.to - args.from) * t
}

fn cmd_scrub(args: ScrubArgs) -> anyhow::Result<()> {
    anyhow::ensure!(args.steps >= 1, "--steps must be >= 1");
    let scene = read_scene(&args.scene.scene)?;
    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("create output dir '{}'", args.out_dir.display()))?;

    let step = std::cell::Cell::new(0usize);
    let probe = || Some(measure(&scene, &args.scene, scrub_top(&args, step.get())));
    let emit = |frame: Option<FrameRGBA>, report: &TickReport| -> anyhow::Result<()> {
        let frame = frame.context("canvas is empty")?;
        let path = args.out_dir.join(format!("step-{:04}.png", step.get()));
        write_png(&frame, &path)?;
        tracing::info!(
            step = step.get(),
            frame = report.frame.0,
            progress = report.progress,
            drew = report.drew,
            "step rendered"
        );
        step.set(step.get() + 1);
        Ok(())
    };

    match args.realtime {
        Some(hz) => {
            let mut view = open_view(&scene, &args.assets, TickerScheduler::new(hz)?)?;
            while step.get() < args.steps {
                let req = view
                    .scheduler_mut()
                    .wait_next()
                    .context("render loop stopped unexpectedly")?;
                let report = rendered(view.on_frame(req, &probe)?)?;
                emit(view.canvas().snapshot(), &report)?;
            }
            view.unmount();
        }
        None => {
            let mut view = open_view(&scene, &args.assets, ManualScheduler::new())?;
            while step.get() < args.steps {
                let due = view.scheduler_mut().take_due();
                anyhow::ensure!(!due.is_empty(), "render loop stopped unexpectedly");
                for req in due {
                    let report = rendered(view.on_frame(req, &probe)?)?;
                    emit(view.canvas().snapshot(), &report)?;
                }
            }
            view.unmount();
        }
    }

    eprintln!("wrote {} frames to {}", args.steps, args.out_dir.display());
    Ok(())
}

fn cmd_inspect(args: InspectArgs) -> anyhow::Result<()> {
    anyhow::ensure!(args.steps >= 2, "--steps must be >= 2");
    let scene = read_scene(&args.scene.scene)?;
    let overlays = scene.overlay_set()?;
    let frame_count = scene.frame_count();

    // Sample the active range end to end.
    let layout = measure(&scene, &args.scene, 0.0).track;
    let (start, end) = match scene.track {
        flipscroll::TrackMode::Pinned => (0.0, -(layout.height - layout.viewport_height)),
        flipscroll::TrackMode::Reveal => (layout.viewport_height, 0.0),
    };

    let mut rows = Vec::with_capacity(args.steps);
    for i in 0..args.steps {
        let t = i as f64 / (args.steps - 1) as f64;
        let top = start + (end - start) * t;
        let m = measure(&scene, &args.scene, top);
        let progress = scene.track.progress(m.track);
        let frame = frame_for_progress(progress, frame_count).unwrap_or(FrameIndex(0));
        rows.push(serde_json::json!({
            "top": top,
            "progress": progress,
            "frame": frame.0,
            "overlays": overlays.evaluate(frame, frame_count),
        }));
    }

    let out = serde_json::to_string_pretty(&rows).context("serialize inspect table")?;
    println!("{out}");
    Ok(())
}
