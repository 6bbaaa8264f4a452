use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use crossbeam_channel::RecvTimeoutError;

use onair::{
    AppConfig, Compositor, DirStore, Profile, ProtocolSession, SourceKind, Studio, TickOutcome,
    acquire_local_image, drain_events, init_logging, load_profile_into,
};

#[derive(Parser, Debug)]
#[command(name = "onair", version)]
struct Cli {
    /// Config file (defaults to `$XDG_CONFIG_HOME/onair/config.json`).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render the program scene of a profile as a PNG.
    Frame(FrameArgs),
    /// Speak the obs-websocket protocol as line-delimited JSON over stdin/stdout.
    Protocol(ProtocolArgs),
}

#[derive(Parser, Debug)]
struct ProfileSource {
    /// Profile JSON file.
    #[arg(long = "profile", conflicts_with = "key")]
    path: Option<PathBuf>,

    /// Key in the configured profile directory.
    #[arg(long)]
    key: Option<String>,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    #[command(flatten)]
    profile: ProfileSource,

    /// Scene to render instead of the saved program scene.
    #[arg(long)]
    scene: Option<String>,

    /// Draw selection and grid overlays.
    #[arg(long)]
    overlays: bool,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct ProtocolArgs {
    #[command(flatten)]
    profile: ProfileSource,

    /// Directory finished recordings are written to.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    };
    init_logging(&config.logging);
    match cli.cmd {
        Command::Frame(args) => cmd_frame(&config, args),
        Command::Protocol(args) => cmd_protocol(&config, args),
    }
}

/// Build a studio from `--profile`/`--key`, resolving local image sources synchronously.
/// Capture sources stay content-less: there are no devices on the command line.
fn open_studio(config: &AppConfig, source: &ProfileSource) -> anyhow::Result<Studio> {
    let mut studio = Studio::new();
    let requests = match (&source.path, &source.key) {
        (Some(path), _) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("read profile '{}'", path.display()))?;
            studio.load_profile(Profile::from_json(&json)?)?
        }
        (None, Some(key)) => {
            let store = DirStore::new(&config.profile_dir);
            load_profile_into(&mut studio, &store, key)?
        }
        (None, None) => Vec::new(),
    };
    studio.take_acquisition_requests();
    for request in requests.iter().filter(|r| r.kind == SourceKind::Image) {
        if let Err(e) = studio.resolve_acquisition(acquire_local_image(request)) {
            tracing::warn!(source = %request.ticket.source, error = %e, "image not loaded");
        }
    }
    Ok(studio)
}

fn cmd_frame(config: &AppConfig, args: FrameArgs) -> anyhow::Result<()> {
    let mut studio = open_studio(config, &args.profile)?;
    if let Some(name) = &args.scene {
        let id = studio
            .scenes()
            .by_name(name)
            .map(|s| s.id.clone())
            .with_context(|| format!("no scene named '{name}'"))?;
        studio.switch_scene(&id, false, 0.0)?;
    }

    let mut compositor = Compositor::new();
    compositor.set_show_overlays(args.overlays);
    let report = match compositor.tick(&mut studio, 0.0) {
        TickOutcome::Rendered(report) => report,
        other => anyhow::bail!("no frame rendered: {other:?}"),
    };
    for fault in &report.faults {
        eprintln!("skipped source {}: {}", fault.source, fault.error);
    }

    let frame = match args.overlays {
        true => compositor.display_frame(),
        false => compositor.program_frame(),
    };
    let frame = frame.context("compositor produced no frame")?;
    let png = onair::assets::media::encode_png(frame)?;
    write_file(&args.out, &png)?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn write_file(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(path, bytes).with_context(|| format!("write '{}'", path.display()))
}

fn cmd_protocol(config: &AppConfig, args: ProtocolArgs) -> anyhow::Result<()> {
    let mut studio = open_studio(config, &args.profile)?;
    let mut compositor = Compositor::new();
    let mut session = ProtocolSession::new();
    let started = Instant::now();
    let now_ms = || started.elapsed().as_secs_f64() * 1000.0;

    // stdin blocks, so lines arrive over a channel and the render clock keeps running between them
    let (line_tx, line_rx) = crossbeam_channel::unbounded::<std::io::Result<String>>();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            if line_tx.send(line).is_err() {
                break;
            }
        }
    });

    let mut out = std::io::stdout().lock();
    writeln!(out, "{}", session.hello().to_json()?)?;
    out.flush()?;

    loop {
        let period = Duration::from_secs_f64(1.0 / f64::from(studio.settings().frame_rate.max(1)));
        let line = match line_rx.recv_timeout(period) {
            Ok(line) => Some(line.context("read stdin")?),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => break,
        };
        compositor.tick(&mut studio, now_ms());
        if let Some(line) = line.filter(|l| !l.trim().is_empty()) {
            match session.handle_text(&mut studio, &line, now_ms()) {
                Ok(replies) => {
                    for reply in replies {
                        writeln!(out, "{reply}")?;
                    }
                }
                Err(e) => tracing::warn!(error = %e, "message rejected"),
            }
            compositor.tick(&mut studio, now_ms());
        }
        for event in drain_events(&mut studio) {
            writeln!(out, "{}", event.to_json()?)?;
        }
        out.flush()?;
        save_recordings(&mut studio, &args.out_dir)?;
    }

    if studio.recorder().is_active() {
        studio.finish_recording()?;
    }
    for event in drain_events(&mut studio) {
        writeln!(out, "{}", event.to_json()?)?;
    }
    out.flush()?;
    save_recordings(&mut studio, &args.out_dir)
}

fn save_recordings(studio: &mut Studio, dir: &Path) -> anyhow::Result<()> {
    for file in studio.take_recordings() {
        let path = dir.join(&file.file_name);
        write_file(&path, &file.bytes)?;
        tracing::info!(path = %path.display(), bytes = file.bytes.len(), "recording saved");
    }
    Ok(())
}
