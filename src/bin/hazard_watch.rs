//! hazard_watch - live dangerous-object monitor
//!
//! This binary:
//! 1. Loads the configured detector backend and scans its class table
//! 2. Opens the camera (fails fast with guidance if it cannot)
//! 3. Runs the capture/detect/display loop until quit, interrupt, or capture failure
//! 4. Releases the camera and window and prints the session summary

use anyhow::{Context, Result};
use clap::Parser;
use std::io::IsTerminal;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use hazard_watch::config::WatchConfig;
use hazard_watch::detect::{open_backend, InferenceAdapter};
use hazard_watch::display::{DisplaySurface, HeadlessDisplay};
use hazard_watch::ui::{Ui, UiMode};
use hazard_watch::{CameraConfig, CameraSource, Command, Monitor};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Run without a window (no keyboard commands; stop with Ctrl-C).
    #[arg(long)]
    headless: bool,
    /// Stop after this many frames.
    #[arg(long)]
    max_frames: Option<u64>,
    /// Startup output style: auto, plain, or pretty.
    #[arg(long)]
    ui: Option<String>,
}

fn main() -> Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut cfg = WatchConfig::load()?;
    if args.headless {
        cfg.display.headless = true;
    }
    let ui = Ui::new(UiMode::parse(args.ui.as_deref()), std::io::stderr().is_terminal());
    let interrupt = install_interrupt_handler()?;

    print_banner();

    let adapter = {
        let stage = ui.stage("load detector");
        match open_backend(&cfg.detector, &cfg.camera).and_then(|backend| {
            let mut adapter = InferenceAdapter::new(backend, cfg.detector.confidence_threshold);
            adapter.warm_up()?;
            Ok(adapter)
        }) {
            Ok(adapter) => adapter,
            Err(err) => {
                stage.fail("detector unavailable");
                return Err(err);
            }
        }
    };
    log::info!(
        "detector backend={} threshold={:.2} danger_ids={:?}",
        adapter.backend_name(),
        adapter.confidence_threshold(),
        adapter.danger_ids()
    );
    for alert in adapter.watched_alerts() {
        println!("  watching for: {alert}");
    }
    print_controls();

    let camera_config = CameraConfig {
        device: cfg.camera.device.clone(),
        width: cfg.camera.width,
        height: cfg.camera.height,
    };
    let camera = {
        let stage = ui.stage("open camera");
        match CameraSource::open(camera_config) {
            Ok(camera) => camera,
            Err(err) => {
                stage.fail("camera unavailable");
                log::error!("{:#}", err);
                print_camera_guidance(&cfg.camera.device);
                return Ok(ExitCode::FAILURE);
            }
        }
    };
    println!("Camera active - starting detection...\n");

    let display = open_display(&cfg)?;

    let mut monitor = Monitor::new(camera, display, adapter)
        .with_screenshot_dir(cfg.screenshot_dir.clone())
        .with_interrupt(interrupt)
        .with_frame_limit(args.max_frames);

    let outcome = monitor.run();
    let summary = monitor.shutdown();
    println!("\n{summary}");

    let reason = outcome?;
    log::info!(
        "session ended: {:?} after {} frames",
        reason,
        monitor.frames_processed()
    );
    Ok(ExitCode::SUCCESS)
}

/// Route Ctrl-C into a flag the monitor checks once per frame.
fn install_interrupt_handler() -> Result<Arc<AtomicBool>> {
    let interrupt = Arc::new(AtomicBool::new(false));
    ctrlc::set_handler({
        let interrupt = interrupt.clone();
        move || interrupt.store(true, Ordering::SeqCst)
    })
    .context("failed to install Ctrl-C handler")?;
    Ok(interrupt)
}

fn open_display(cfg: &WatchConfig) -> Result<Box<dyn DisplaySurface>> {
    if cfg.display.headless {
        return Ok(Box::new(HeadlessDisplay::new()));
    }
    open_window(cfg)
}

#[cfg(feature = "display-minifb")]
fn open_window(cfg: &WatchConfig) -> Result<Box<dyn DisplaySurface>> {
    let window = hazard_watch::display::WindowDisplay::open(
        &cfg.display.window_title,
        cfg.camera.width,
        cfg.camera.height,
    )?;
    Ok(Box::new(window))
}

#[cfg(not(feature = "display-minifb"))]
fn open_window(_cfg: &WatchConfig) -> Result<Box<dyn DisplaySurface>> {
    log::warn!("built without the display-minifb feature; running headless");
    Ok(Box::new(HeadlessDisplay::new()))
}

fn print_banner() {
    let rule = "=".repeat(70);
    println!("{rule}");
    println!("HAZARD WATCH - live dangerous-object monitor");
    println!("{rule}");
}

fn print_controls() {
    let rule = "=".repeat(70);
    println!("\n{rule}");
    println!("CONTROLS:");
    for command in Command::ALL {
        println!("   '{}' -> {}", command.key(), command.description());
    }
    println!("{rule}\n");
}

fn print_camera_guidance(device: &str) {
    println!("ERROR: could not open camera {device}");
    println!("\nThings to check:");
    println!("   1. The webcam is plugged in and shows up under /dev/video*");
    println!("   2. No other application (video calls, browsers) is holding the camera");
    println!("   3. Your user can read the device (e.g. member of the 'video' group)");
}
