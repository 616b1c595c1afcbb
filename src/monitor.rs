//! The monitoring loop.
//!
//! One thread, one frame at a time:
//! capture -> detect -> log + overlay -> display -> poll one key -> repeat.
//!
//! Every way out of `run` (quit key, capture failure, interrupt, frame limit, or
//! an error) is followed by `shutdown`, which releases the source and closes the
//! display exactly once. `Drop` covers callers that never get that far.

use anyhow::Result;
use chrono::Local;
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::controls::{save_screenshot, Command};
use crate::detect::InferenceAdapter;
use crate::display::DisplaySurface;
use crate::frame::{Frame, FrameState};
use crate::ingest::FrameSource;
use crate::overlay::{self, HudStatus};
use crate::session::{format_event, FpsMeter, SessionCounters, SessionSummary};

/// Why the loop stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    Quit,
    CaptureFailed,
    Interrupted,
    FrameLimit,
}

pub struct Monitor<S: FrameSource, D: DisplaySurface> {
    source: S,
    display: D,
    adapter: InferenceAdapter,
    session: SessionCounters,
    fps: FpsMeter,
    screenshot_dir: PathBuf,
    interrupt: Arc<AtomicBool>,
    max_frames: Option<u64>,
    frames_processed: u64,
    released: bool,
}

impl<S: FrameSource, D: DisplaySurface> Monitor<S, D> {
    pub fn new(source: S, display: D, adapter: InferenceAdapter) -> Self {
        Self {
            source,
            display,
            adapter,
            session: SessionCounters::new(),
            fps: FpsMeter::new(),
            screenshot_dir: PathBuf::from("."),
            interrupt: Arc::new(AtomicBool::new(false)),
            max_frames: None,
            frames_processed: 0,
            released: false,
        }
    }

    pub fn with_screenshot_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.screenshot_dir = dir.into();
        self
    }

    /// Flag checked once per iteration; setting it ends the loop.
    pub fn with_interrupt(mut self, interrupt: Arc<AtomicBool>) -> Self {
        self.interrupt = interrupt;
        self
    }

    pub fn with_frame_limit(mut self, max_frames: Option<u64>) -> Self {
        self.max_frames = max_frames;
        self
    }

    pub fn session(&self) -> &SessionCounters {
        &self.session
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    /// Run until a stop condition. Detector and display errors are returned as-is.
    pub fn run(&mut self) -> Result<StopReason> {
        loop {
            if self.interrupt.load(Ordering::SeqCst) {
                println!("\nInterrupt received");
                return Ok(StopReason::Interrupted);
            }
            if self
                .max_frames
                .is_some_and(|max| self.frames_processed >= max)
            {
                log::info!("frame limit of {} reached", self.frames_processed);
                return Ok(StopReason::FrameLimit);
            }

            let frame = match self.source.next_frame() {
                Ok(frame) => frame,
                Err(err) => {
                    println!("Error capturing frame");
                    log::error!("frame capture failed: {:#}", err);
                    return Ok(StopReason::CaptureFailed);
                }
            };

            let state = self.process_frame(frame)?;
            self.display.show(&state.annotated)?;

            if let Some(command) = self.display.poll_key().and_then(Command::from_key) {
                if let ControlFlow::Break(reason) = self.dispatch(command, &state) {
                    return Ok(reason);
                }
            }
        }
    }

    /// Detect, count, log, and draw the overlay for one frame.
    pub fn process_frame(&mut self, frame: Frame) -> Result<FrameState> {
        let fps = self.fps.tick();
        let mut state = self.adapter.process(frame)?;
        self.frames_processed += 1;

        if state.has_alerts() {
            self.session.add_alerts(state.detections.len());
            let now = Local::now().time();
            for detection in &state.detections {
                let line = format_event(now, detection);
                if self.session.record_event(line.clone()) {
                    println!("ALERT {line}");
                }
            }
        }

        overlay::render(
            &mut state.annotated,
            &state.detections,
            HudStatus {
                fps,
                total_alerts: self.session.total_alerts(),
            },
        );
        Ok(state)
    }

    /// Apply one operator command against the frame currently on screen.
    pub fn dispatch(&mut self, command: Command, state: &FrameState) -> ControlFlow<StopReason> {
        match command {
            Command::Quit => {
                println!("\nStopping detection...");
                return ControlFlow::Break(StopReason::Quit);
            }
            Command::Screenshot => {
                let now = Local::now().naive_local();
                match save_screenshot(&state.annotated, &self.screenshot_dir, now) {
                    Ok(path) => println!("Screenshot saved: {}", path.display()),
                    Err(err) => log::error!("screenshot failed: {:#}", err),
                }
            }
            Command::Reset => {
                self.session.reset();
                println!("Alert counter reset");
            }
        }
        ControlFlow::Continue(())
    }

    /// Release the source and close the display (once), then report the session.
    pub fn shutdown(&mut self) -> SessionSummary {
        self.release();
        self.session.summary()
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.source.release();
        self.display.close();
        self.released = true;
        log::info!(
            "monitor released resources after {} frames",
            self.frames_processed
        );
    }
}

impl<S: FrameSource, D: DisplaySurface> Drop for Monitor<S, D> {
    fn drop(&mut self) {
        self.release();
    }
}
