use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use image::RgbImage;

use hazard_watch::detect::{BoundingBox, RawDetection};
use hazard_watch::display::DisplaySurface;
use hazard_watch::overlay::{STATUS_ALERT, STATUS_SAFE};
use hazard_watch::{
    Command, Frame, FrameSource, InferenceAdapter, Monitor, StopReason, StubBackend,
};

const WIDTH: u32 = 1280;
const HEIGHT: u32 = 720;
const KNIFE: usize = 43;
const BOTTLE: usize = 39;
const PERSON: usize = 0;

/// Hands out blank frames until `fail_after` frames, then errors.
struct ScriptedSource {
    produced: u64,
    fail_after: Option<u64>,
    releases: Rc<Cell<u32>>,
}

impl ScriptedSource {
    fn new(releases: Rc<Cell<u32>>) -> Self {
        Self {
            produced: 0,
            fail_after: None,
            releases,
        }
    }

    fn failing_after(mut self, frames: u64) -> Self {
        self.fail_after = Some(frames);
        self
    }
}

impl FrameSource for ScriptedSource {
    fn next_frame(&mut self) -> Result<Frame> {
        if self.fail_after.is_some_and(|n| self.produced >= n) {
            return Err(anyhow!("camera unplugged"));
        }
        self.produced += 1;
        Ok(Frame::from_image(RgbImage::new(WIDTH, HEIGHT), self.produced))
    }

    fn release(&mut self) {
        self.releases.set(self.releases.get() + 1);
    }
}

/// Replays one optional key per shown frame and records what it was shown.
struct ScriptedDisplay {
    keys: VecDeque<Option<char>>,
    shown: Rc<Cell<u32>>,
    closes: Rc<Cell<u32>>,
    last_frame: Rc<RefCell<Option<RgbImage>>>,
}

impl DisplaySurface for ScriptedDisplay {
    fn show(&mut self, frame: &RgbImage) -> Result<()> {
        self.shown.set(self.shown.get() + 1);
        *self.last_frame.borrow_mut() = Some(frame.clone());
        Ok(())
    }

    fn poll_key(&mut self) -> Option<char> {
        self.keys.pop_front().flatten()
    }

    fn close(&mut self) {
        self.closes.set(self.closes.get() + 1);
    }
}

struct Harness {
    releases: Rc<Cell<u32>>,
    closes: Rc<Cell<u32>>,
    shown: Rc<Cell<u32>>,
    last_frame: Rc<RefCell<Option<RgbImage>>>,
}

impl Harness {
    fn new() -> Self {
        Self {
            releases: Rc::new(Cell::new(0)),
            closes: Rc::new(Cell::new(0)),
            shown: Rc::new(Cell::new(0)),
            last_frame: Rc::new(RefCell::new(None)),
        }
    }

    fn source(&self) -> ScriptedSource {
        ScriptedSource::new(self.releases.clone())
    }

    fn display(&self, keys: &[Option<char>]) -> ScriptedDisplay {
        ScriptedDisplay {
            keys: keys.iter().copied().collect(),
            shown: self.shown.clone(),
            closes: self.closes.clone(),
            last_frame: self.last_frame.clone(),
        }
    }
}

fn raw(class_id: usize, confidence: f32, x1: f32) -> RawDetection {
    RawDetection {
        class_id,
        confidence,
        bbox: BoundingBox::new(x1, 300.0, x1 + 80.0, 420.0),
    }
}

fn adapter(script: Vec<Vec<RawDetection>>) -> InferenceAdapter {
    InferenceAdapter::new(Box::new(StubBackend::new().with_script(script)), 0.3)
}

fn frame(sequence: u64) -> Frame {
    Frame::from_image(RgbImage::new(WIDTH, HEIGHT), sequence)
}

#[test]
fn quiet_frame_shows_safe_zone_and_keeps_count() -> Result<()> {
    let h = Harness::new();
    let mut monitor = Monitor::new(h.source(), h.display(&[]), adapter(vec![vec![]]));

    let state = monitor.process_frame(frame(1))?;
    assert!(state.detections.is_empty());
    assert_eq!(monitor.session().total_alerts(), 0);
    assert!(monitor.session().events().is_empty());
    // No banner: the banner corner keeps the camera pixel.
    assert_eq!(state.annotated.get_pixel(41, 21).0, [0, 0, 0]);
    assert_eq!(hazard_watch::overlay::status_text(false), STATUS_SAFE);
    Ok(())
}

#[test]
fn two_dangerous_objects_raise_two_alerts() -> Result<()> {
    let h = Harness::new();
    let script = vec![vec![
        raw(KNIFE, 0.8, 100.0),
        raw(PERSON, 0.95, 400.0),
        raw(BOTTLE, 0.4, 700.0),
    ]];
    let mut monitor = Monitor::new(h.source(), h.display(&[]), adapter(script));

    let state = monitor.process_frame(frame(1))?;
    let alerts: Vec<&str> = state.detections.iter().map(|d| d.alert).collect();
    assert_eq!(alerts, vec!["KNIFE", "BOTTLE"]);
    assert_eq!(monitor.session().total_alerts(), 2);

    let events = monitor.session().events();
    assert_eq!(events.len(), 2);
    assert!(events[0].ends_with("KNIFE - Confidence: 80%"));
    assert!(events[1].ends_with("BOTTLE - Confidence: 40%"));

    // Banner drawn in red, two orange chips stacked 50 px apart.
    assert_eq!(state.annotated.get_pixel(41, 21).0, [255, 0, 0]);
    assert_eq!(state.annotated.get_pixel(41, 91).0, [255, 100, 0]);
    assert_eq!(state.annotated.get_pixel(41, 141).0, [255, 100, 0]);
    assert_eq!(state.annotated.get_pixel(41, 191).0, [0, 0, 0]);
    assert_eq!(hazard_watch::overlay::status_text(true), STATUS_ALERT);
    Ok(())
}

#[test]
fn repeated_detections_count_every_time_but_log_once() -> Result<()> {
    let h = Harness::new();
    let script = vec![vec![raw(KNIFE, 0.8, 100.0)]];
    let mut monitor = Monitor::new(h.source(), h.display(&[]), adapter(script));

    for n in 1..=3 {
        monitor.process_frame(frame(n))?;
    }
    assert_eq!(monitor.session().total_alerts(), 3);
    // Same second, same text: suppressed by the trailing window. A clock tick
    // between frames can legitimately add a second line.
    assert!(monitor.session().events().len() <= 2);
    Ok(())
}

#[test]
fn quit_key_stops_loop_and_releases_once() -> Result<()> {
    let h = Harness::new();
    let keys = [None, Some('x'), Some('q'), Some('q')];
    let mut monitor = Monitor::new(h.source(), h.display(&keys), adapter(vec![]));

    let reason = monitor.run()?;
    assert_eq!(reason, StopReason::Quit);
    assert_eq!(monitor.frames_processed(), 3);
    assert_eq!(h.shown.get(), 3);

    monitor.shutdown();
    monitor.shutdown();
    drop(monitor);

    assert_eq!(h.releases.get(), 1);
    assert_eq!(h.closes.get(), 1);
    Ok(())
}

#[test]
fn reset_key_clears_counters_and_log() -> Result<()> {
    let h = Harness::new();
    let script = vec![
        vec![raw(KNIFE, 0.8, 100.0), raw(BOTTLE, 0.5, 500.0)],
        vec![],
    ];
    let keys = [None, Some('r'), Some('q')];
    let mut monitor = Monitor::new(h.source(), h.display(&keys), adapter(script));

    assert_eq!(monitor.run()?, StopReason::Quit);
    // Frame 1 raised two alerts, frame 2 reset, frame 3 (script wraps) raised two more.
    assert_eq!(monitor.session().total_alerts(), 2);
    assert_eq!(monitor.session().events().len(), 2);

    let summary = monitor.shutdown();
    assert_eq!(summary.total_alerts, 2);
    assert_eq!(summary.distinct_events, 2);
    Ok(())
}

#[test]
fn reset_command_zeroes_everything() -> Result<()> {
    let h = Harness::new();
    let script = vec![vec![raw(KNIFE, 0.8, 100.0), raw(BOTTLE, 0.5, 500.0)]];
    let mut monitor = Monitor::new(h.source(), h.display(&[]), adapter(script));

    let state = monitor.process_frame(frame(1))?;
    assert_eq!(monitor.session().total_alerts(), 2);

    let flow = monitor.dispatch(Command::Reset, &state);
    assert!(flow.is_continue());
    assert_eq!(monitor.session().total_alerts(), 0);
    assert!(monitor.session().events().is_empty());
    Ok(())
}

#[test]
fn screenshot_key_writes_current_frame() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let h = Harness::new();
    let keys = [Some('s'), Some('q')];
    let mut monitor = Monitor::new(h.source(), h.display(&keys), adapter(vec![]))
        .with_screenshot_dir(dir.path());

    assert_eq!(monitor.run()?, StopReason::Quit);
    let shots: Vec<_> = std::fs::read_dir(dir.path())?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(shots.len(), 1);
    assert!(shots[0].starts_with("alert_capture_"));
    assert!(shots[0].ends_with(".jpg"));
    Ok(())
}

#[test]
fn failed_screenshot_does_not_end_session() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let h = Harness::new();
    let keys = [Some('s'), None, Some('q')];
    let mut monitor = Monitor::new(h.source(), h.display(&keys), adapter(vec![]))
        .with_screenshot_dir(dir.path().join("missing"));

    assert_eq!(monitor.run()?, StopReason::Quit);
    assert_eq!(monitor.frames_processed(), 3);
    Ok(())
}

#[test]
fn capture_failure_ends_session_cleanly() -> Result<()> {
    let h = Harness::new();
    let script = vec![vec![raw(KNIFE, 0.8, 100.0)]];
    let source = h.source().failing_after(2);
    let mut monitor = Monitor::new(source, h.display(&[]), adapter(script));

    assert_eq!(monitor.run()?, StopReason::CaptureFailed);
    assert_eq!(monitor.frames_processed(), 2);

    let summary = monitor.shutdown();
    assert_eq!(summary.total_alerts, 2);
    assert_eq!(h.releases.get(), 1);
    assert_eq!(h.closes.get(), 1);
    Ok(())
}

#[test]
fn interrupt_flag_stops_before_next_frame() -> Result<()> {
    let h = Harness::new();
    let interrupt = Arc::new(AtomicBool::new(false));
    interrupt.store(true, Ordering::SeqCst);
    let mut monitor =
        Monitor::new(h.source(), h.display(&[]), adapter(vec![])).with_interrupt(interrupt);

    assert_eq!(monitor.run()?, StopReason::Interrupted);
    assert_eq!(monitor.frames_processed(), 0);
    drop(monitor);
    assert_eq!(h.releases.get(), 1);
    Ok(())
}

#[test]
fn frame_limit_stops_loop() -> Result<()> {
    let h = Harness::new();
    let mut monitor =
        Monitor::new(h.source(), h.display(&[]), adapter(vec![])).with_frame_limit(Some(5));

    assert_eq!(monitor.run()?, StopReason::FrameLimit);
    assert_eq!(monitor.frames_processed(), 5);
    assert_eq!(h.shown.get(), 5);
    let last = h.last_frame.borrow();
    assert_eq!(last.as_ref().map(|f| f.dimensions()), Some((WIDTH, HEIGHT)));
    Ok(())
}

#[test]
fn empty_session_summary() -> Result<()> {
    let h = Harness::new();
    let mut monitor = Monitor::new(h.source(), h.display(&[]), adapter(vec![]));
    let summary = monitor.shutdown();
    assert_eq!(summary.total_alerts, 0);
    assert_eq!(summary.distinct_events, 0);
    assert!(summary.recent_events.is_empty());
    assert!(summary.to_string().contains("Total alerts raised: 0"));
    Ok(())
}
