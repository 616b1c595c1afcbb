//! Hazard Watch
//!
//! Live camera monitor that runs a pretrained object detector on every frame and
//! raises an alert when it sees a dangerous handheld object (bottle, knife,
//! baseball bat, scissors, fork, spoon).
//!
//! # Module Structure
//!
//! - `ingest`: camera frame sources (synthetic `stub://`, V4L2 devices)
//! - `detect`: detector backends, danger filtering, standard box plotting
//! - `hazard`: the fixed class-name to alert-text table
//! - `overlay` / `draw`: alert banner, chips, and status text
//! - `session`: alert counters, de-duplicated event log, FPS estimate
//! - `controls` / `display`: keyboard commands, screenshots, output surfaces
//! - `monitor`: the capture/detect/display loop and its shutdown path
//! - `config` / `ui`: settings loading and startup progress output

pub mod config;
pub mod controls;
pub mod detect;
pub mod display;
pub mod draw;
pub mod frame;
pub mod hazard;
pub mod ingest;
pub mod monitor;
pub mod overlay;
pub mod session;
pub mod ui;

pub use config::WatchConfig;
pub use controls::Command;
pub use detect::{Detection, DetectorBackend, InferenceAdapter, StubBackend};
pub use display::{DisplaySurface, HeadlessDisplay};
pub use frame::{Frame, FrameState};
pub use hazard::{DangerLabelMap, DANGER_LABELS};
pub use ingest::{CameraConfig, CameraSource, FrameSource};
pub use monitor::{Monitor, StopReason};
pub use session::{SessionCounters, SessionSummary};
