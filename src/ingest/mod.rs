//! Frame sources.
//!
//! - `stub://<name>`: synthetic moving test pattern (default build, tests)
//! - local V4L2 camera devices (feature: camera-v4l2)
//!
//! A source hands out RGB24 `Frame`s one at a time and never retries: a failed
//! capture is reported to the caller, which ends the session.

mod camera;
#[cfg(feature = "camera-v4l2")]
mod normalize;

use anyhow::Result;

use crate::frame::Frame;

pub use camera::{CameraConfig, CameraSource};

/// Anything the monitor can pull frames from.
pub trait FrameSource {
    /// Block until the next frame is available.
    fn next_frame(&mut self) -> Result<Frame>;

    /// Release the underlying device. Calling this more than once is a no-op.
    fn release(&mut self);
}
