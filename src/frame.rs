//! Frame containers passed through the monitoring loop.
//!
//! - `Frame`: one captured RGB24 image plus its capture sequence number.
//! - `FrameState`: the per-iteration bundle (raw frame, annotated copy, danger detections).
//!
//! Neither type outlives a loop iteration. The monitor builds a fresh `FrameState`
//! for every frame it pulls and drops it before asking the source for the next one.

use anyhow::{anyhow, Result};
use image::RgbImage;

use crate::detect::Detection;

/// One captured frame, always RGB24.
pub struct Frame {
    image: RgbImage,
    /// Monotonic capture counter assigned by the source (starts at 1).
    pub sequence: u64,
}

impl Frame {
    /// Wrap packed RGB24 bytes. Fails when the buffer does not match the dimensions.
    pub fn from_rgb(width: u32, height: u32, pixels: Vec<u8>, sequence: u64) -> Result<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(3))
            .ok_or_else(|| anyhow!("frame dimensions overflow"))?;
        if pixels.len() != expected {
            return Err(anyhow!(
                "expected {} RGB bytes for {}x{}, received {}",
                expected,
                width,
                height,
                pixels.len()
            ));
        }
        let image = RgbImage::from_raw(width, height, pixels)
            .ok_or_else(|| anyhow!("invalid RGB buffer for {}x{}", width, height))?;
        Ok(Self::from_image(image, sequence))
    }

    pub fn from_image(image: RgbImage, sequence: u64) -> Self {
        Self { image, sequence }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    /// Packed RGB24 bytes, row-major.
    pub fn pixels(&self) -> &[u8] {
        self.image.as_raw()
    }
}

/// Everything the loop knows about one processed frame.
pub struct FrameState {
    pub raw: Frame,
    /// Always present, even when nothing was detected.
    pub annotated: RgbImage,
    pub detections: Vec<Detection>,
}

impl FrameState {
    pub fn has_alerts(&self) -> bool {
        !self.detections.is_empty()
    }
}
