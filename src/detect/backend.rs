use anyhow::Result;
use image::RgbImage;

use crate::detect::plot;
use crate::detect::result::DetectionResult;
use crate::frame::Frame;

/// Detector backend trait.
///
/// A backend wraps one pretrained multi-class detector. It owns the class table
/// the model was trained with and is treated as a black box by the rest of the
/// crate: frames flow in, raw boxes flow out.
pub trait DetectorBackend {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Full class-name table, indexed by class id.
    fn class_names(&self) -> &[String];

    /// Run detection on a frame.
    ///
    /// Implementations must only return boxes whose confidence is at least
    /// `confidence_threshold`.
    fn detect(&mut self, frame: &Frame, confidence_threshold: f32) -> Result<DetectionResult>;

    /// Render the standard detection boxes for `result` onto a copy of the frame.
    fn annotate(&self, frame: &Frame, result: &DetectionResult) -> RgbImage {
        plot::plot_detections(frame.image(), result, self.class_names())
    }

    /// Optional warm-up hook.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}
