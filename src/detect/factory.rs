use anyhow::{anyhow, Result};

use crate::config::{CameraSettings, DetectorSettings};
use crate::detect::backend::DetectorBackend;
use crate::detect::backends::StubBackend;
use crate::detect::coco::{coco_class_names, load_class_names};

/// Build the detector backend named in the settings.
///
/// `stub` replays the synthetic demo scene sized for the configured camera.
/// `tract` loads the ONNX model and needs the `backend-tract` feature.
pub fn open_backend(
    settings: &DetectorSettings,
    camera: &CameraSettings,
) -> Result<Box<dyn DetectorBackend>> {
    let class_names = match &settings.labels_path {
        Some(path) => load_class_names(path)?,
        None => coco_class_names(),
    };

    match settings.backend.as_str() {
        "stub" => Ok(Box::new(
            StubBackend::demo(camera.width, camera.height).with_class_names(class_names),
        )),
        "tract" => open_tract(settings, class_names),
        other => Err(anyhow!(
            "unknown detector backend '{}' (expected 'stub' or 'tract')",
            other
        )),
    }
}

#[cfg(feature = "backend-tract")]
fn open_tract(
    settings: &DetectorSettings,
    class_names: Vec<String>,
) -> Result<Box<dyn DetectorBackend>> {
    use crate::detect::backends::TractBackend;

    log::info!(
        "loading ONNX model {} ({}x{} input)",
        settings.model_path.display(),
        settings.input_size,
        settings.input_size
    );
    let backend = TractBackend::new(&settings.model_path, settings.input_size, class_names)?
        .with_iou_threshold(settings.iou_threshold);
    Ok(Box::new(backend))
}

#[cfg(not(feature = "backend-tract"))]
fn open_tract(
    _settings: &DetectorSettings,
    _class_names: Vec<String>,
) -> Result<Box<dyn DetectorBackend>> {
    Err(anyhow!(
        "detector backend 'tract' requires the backend-tract feature"
    ))
}
