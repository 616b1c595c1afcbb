//! Object detection: backends, the danger filter, and standard box plotting.
//!
//! - `DetectorBackend`: a pretrained detector treated as a black box.
//! - `InferenceAdapter`: runs a backend on a frame and keeps only danger classes.
//! - `open_backend`: picks a backend by configured name.

mod adapter;
mod backend;
mod backends;
mod coco;
mod factory;
pub mod plot;
mod result;

pub use adapter::InferenceAdapter;
pub use backend::DetectorBackend;
pub use backends::StubBackend;
#[cfg(feature = "backend-tract")]
pub use backends::TractBackend;
pub use coco::{coco_class_names, load_class_names, COCO_CLASSES};
pub use factory::open_backend;
pub use result::{BoundingBox, Detection, DetectionResult, RawDetection};
