#![cfg(feature = "backend-tract")]

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use image::imageops::{self, FilterType};
use tract_onnx::prelude::*;

use crate::detect::backend::DetectorBackend;
use crate::detect::result::{BoundingBox, DetectionResult, RawDetection};
use crate::frame::Frame;

type YoloPlan = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Tract-based backend for YOLOv8 ONNX exports.
///
/// The model is expected to take a `[1, 3, S, S]` f32 input in `0..1` and to
/// produce a single `[1, 4 + C, N]` output (box center/size followed by one score
/// per class). Frames are stretched to `S x S`; boxes are scaled back to frame
/// coordinates.
pub struct TractBackend {
    model: YoloPlan,
    input_size: u32,
    iou_threshold: f32,
    class_names: Vec<String>,
}

impl TractBackend {
    /// Load an ONNX model from disk and prepare it for inference.
    pub fn new<P: AsRef<Path>>(
        model_path: P,
        input_size: u32,
        class_names: Vec<String>,
    ) -> Result<Self> {
        let model_path = model_path.as_ref();
        let size = input_size as usize;
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(f32::datum_type(), tvec!(1, 3, size, size)),
            )
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;

        Ok(Self {
            model,
            input_size,
            iou_threshold: 0.45,
            class_names,
        })
    }

    /// Override the default NMS IoU threshold.
    pub fn with_iou_threshold(mut self, threshold: f32) -> Self {
        self.iou_threshold = threshold;
        self
    }

    fn build_input(&self, frame: &Frame) -> Tensor {
        let size = self.input_size;
        let resized = imageops::resize(frame.image(), size, size, FilterType::Triangle);
        let size = size as usize;
        let raw = resized.as_raw();
        let input =
            tract_ndarray::Array4::from_shape_fn((1, 3, size, size), |(_, channel, y, x)| {
                raw[(y * size + x) * 3 + channel] as f32 / 255.0
            });
        input.into_tensor()
    }

    fn decode(
        &self,
        outputs: TVec<TValue>,
        frame_width: u32,
        frame_height: u32,
        confidence_threshold: f32,
    ) -> Result<Vec<RawDetection>> {
        let output = outputs
            .first()
            .ok_or_else(|| anyhow!("model produced no outputs"))?;
        let view = output
            .to_array_view::<f32>()
            .context("model output tensor was not f32")?;
        let candidates = decode_proposals(
            view,
            self.input_size,
            frame_width,
            frame_height,
            confidence_threshold,
        )?;
        Ok(non_max_suppression(candidates, self.iou_threshold))
    }
}

/// Decode a raw `[1, 4 + C, N]` YOLOv8 output into frame-space boxes.
///
/// Each proposal keeps its best-scoring class; proposals below
/// `confidence_threshold` are dropped. No suppression is applied here.
pub fn decode_proposals(
    view: tract_ndarray::ArrayViewD<'_, f32>,
    input_size: u32,
    frame_width: u32,
    frame_height: u32,
    confidence_threshold: f32,
) -> Result<Vec<RawDetection>> {
    let shape = view.shape();
    if shape.len() != 3 || shape[0] != 1 || shape[1] <= 4 {
        return Err(anyhow!("unexpected YOLO output shape {:?}", shape));
    }
    let rows = shape[1];
    let proposals = shape[2];
    let num_classes = rows - 4;

    let scale_x = frame_width as f32 / input_size as f32;
    let scale_y = frame_height as f32 / input_size as f32;

    let mut candidates = Vec::new();
    for i in 0..proposals {
        let mut best_class = 0usize;
        let mut best_score = f32::NEG_INFINITY;
        for c in 0..num_classes {
            let score = view[[0, 4 + c, i]];
            if score > best_score {
                best_score = score;
                best_class = c;
            }
        }
        if best_score < confidence_threshold {
            continue;
        }

        let cx = view[[0, 0, i]];
        let cy = view[[0, 1, i]];
        let w = view[[0, 2, i]];
        let h = view[[0, 3, i]];
        let bbox = BoundingBox::new(
            (cx - w / 2.0) * scale_x,
            (cy - h / 2.0) * scale_y,
            (cx + w / 2.0) * scale_x,
            (cy + h / 2.0) * scale_y,
        )
        .clamped(frame_width, frame_height);

        candidates.push(RawDetection {
            class_id: best_class,
            confidence: best_score,
            bbox,
        });
    }
    Ok(candidates)
}

impl DetectorBackend for TractBackend {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn class_names(&self) -> &[String] {
        &self.class_names
    }

    fn detect(&mut self, frame: &Frame, confidence_threshold: f32) -> Result<DetectionResult> {
        let input = self.build_input(frame);
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .context("ONNX inference failed")?;
        let boxes = self.decode(outputs, frame.width(), frame.height(), confidence_threshold)?;
        Ok(DetectionResult { boxes })
    }

    fn warm_up(&mut self) -> Result<()> {
        let size = self.input_size as usize;
        let blank = tract_ndarray::Array4::<f32>::zeros((1, 3, size, size)).into_tensor();
        self.model
            .run(tvec!(blank.into()))
            .context("ONNX warm-up inference failed")?;
        Ok(())
    }
}

/// Greedy per-class NMS: keep the most confident box, drop same-class boxes that
/// overlap it by more than `iou_threshold`.
pub fn non_max_suppression(
    mut boxes: Vec<RawDetection>,
    iou_threshold: f32,
) -> Vec<RawDetection> {
    boxes.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut kept: Vec<RawDetection> = Vec::new();
    for candidate in boxes {
        let overlaps = kept.iter().any(|k| {
            k.class_id == candidate.class_id && k.bbox.iou(&candidate.bbox) > iou_threshold
        });
        if !overlaps {
            kept.push(candidate);
        }
    }
    kept
}
