use anyhow::Result;
use std::collections::BTreeSet;

use crate::detect::backend::DetectorBackend;
use crate::detect::result::{Detection, DetectionResult};
use crate::frame::{Frame, FrameState};
use crate::hazard::DangerLabelMap;

/// Runs a detector backend on each frame and keeps only dangerous classes.
///
/// The danger class-id set is computed once, from the backend's class table,
/// when the adapter is built.
pub struct InferenceAdapter {
    backend: Box<dyn DetectorBackend>,
    labels: DangerLabelMap,
    danger_ids: BTreeSet<usize>,
    confidence_threshold: f32,
}

impl InferenceAdapter {
    pub fn new(backend: Box<dyn DetectorBackend>, confidence_threshold: f32) -> Self {
        let labels = DangerLabelMap::new();
        let danger_ids = labels.danger_class_ids(backend.class_names());
        Self {
            backend,
            labels,
            danger_ids,
            confidence_threshold,
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn confidence_threshold(&self) -> f32 {
        self.confidence_threshold
    }

    pub fn danger_ids(&self) -> &BTreeSet<usize> {
        &self.danger_ids
    }

    /// Alert texts this detector can raise, in class-table order.
    pub fn watched_alerts(&self) -> Vec<&'static str> {
        let names = self.backend.class_names();
        self.danger_ids
            .iter()
            .filter_map(|&id| names.get(id))
            .filter_map(|name| self.labels.alert_for(name))
            .collect()
    }

    pub fn warm_up(&mut self) -> Result<()> {
        self.backend.warm_up()
    }

    /// Detect, annotate, and filter one frame.
    ///
    /// The annotated image is produced for every frame, including frames with no
    /// detections at all.
    pub fn process(&mut self, frame: Frame) -> Result<FrameState> {
        let result = self.backend.detect(&frame, self.confidence_threshold)?;
        let annotated = self.backend.annotate(&frame, &result);
        let detections = self.filter(&result);
        if !result.is_empty() {
            log::debug!(
                "frame {}: {} raw boxes, {} dangerous",
                frame.sequence,
                result.boxes.len(),
                detections.len()
            );
        }
        Ok(FrameState {
            raw: frame,
            annotated,
            detections,
        })
    }

    /// Keep boxes whose class is dangerous and whose confidence clears the threshold.
    pub fn filter(&self, result: &DetectionResult) -> Vec<Detection> {
        let names = self.backend.class_names();
        result
            .boxes
            .iter()
            .filter(|raw| self.danger_ids.contains(&raw.class_id))
            .filter(|raw| raw.confidence >= self.confidence_threshold)
            .filter_map(|raw| {
                let class_name = names.get(raw.class_id)?;
                let alert = self.labels.alert_for(class_name)?;
                Some(Detection {
                    class_name: class_name.clone(),
                    alert,
                    confidence: raw.confidence,
                    bbox: raw.bbox,
                })
            })
            .collect()
    }
}
