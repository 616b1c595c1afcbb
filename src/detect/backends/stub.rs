use anyhow::Result;

use crate::detect::backend::DetectorBackend;
use crate::detect::coco::coco_class_names;
use crate::detect::result::{BoundingBox, DetectionResult, RawDetection};
use crate::frame::Frame;

/// Frames in one loop of the synthetic demo scene.
const DEMO_SCENE_FRAMES: usize = 120;

/// Stub backend for tests and synthetic runs. Replays a fixed script of boxes.
///
/// Frame `n` receives `script[n % script.len()]`; an empty script never detects.
pub struct StubBackend {
    class_names: Vec<String>,
    script: Vec<Vec<RawDetection>>,
    cursor: usize,
}

impl StubBackend {
    pub fn new() -> Self {
        Self {
            class_names: coco_class_names(),
            script: Vec::new(),
            cursor: 0,
        }
    }

    pub fn with_script(mut self, script: Vec<Vec<RawDetection>>) -> Self {
        self.script = script;
        self.cursor = 0;
        self
    }

    pub fn with_class_names(mut self, class_names: Vec<String>) -> Self {
        self.class_names = class_names;
        self
    }

    /// A looping COCO scene for a `width` x `height` camera: a quiet stretch, then a
    /// person holding a knife, then bottles on a table next to a cup.
    pub fn demo(width: u32, height: u32) -> Self {
        let (w, h) = (width as f32, height as f32);
        let rect = |x1: f32, y1: f32, x2: f32, y2: f32| {
            BoundingBox::new(x1 * w, y1 * h, x2 * w, y2 * h)
        };
        let person_with_knife = vec![
            RawDetection {
                class_id: 0,
                confidence: 0.91,
                bbox: rect(0.35, 0.15, 0.65, 0.98),
            },
            RawDetection {
                class_id: 43,
                confidence: 0.82,
                bbox: rect(0.58, 0.48, 0.66, 0.62),
            },
        ];
        let table = vec![
            RawDetection {
                class_id: 39,
                confidence: 0.41,
                bbox: rect(0.20, 0.55, 0.26, 0.80),
            },
            RawDetection {
                class_id: 41,
                confidence: 0.77,
                bbox: rect(0.30, 0.65, 0.36, 0.80),
            },
            RawDetection {
                class_id: 39,
                confidence: 0.22,
                bbox: rect(0.72, 0.55, 0.78, 0.80),
            },
        ];

        let mut script = Vec::with_capacity(DEMO_SCENE_FRAMES);
        for n in 0..DEMO_SCENE_FRAMES {
            let boxes = match n {
                0..=59 => Vec::new(),
                60..=89 => person_with_knife.clone(),
                _ => table.clone(),
            };
            script.push(boxes);
        }
        Self::new().with_script(script)
    }
}

impl Default for StubBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectorBackend for StubBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn class_names(&self) -> &[String] {
        &self.class_names
    }

    fn detect(&mut self, _frame: &Frame, confidence_threshold: f32) -> Result<DetectionResult> {
        if self.script.is_empty() {
            return Ok(DetectionResult::default());
        }
        let boxes = self.script[self.cursor % self.script.len()]
            .iter()
            .filter(|det| det.confidence >= confidence_threshold)
            .copied()
            .collect();
        self.cursor += 1;
        Ok(DetectionResult { boxes })
    }
}
