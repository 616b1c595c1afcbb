/// Axis-aligned box in frame pixel coordinates, corners `(x1, y1)`-`(x2, y2)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> f32 {
        (self.x2 - self.x1).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.y2 - self.y1).max(0.0)
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// Intersection over union with another box.
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let ix1 = self.x1.max(other.x1);
        let iy1 = self.y1.max(other.y1);
        let ix2 = self.x2.min(other.x2);
        let iy2 = self.y2.min(other.y2);
        let inter = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
        if inter == 0.0 {
            return 0.0;
        }
        inter / (self.area() + other.area() - inter)
    }

    /// Clamp the box to a `width` x `height` frame.
    pub fn clamped(&self, width: u32, height: u32) -> Self {
        let (w, h) = (width as f32, height as f32);
        Self {
            x1: self.x1.clamp(0.0, w),
            y1: self.y1.clamp(0.0, h),
            x2: self.x2.clamp(0.0, w),
            y2: self.y2.clamp(0.0, h),
        }
    }
}

/// One box exactly as the detector reported it, before any danger filtering.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RawDetection {
    pub class_id: usize,
    pub confidence: f32,
    pub bbox: BoundingBox,
}

/// Output of a single backend inference call.
#[derive(Clone, Debug, Default)]
pub struct DetectionResult {
    pub boxes: Vec<RawDetection>,
}

impl DetectionResult {
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }
}

/// A detection that survived the danger filter.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    pub class_name: String,
    pub alert: &'static str,
    pub confidence: f32,
    pub bbox: BoundingBox,
}

impl Detection {
    /// Confidence as a whole percentage, ties rounded to even.
    pub fn percent(&self) -> u32 {
        (self.confidence * 100.0).round_ties_even().clamp(0.0, 100.0) as u32
    }
}
