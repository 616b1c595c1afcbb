//! Standard detection plot: one colored box and a `<class> <conf>` tag per raw detection.

use image::{Rgb, RgbImage};

use crate::detect::result::DetectionResult;
use crate::draw::{draw_text, fill_rect, stroke_rect, text_size, WHITE};

const BOX_THICKNESS: i32 = 2;
const TAG_SCALE: u32 = 2;
const TAG_PADDING: i32 = 3;

const PALETTE: [[u8; 3]; 10] = [
    [255, 56, 56],
    [255, 157, 151],
    [255, 112, 31],
    [255, 178, 29],
    [207, 210, 49],
    [72, 249, 10],
    [146, 204, 23],
    [61, 219, 134],
    [26, 147, 52],
    [0, 212, 187],
];

pub fn class_color(class_id: usize) -> Rgb<u8> {
    Rgb(PALETTE[class_id % PALETTE.len()])
}

/// Copy `image` and draw every box in `result` on the copy.
///
/// Class ids without an entry in `class_names` are tagged with their numeric id.
pub fn plot_detections(
    image: &RgbImage,
    result: &DetectionResult,
    class_names: &[String],
) -> RgbImage {
    let mut plotted = image.clone();
    for det in &result.boxes {
        let color = class_color(det.class_id);
        let b = det.bbox.clamped(plotted.width(), plotted.height());
        let (x1, y1, x2, y2) = (b.x1 as i32, b.y1 as i32, b.x2 as i32, b.y2 as i32);
        stroke_rect(&mut plotted, x1, y1, x2, y2, BOX_THICKNESS, color);

        let name = class_names
            .get(det.class_id)
            .cloned()
            .unwrap_or_else(|| det.class_id.to_string());
        let tag = format!("{} {:.2}", name, det.confidence);
        let (tw, th) = text_size(&tag, TAG_SCALE);
        let tag_h = th as i32 + 2 * TAG_PADDING;
        // Tag sits above the box unless that would leave the frame.
        let tag_top = if y1 >= tag_h { y1 - tag_h } else { y1 };
        fill_rect(
            &mut plotted,
            x1,
            tag_top,
            x1 + tw as i32 + 2 * TAG_PADDING,
            tag_top + tag_h,
            color,
        );
        draw_text(
            &mut plotted,
            x1 + TAG_PADDING,
            tag_top + TAG_PADDING + th as i32,
            &tag,
            TAG_SCALE,
            WHITE,
        );
    }
    plotted
}
