//! Raster helpers shared by the detection plotter and the alert overlay.
//!
//! Text uses the 8x8 `font8x8` bitmap glyphs scaled by an integer factor and is
//! anchored at its baseline, so `y` names the row just below the glyphs.
//! Characters outside 7-bit ASCII render as `?`. All drawing clips to the image.

use font8x8::legacy::BASIC_LEGACY;
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;

pub const GLYPH_SIZE: u32 = 8;

pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
pub const RED: Rgb<u8> = Rgb([255, 0, 0]);
pub const GREEN: Rgb<u8> = Rgb([0, 255, 0]);
pub const ORANGE: Rgb<u8> = Rgb([255, 100, 0]);

/// Width and height in pixels of `text` rendered at `scale`.
pub fn text_size(text: &str, scale: u32) -> (u32, u32) {
    let chars = text.chars().count() as u32;
    (chars * GLYPH_SIZE * scale, GLYPH_SIZE * scale)
}

pub fn draw_text(
    image: &mut RgbImage,
    x: i32,
    baseline: i32,
    text: &str,
    scale: u32,
    color: Rgb<u8>,
) {
    let scale = scale.max(1) as i32;
    let glyph = GLYPH_SIZE as i32 * scale;
    let top = baseline - glyph;
    for (i, ch) in text.chars().enumerate() {
        let code = if ch.is_ascii() { ch as usize } else { '?' as usize };
        let rows = BASIC_LEGACY[code];
        let origin_x = x + i as i32 * glyph;
        for (row, bits) in rows.iter().enumerate() {
            for col in 0..GLYPH_SIZE as i32 {
                if bits & (1 << col) == 0 {
                    continue;
                }
                fill_rect(
                    image,
                    origin_x + col * scale,
                    top + row as i32 * scale,
                    origin_x + (col + 1) * scale,
                    top + (row as i32 + 1) * scale,
                    color,
                );
            }
        }
    }
}

/// Fill the half-open rectangle `[x1, x2) x [y1, y2)`, clipped to the image.
pub fn fill_rect(image: &mut RgbImage, x1: i32, y1: i32, x2: i32, y2: i32, color: Rgb<u8>) {
    let x1 = x1.max(0);
    let y1 = y1.max(0);
    let x2 = x2.min(image.width() as i32);
    let y2 = y2.min(image.height() as i32);
    if x2 <= x1 || y2 <= y1 {
        return;
    }
    let rect = Rect::at(x1, y1).of_size((x2 - x1) as u32, (y2 - y1) as u32);
    draw_filled_rect_mut(image, rect, color);
}

/// Draw a rectangle outline `thickness` pixels wide, growing inwards.
pub fn stroke_rect(
    image: &mut RgbImage,
    x1: i32,
    y1: i32,
    x2: i32,
    y2: i32,
    thickness: i32,
    color: Rgb<u8>,
) {
    let t = thickness.max(1);
    fill_rect(image, x1, y1, x2, y1 + t, color);
    fill_rect(image, x1, y2 - t, x2, y2, color);
    fill_rect(image, x1, y1, x1 + t, y2, color);
    fill_rect(image, x2 - t, y1, x2, y2, color);
}
