//! Alert overlay drawn on top of the detector's annotated frame.
//!
//! Positions and sizes are tuned for a 1280x720 camera and do not scale.

use image::RgbImage;

use crate::detect::Detection;
use crate::draw::{draw_text, fill_rect, text_size, GREEN, ORANGE, RED, WHITE};

const BANNER: (i32, i32, i32, i32) = (40, 20, 1240, 80);
const BANNER_TEXT: (i32, i32) = (50, 60);
const BANNER_SCALE: u32 = 3;

const CHIP_LEFT: i32 = 40;
const CHIP_TEXT_X: i32 = 50;
const CHIP_FIRST_BASELINE: i32 = 120;
const CHIP_SPACING: i32 = 50;
const CHIP_SCALE: u32 = 3;

const HUD_X: i32 = 10;
const HUD_SCALE: u32 = 2;
const STATUS_SCALE: u32 = 3;

pub const STATUS_ALERT: &str = "ALERT ACTIVE";
pub const STATUS_SAFE: &str = "SAFE ZONE";

/// Values shown in the bottom-left corner on every frame.
#[derive(Clone, Copy, Debug)]
pub struct HudStatus {
    pub fps: f64,
    pub total_alerts: u64,
}

pub fn banner_text(count: usize) -> String {
    format!("ALERT: {} DANGEROUS OBJECT(S) DETECTED", count)
}

pub fn chip_text(detection: &Detection) -> String {
    format!("{} - {}%", detection.alert, detection.percent())
}

pub fn status_text(alert_active: bool) -> &'static str {
    if alert_active {
        STATUS_ALERT
    } else {
        STATUS_SAFE
    }
}

/// Draw the banner and chips (only when something was detected) and the HUD.
pub fn render(frame: &mut RgbImage, detections: &[Detection], hud: HudStatus) {
    if !detections.is_empty() {
        draw_banner(frame, detections.len());
        draw_chips(frame, detections);
    }
    draw_hud(frame, !detections.is_empty(), hud);
}

fn draw_banner(frame: &mut RgbImage, count: usize) {
    let (x1, y1, x2, y2) = BANNER;
    fill_rect(frame, x1, y1, x2, y2, RED);
    draw_text(
        frame,
        BANNER_TEXT.0,
        BANNER_TEXT.1,
        &banner_text(count),
        BANNER_SCALE,
        WHITE,
    );
}

fn draw_chips(frame: &mut RgbImage, detections: &[Detection]) {
    let mut baseline = CHIP_FIRST_BASELINE;
    for detection in detections {
        let text = chip_text(detection);
        let (width, _) = text_size(&text, CHIP_SCALE);
        fill_rect(
            frame,
            CHIP_LEFT,
            baseline - 30,
            CHIP_LEFT + width as i32 + 20,
            baseline + 10,
            ORANGE,
        );
        draw_text(frame, CHIP_TEXT_X, baseline, &text, CHIP_SCALE, WHITE);
        baseline += CHIP_SPACING;
    }
}

fn draw_hud(frame: &mut RgbImage, alert_active: bool, hud: HudStatus) {
    let h = frame.height() as i32;
    draw_text(
        frame,
        HUD_X,
        h - 70,
        &format!("FPS: {:.1}", hud.fps),
        HUD_SCALE,
        GREEN,
    );
    let status_color = if alert_active { RED } else { GREEN };
    draw_text(
        frame,
        HUD_X,
        h - 40,
        status_text(alert_active),
        STATUS_SCALE,
        status_color,
    );
    draw_text(
        frame,
        HUD_X,
        h - 10,
        &format!("Total alerts: {}", hud.total_alerts),
        HUD_SCALE,
        WHITE,
    );
}
