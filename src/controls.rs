use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use image::RgbImage;
use std::path::{Path, PathBuf};

/// Operator commands, one key each.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Quit,
    Screenshot,
    Reset,
}

impl Command {
    /// `q` quits, `s` saves a screenshot, `r` resets counters. Other keys map to nothing.
    pub fn from_key(key: char) -> Option<Self> {
        match key {
            'q' => Some(Self::Quit),
            's' => Some(Self::Screenshot),
            'r' => Some(Self::Reset),
            _ => None,
        }
    }

    pub fn key(self) -> char {
        match self {
            Self::Quit => 'q',
            Self::Screenshot => 's',
            Self::Reset => 'r',
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Quit => "quit the monitor",
            Self::Screenshot => "save a screenshot",
            Self::Reset => "reset the alert counter",
        }
    }

    pub const ALL: [Command; 3] = [Command::Quit, Command::Screenshot, Command::Reset];
}

/// `alert_capture_YYYYmmdd_HHMMSS.jpg`
pub fn screenshot_file_name(at: NaiveDateTime) -> String {
    format!("alert_capture_{}.jpg", at.format("%Y%m%d_%H%M%S"))
}

/// Write `frame` as a JPEG into `dir`, named after `at`. Returns the written path.
pub fn save_screenshot(frame: &RgbImage, dir: &Path, at: NaiveDateTime) -> Result<PathBuf> {
    let path = dir.join(screenshot_file_name(at));
    frame
        .save_with_format(&path, image::ImageFormat::Jpeg)
        .with_context(|| format!("failed to write screenshot {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(14, 7, 2)
            .unwrap()
    }

    #[test]
    fn keys_map_to_commands() {
        assert_eq!(Command::from_key('q'), Some(Command::Quit));
        assert_eq!(Command::from_key('s'), Some(Command::Screenshot));
        assert_eq!(Command::from_key('r'), Some(Command::Reset));
        assert_eq!(Command::from_key('x'), None);
        assert_eq!(Command::from_key('Q'), None);
        for cmd in Command::ALL {
            assert_eq!(Command::from_key(cmd.key()), Some(cmd));
        }
    }

    #[test]
    fn screenshot_name_uses_timestamp() {
        assert_eq!(
            screenshot_file_name(at()),
            "alert_capture_20240309_140702.jpg"
        );
    }

    #[test]
    fn screenshot_is_written_as_jpeg() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let frame = RgbImage::from_pixel(32, 16, image::Rgb([200, 10, 10]));
        let path = save_screenshot(&frame, dir.path(), at())?;
        assert!(path.ends_with("alert_capture_20240309_140702.jpg"));
        let decoded = image::open(&path)?;
        assert_eq!((decoded.width(), decoded.height()), (32, 16));
        Ok(())
    }

    #[test]
    fn screenshot_into_missing_directory_fails() {
        let frame = RgbImage::new(4, 4);
        assert!(save_screenshot(&frame, Path::new("/nonexistent/dir"), at()).is_err());
    }
}
