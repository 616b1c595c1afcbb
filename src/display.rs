//! Display surfaces: where annotated frames go and where key presses come from.
//!
//! - `HeadlessDisplay`: no window, never reports a key.
//! - `WindowDisplay`: a desktop window (feature: display-minifb).

use anyhow::Result;
use image::RgbImage;

pub trait DisplaySurface {
    /// Present one annotated frame.
    fn show(&mut self, frame: &RgbImage) -> Result<()>;

    /// Return at most one pending key press without blocking.
    fn poll_key(&mut self) -> Option<char>;

    /// Tear down the surface. Calling this more than once is a no-op.
    fn close(&mut self);
}

impl<T: DisplaySurface + ?Sized> DisplaySurface for Box<T> {
    fn show(&mut self, frame: &RgbImage) -> Result<()> {
        (**self).show(frame)
    }

    fn poll_key(&mut self) -> Option<char> {
        (**self).poll_key()
    }

    fn close(&mut self) {
        (**self).close()
    }
}

/// Surface for runs without a screen. Frames are counted and dropped.
#[derive(Debug, Default)]
pub struct HeadlessDisplay {
    frames_shown: u64,
    closed: bool,
}

impl HeadlessDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames_shown(&self) -> u64 {
        self.frames_shown
    }
}

impl DisplaySurface for HeadlessDisplay {
    fn show(&mut self, _frame: &RgbImage) -> Result<()> {
        self.frames_shown += 1;
        Ok(())
    }

    fn poll_key(&mut self) -> Option<char> {
        None
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            log::debug!("headless display closed after {} frames", self.frames_shown);
        }
    }
}

/// Pack RGB24 pixels into the `0RGB` u32 layout window toolkits expect.
pub fn pack_0rgb(frame: &RgbImage, out: &mut Vec<u32>) {
    out.clear();
    out.extend(
        frame
            .pixels()
            .map(|p| (u32::from(p[0]) << 16) | (u32::from(p[1]) << 8) | u32::from(p[2])),
    );
}

#[cfg(feature = "display-minifb")]
pub use window::WindowDisplay;

#[cfg(feature = "display-minifb")]
mod window {
    use anyhow::{anyhow, Context, Result};
    use image::RgbImage;
    use minifb::{Key, KeyRepeat, Window, WindowOptions};

    use super::{pack_0rgb, DisplaySurface};

    /// Desktop window backed by minifb.
    ///
    /// Closing the window is reported as `q`.
    pub struct WindowDisplay {
        window: Option<Window>,
        buffer: Vec<u32>,
    }

    impl WindowDisplay {
        pub fn open(title: &str, width: u32, height: u32) -> Result<Self> {
            let window = Window::new(
                title,
                width as usize,
                height as usize,
                WindowOptions::default(),
            )
            .with_context(|| format!("failed to open {}x{} window", width, height))?;
            Ok(Self {
                window: Some(window),
                buffer: Vec::with_capacity(width as usize * height as usize),
            })
        }
    }

    impl DisplaySurface for WindowDisplay {
        fn show(&mut self, frame: &RgbImage) -> Result<()> {
            let window = self
                .window
                .as_mut()
                .ok_or_else(|| anyhow!("window already closed"))?;
            pack_0rgb(frame, &mut self.buffer);
            window
                .update_with_buffer(&self.buffer, frame.width() as usize, frame.height() as usize)
                .context("failed to present frame")?;
            Ok(())
        }

        fn poll_key(&mut self) -> Option<char> {
            let window = self.window.as_ref()?;
            if !window.is_open() {
                return Some('q');
            }
            window
                .get_keys_pressed(KeyRepeat::No)
                .into_iter()
                .find_map(command_key)
        }

        fn close(&mut self) {
            if self.window.take().is_some() {
                log::info!("display window closed");
            }
        }
    }

    /// Only the command letters are forwarded; every other key is ignored.
    fn command_key(key: Key) -> Option<char> {
        match key {
            Key::Q => Some('q'),
            Key::S => Some('s'),
            Key::R => Some('r'),
            _ => None,
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn headless_display_counts_frames_and_reports_no_keys() -> Result<()> {
        let mut display = HeadlessDisplay::new();
        display.show(&RgbImage::new(2, 2))?;
        display.show(&RgbImage::new(2, 2))?;
        assert_eq!(display.frames_shown(), 2);
        assert_eq!(display.poll_key(), None);
        display.close();
        display.close();
        Ok(())
    }

    #[test]
    fn pack_0rgb_orders_channels() {
        let frame = RgbImage::from_pixel(1, 2, Rgb([0x12, 0x34, 0x56]));
        let mut out = vec![7];
        pack_0rgb(&frame, &mut out);
        assert_eq!(out, vec![0x0012_3456, 0x0012_3456]);
    }
}
