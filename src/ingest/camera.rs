//! Camera frame source.
//!
//! `CameraSource` opens one local camera at a requested resolution and yields
//! RGB24 frames. Paths starting with `stub://` select a synthetic generator;
//! anything else is a V4L2 device node such as `/dev/video0`.

use anyhow::{anyhow, Result};

use super::FrameSource;
use crate::frame::Frame;

/// Configuration for a camera source.
#[derive(Clone, Debug)]
pub struct CameraConfig {
    /// Device path (e.g., "/dev/video0") or `stub://<name>`.
    pub device: String,
    /// Requested frame width.
    pub width: u32,
    /// Requested frame height.
    pub height: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device: "/dev/video0".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

/// Camera frame source.
pub struct CameraSource {
    backend: CameraBackend,
    released: bool,
}

enum CameraBackend {
    Synthetic(SyntheticCamera),
    #[cfg(feature = "camera-v4l2")]
    Device(v4l2::DeviceCamera),
}

impl CameraSource {
    /// Open the camera. Fails immediately when the device cannot be opened.
    pub fn open(config: CameraConfig) -> Result<Self> {
        let backend = if config.device.starts_with("stub://") {
            CameraBackend::Synthetic(SyntheticCamera::new(config))
        } else {
            open_device(config)?
        };
        Ok(Self {
            backend,
            released: false,
        })
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl FrameSource for CameraSource {
    fn next_frame(&mut self) -> Result<Frame> {
        if self.released {
            return Err(anyhow!("camera already released"));
        }
        match &mut self.backend {
            CameraBackend::Synthetic(camera) => camera.next_frame(),
            #[cfg(feature = "camera-v4l2")]
            CameraBackend::Device(camera) => camera.next_frame(),
        }
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        match &mut self.backend {
            CameraBackend::Synthetic(camera) => camera.release(),
            #[cfg(feature = "camera-v4l2")]
            CameraBackend::Device(camera) => camera.release(),
        }
        self.released = true;
    }
}

impl Drop for CameraSource {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(feature = "camera-v4l2")]
fn open_device(config: CameraConfig) -> Result<CameraBackend> {
    Ok(CameraBackend::Device(v4l2::DeviceCamera::open(config)?))
}

#[cfg(not(feature = "camera-v4l2"))]
fn open_device(config: CameraConfig) -> Result<CameraBackend> {
    Err(anyhow!(
        "cannot open {}: camera devices require the camera-v4l2 feature (use stub://<name> for a synthetic camera)",
        config.device
    ))
}

// ----------------------------------------------------------------------------
// Synthetic source (stub://) for tests and demos
// ----------------------------------------------------------------------------

struct SyntheticCamera {
    config: CameraConfig,
    frame_count: u64,
}

impl SyntheticCamera {
    fn new(config: CameraConfig) -> Self {
        log::info!(
            "CameraSource: opened {} (synthetic, {}x{})",
            config.device,
            config.width,
            config.height
        );
        Self {
            config,
            frame_count: 0,
        }
    }

    fn next_frame(&mut self) -> Result<Frame> {
        self.frame_count += 1;
        let pixels = self.generate_pixels();
        Frame::from_rgb(
            self.config.width,
            self.config.height,
            pixels,
            self.frame_count,
        )
    }

    /// Diagonal color bands drifting one pixel per frame.
    fn generate_pixels(&self) -> Vec<u8> {
        let width = self.config.width as usize;
        let height = self.config.height as usize;
        let shift = self.frame_count as usize;
        let mut pixels = vec![0u8; width * height * 3];
        for (i, px) in pixels.chunks_exact_mut(3).enumerate() {
            let x = i % width;
            let y = i / width;
            let band = ((x + y + shift) / 4 % 256) as u8;
            px[0] = band;
            px[1] = band / 2 + 64;
            px[2] = 255 - band;
        }
        pixels
    }

    fn release(&mut self) {
        log::info!("CameraSource: released {}", self.config.device);
    }
}

// ----------------------------------------------------------------------------
// V4L2 device source
// ----------------------------------------------------------------------------

#[cfg(feature = "camera-v4l2")]
mod v4l2 {
    use anyhow::{anyhow, Context, Result};
    use ouroboros::self_referencing;

    use super::CameraConfig;
    use crate::frame::Frame;
    use crate::ingest::normalize::{normalize_to_rgb, PixelFormat};

    pub(super) struct DeviceCamera {
        config: CameraConfig,
        state: Option<DeviceState>,
        format: PixelFormat,
        frame_count: u64,
        active_width: u32,
        active_height: u32,
    }

    #[self_referencing]
    struct DeviceState {
        device: v4l::Device,
        #[borrows(mut device)]
        #[covariant]
        stream: v4l::prelude::MmapStream<'this, v4l::Device>,
    }

    impl DeviceCamera {
        pub(super) fn open(config: CameraConfig) -> Result<Self> {
            use v4l::buffer::Type;
            use v4l::video::Capture;

            let mut device = v4l::Device::with_path(&config.device)
                .with_context(|| format!("open v4l2 device {}", config.device))?;
            let mut format = device.format().context("read v4l2 format")?;
            format.width = config.width;
            format.height = config.height;
            format.fourcc = v4l::FourCC::new(b"RGB3");

            let format = match device.set_format(&format) {
                Ok(format) => format,
                Err(err) => {
                    log::warn!(
                        "CameraSource: failed to set format on {}: {}",
                        config.device,
                        err
                    );
                    device
                        .format()
                        .context("read v4l2 format after set failure")?
                }
            };

            let pixel_format = PixelFormat::from_fourcc(&format.fourcc.repr).ok_or_else(|| {
                anyhow!(
                    "v4l2 device {} delivers unsupported pixel format {}",
                    config.device,
                    format.fourcc
                )
            })?;

            let state = DeviceStateBuilder {
                device,
                stream_builder: |device| {
                    v4l::prelude::MmapStream::with_buffers(device, Type::VideoCapture, 4).map_err(
                        |err| anyhow::Error::new(err).context("create v4l2 buffer stream"),
                    )
                },
            }
            .try_build()?;

            if format.width != config.width || format.height != config.height {
                log::warn!(
                    "CameraSource: {} negotiated {}x{} instead of {}x{}",
                    config.device,
                    format.width,
                    format.height,
                    config.width,
                    config.height
                );
            }
            log::info!(
                "CameraSource: opened {} ({}x{}, {:?})",
                config.device,
                format.width,
                format.height,
                pixel_format
            );

            Ok(Self {
                active_width: format.width,
                active_height: format.height,
                config,
                state: Some(state),
                format: pixel_format,
                frame_count: 0,
            })
        }

        pub(super) fn next_frame(&mut self) -> Result<Frame> {
            use v4l::io::traits::CaptureStream;

            let state = self.state.as_mut().context("v4l2 device not open")?;
            let (buf, meta) = state
                .with_mut(|fields| fields.stream.next())
                .map_err(|err| anyhow::Error::new(err).context("capture v4l2 frame"))?;
            let used = (meta.bytesused as usize).min(buf.len());
            let payload = if used == 0 { buf } else { &buf[..used] };

            let rgb = normalize_to_rgb(
                payload,
                self.active_width,
                self.active_height,
                self.format,
            )?;
            self.frame_count += 1;
            Frame::from_rgb(self.active_width, self.active_height, rgb, self.frame_count)
        }

        pub(super) fn release(&mut self) {
            if self.state.take().is_some() {
                log::info!("CameraSource: released {}", self.config.device);
            }
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
