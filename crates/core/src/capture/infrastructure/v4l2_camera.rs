use std::io::ErrorKind;
use std::path::PathBuf;

use v4l::buffer::Type;
use v4l::io::mmap::Stream as MmapStream;
use v4l::io::traits::CaptureStream;
use v4l::video::Capture;
use v4l::{Device, Format, FourCC};

use crate::capture::domain::frame_source::FrameSource;
use crate::capture::infrastructure::image_decoder::decode_image;
use crate::shared::constants::DEFAULT_CAMERA_DEVICE;
use crate::shared::frame::Frame;

const BUFFER_COUNT: u32 = 4;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CameraConfig {
    pub device: PathBuf,
    pub width: u32,
    pub height: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device: PathBuf::from(DEFAULT_CAMERA_DEVICE),
            width: 640,
            height: 480,
        }
    }
}

/// V4L2 webcam capturing MJPEG frames through a memory-mapped stream.
pub struct V4l2Camera {
    config: CameraConfig,
    // Declared before `device` so the stream is dropped first.
    stream: Option<MmapStream<'static>>,
    device: Option<Device>,
}

impl std::fmt::Debug for V4l2Camera {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("V4l2Camera")
            .field("config", &self.config)
            .field("open", &self.stream.is_some())
            .finish()
    }
}

impl V4l2Camera {
    pub fn new(config: CameraConfig) -> Self {
        Self {
            config,
            stream: None,
            device: None,
        }
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }
}

impl FrameSource for V4l2Camera {
    /// Opens the device and negotiates MJPEG at the configured resolution.
    fn open(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if self.stream.is_some() {
            return Ok(());
        }

        let device = Device::with_path(&self.config.device)?;
        let mjpg = FourCC::new(b"MJPG");
        let requested = Format::new(self.config.width, self.config.height, mjpg);
        let format = Capture::set_format(&device, &requested)?;
        if format.fourcc != mjpg {
            return Err(format!(
                "{} does not support MJPEG capture",
                self.config.device.display()
            )
            .into());
        }

        let stream = MmapStream::with_buffers(&device, Type::VideoCapture, BUFFER_COUNT)?;
        log::info!(
            "Opened camera {} at {}x{}",
            self.config.device.display(),
            format.width,
            format.height
        );
        self.stream = Some(stream);
        self.device = Some(device);
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        let stream = self.stream.as_mut().ok_or("camera is not open")?;

        let (buf, meta) = match CaptureStream::next(stream) {
            Ok(next) => next,
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::Interrupted) => {
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let used = (meta.bytesused as usize).min(buf.len());
        if used == 0 {
            return Ok(None);
        }
        Ok(Some(decode_image(&buf[..used])?))
    }

    fn release(&mut self) {
        if self.stream.take().is_some() {
            log::info!("Released camera {}", self.config.device.display());
        }
        self.device = None;
    }
}

impl Drop for V4l2Camera {
    fn drop(&mut self) {
        self.release();
    }
}
