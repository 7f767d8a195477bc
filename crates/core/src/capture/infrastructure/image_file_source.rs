use std::path::{Path, PathBuf};

use crate::capture::domain::frame_source::FrameSource;
use crate::capture::infrastructure::image_decoder::open_image;
use crate::shared::frame::Frame;

/// Adapts a still image file to the [`FrameSource`] interface.
///
/// Yields the decoded image once, then reports no further frames.
pub struct ImageFileSource {
    path: PathBuf,
    frame: Option<Frame>,
}

impl ImageFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            frame: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FrameSource for ImageFileSource {
    fn open(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let frame = open_image(&self.path)
            .map_err(|e| format!("cannot read {}: {e}", self.path.display()))?;
        self.frame = Some(frame);
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        Ok(self.frame.take())
    }

    fn release(&mut self) {
        self.frame = None;
    }
}
