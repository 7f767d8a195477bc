use std::path::Path;

use crate::persistence::domain::image_writer::ImageWriter;
use crate::shared::frame::Frame;

/// Writes a single frame to an image file using the `image` crate.
pub struct ImageFileWriter;

impl ImageFileWriter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ImageFileWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageWriter for ImageFileWriter {
    fn write(&self, path: &Path, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let img = frame
            .to_rgb_image()
            .ok_or("Failed to create image from frame data")?;
        img.save(path)?;
        Ok(())
    }
}
