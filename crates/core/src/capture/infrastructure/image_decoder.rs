use std::io::Cursor;
use std::path::Path;

use crate::shared::frame::Frame;

/// Decodes an encoded image (JPEG, PNG, MJPEG buffer, ...) into an RGB frame.
pub fn decode_image(bytes: &[u8]) -> Result<Frame, image::ImageError> {
    let img = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(image::ImageError::IoError)?
        .decode()?;
    Ok(Frame::from_rgb_image(img.to_rgb8()))
}

/// Opens an image file, sniffing the format from its content rather than
/// trusting the extension.
pub fn open_image(path: &Path) -> Result<Frame, image::ImageError> {
    let img = image::ImageReader::open(path)
        .map_err(image::ImageError::IoError)?
        .with_guessed_format()
        .map_err(image::ImageError::IoError)?
        .decode()?;
    Ok(Frame::from_rgb_image(img.to_rgb8()))
}
