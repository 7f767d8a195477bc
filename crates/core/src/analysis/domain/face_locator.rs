use crate::shared::frame::Frame;

/// Pixel-space face rectangle with the locator's confidence.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub confidence: f64,
}

impl FaceBox {
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// Domain interface for locating faces in a frame.
///
/// Implementations return boxes clamped to the frame, ordered by
/// descending confidence.
pub trait FaceLocator: Send {
    fn locate(&mut self, frame: &Frame) -> Result<Vec<FaceBox>, Box<dyn std::error::Error>>;
}
