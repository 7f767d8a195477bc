use crate::shared::frame::Frame;

/// An explicitly owned image source, such as a camera device.
///
/// The handle is opened once, read any number of times and released once.
/// `read_frame` returning `Ok(None)` means no frame is available right now;
/// callers treat that as a normal, retryable outcome.
pub trait FrameSource: Send {
    fn open(&mut self) -> Result<(), Box<dyn std::error::Error>>;

    fn read_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>>;

    /// Releases the underlying device. Safe to call more than once.
    fn release(&mut self);
}
