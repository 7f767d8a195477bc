use std::path::{Path, PathBuf};

use crate::analysis::domain::emotion::Emotion;
use crate::analysis::domain::emotion_analyzer::ImageSource;
use crate::capture::domain::frame_source::FrameSource;
use crate::persistence::domain::image_writer::ImageWriter;
use crate::pipeline::emotion_invoker::EmotionInvoker;
use crate::shared::constants::DEFAULT_CAPTURE_FILENAME;

/// Result of one capture: the label (if any) and where the frame was saved
/// (if the write succeeded). The two are independent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnalysisOutcome {
    pub emotion: Option<Emotion>,
    pub saved_path: Option<PathBuf>,
}

/// Local capture pipeline: read frame → analyze (best-effort) → write.
pub struct CaptureEmotionUseCase {
    source: Box<dyn FrameSource>,
    writer: Box<dyn ImageWriter>,
    invoker: EmotionInvoker,
}

impl CaptureEmotionUseCase {
    /// `source` must already be open.
    pub fn new(
        source: Box<dyn FrameSource>,
        writer: Box<dyn ImageWriter>,
        invoker: EmotionInvoker,
    ) -> Self {
        Self {
            source,
            writer,
            invoker,
        }
    }

    /// Captures one frame, analyses it and saves it to `output`
    /// (default `emotion_capture.jpg`), overwriting any existing file.
    ///
    /// Returns `None` when the source had no frame to give.
    pub fn execute(&mut self, output: Option<&Path>) -> Option<AnalysisOutcome> {
        let frame = match self.source.read_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                log::warn!("No frame available from source");
                return None;
            }
            Err(e) => {
                log::warn!("Frame capture failed: {e}");
                return None;
            }
        };

        let emotion = self.invoker.invoke_best_effort(ImageSource::Frame(&frame));

        let path = output.unwrap_or_else(|| Path::new(DEFAULT_CAPTURE_FILENAME));
        let saved_path = match self.writer.write(path, &frame) {
            Ok(()) => Some(path.to_path_buf()),
            Err(e) => {
                log::warn!("Failed to save frame to {}: {e}", path.display());
                None
            }
        };

        Some(AnalysisOutcome {
            emotion,
            saved_path,
        })
    }

    /// Releases the frame source. Call once at shutdown.
    pub fn release(&mut self) {
        self.source.release();
    }
}
