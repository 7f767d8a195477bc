use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use crate::analysis::domain::analysis_report::FaceSelection;
use crate::analysis::domain::emotion::Emotion;
use crate::analysis::domain::emotion_analyzer::{
    AnalysisError, AnalysisOptions, EmotionAnalyzer, ImageSource,
};

/// Boundary around the analysis capability.
///
/// Failures, panics included, come back as `Err` values; a report without a
/// usable label comes back as `Ok(None)`.
pub struct EmotionInvoker {
    analyzer: Box<dyn EmotionAnalyzer>,
    options: AnalysisOptions,
    selection: FaceSelection,
}

impl EmotionInvoker {
    pub fn new(
        analyzer: Box<dyn EmotionAnalyzer>,
        options: AnalysisOptions,
        selection: FaceSelection,
    ) -> Self {
        Self {
            analyzer,
            options,
            selection,
        }
    }

    pub fn invoke(&mut self, image: ImageSource<'_>) -> Result<Option<Emotion>, AnalysisError> {
        let analyzer = &mut self.analyzer;
        let options = &self.options;
        let report = panic::catch_unwind(AssertUnwindSafe(|| analyzer.analyze(image, options)))
            .map_err(|payload| AnalysisError::Panicked(panic_message(payload.as_ref())))??;

        let emotion = report.dominant_emotion(self.selection).cloned();
        match &emotion {
            Some(label) => log::debug!(
                "Dominant emotion '{label}' ({} face(s) reported)",
                report.face_count()
            ),
            None => log::debug!(
                "No dominant emotion in report ({} face(s), selection {})",
                report.face_count(),
                self.selection
            ),
        }
        Ok(emotion)
    }

    /// Like [`invoke`](Self::invoke), degrading any failure to "no label".
    pub fn invoke_best_effort(&mut self, image: ImageSource<'_>) -> Option<Emotion> {
        self.invoke(image).unwrap_or_else(|e| {
            log::warn!("Emotion analysis failed: {e}");
            None
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
