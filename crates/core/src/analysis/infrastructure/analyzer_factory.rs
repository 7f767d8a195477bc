use std::path::PathBuf;
use std::time::Duration;

use crate::analysis::domain::emotion_analyzer::EmotionAnalyzer;
use crate::analysis::infrastructure::local_emotion_analyzer::LocalEmotionAnalyzer;
use crate::analysis::infrastructure::onnx_emotion_classifier::OnnxEmotionClassifier;
use crate::analysis::infrastructure::onnx_face_locator::{OnnxFaceLocator, DEFAULT_CONFIDENCE};
use crate::analysis::infrastructure::remote_emotion_analyzer::{
    RemoteEmotionAnalyzer, DEFAULT_TIMEOUT,
};
use crate::shared::model_resolver::{self, ProgressFn, EMOTION_MODEL, FACE_MODEL};

/// Which analysis capability to construct.
#[derive(Clone, Debug, PartialEq)]
pub enum AnalyzerBackend {
    /// Bundled ONNX models run in-process.
    Onnx {
        confidence: f64,
        /// Directory checked for model files before downloading.
        model_dir: Option<PathBuf>,
    },
    /// Upstream DeepFace-style HTTP service.
    Remote { url: String, timeout: Duration },
}

impl Default for AnalyzerBackend {
    fn default() -> Self {
        AnalyzerBackend::Onnx {
            confidence: DEFAULT_CONFIDENCE,
            model_dir: None,
        }
    }
}

impl AnalyzerBackend {
    pub fn remote(url: impl Into<String>) -> Self {
        AnalyzerBackend::Remote {
            url: url.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Builds the analysis capability, resolving (and if needed downloading)
/// model files for the ONNX backend.
pub fn create_analyzer(
    backend: &AnalyzerBackend,
    progress: Option<fn(u64, u64)>,
) -> Result<Box<dyn EmotionAnalyzer>, Box<dyn std::error::Error>> {
    match backend {
        AnalyzerBackend::Onnx {
            confidence,
            model_dir,
        } => {
            let boxed = |cb: fn(u64, u64)| -> ProgressFn { Box::new(cb) };
            let face_model =
                model_resolver::resolve(FACE_MODEL, model_dir.as_deref(), progress.map(boxed))?;
            let emotion_model =
                model_resolver::resolve(EMOTION_MODEL, model_dir.as_deref(), progress.map(boxed))?;

            log::info!("Using ONNX emotion analyzer");
            Ok(Box::new(LocalEmotionAnalyzer::new(
                Box::new(OnnxFaceLocator::new(&face_model, *confidence)?),
                Box::new(OnnxEmotionClassifier::new(&emotion_model)?),
            )))
        }
        AnalyzerBackend::Remote { url, timeout } => {
            log::info!("Using remote emotion analyzer at {url} (timeout {timeout:?})");
            Ok(Box::new(RemoteEmotionAnalyzer::new(url.clone(), *timeout)?))
        }
    }
}
