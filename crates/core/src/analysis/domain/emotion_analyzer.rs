use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::analysis::domain::analysis_report::AnalysisReport;
use crate::shared::frame::Frame;

/// Image handed to an analysis capability.
#[derive(Clone, Copy, Debug)]
pub enum ImageSource<'a> {
    Frame(&'a Frame),
    File(&'a Path),
}

/// Attribute a capability is asked to analyse.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Emotion,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Emotion => "emotion",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnalysisOptions {
    pub actions: Vec<Action>,
    /// Fail when no face is confidently located instead of analysing the
    /// whole image.
    pub enforce_detection: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            actions: vec![Action::Emotion],
            enforce_detection: false,
        }
    }
}

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("failed to load image {path}: {source}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to encode frame: {0}")]
    Encode(#[source] image::ImageError),
    #[error("face could not be detected in the image")]
    NoFaceDetected,
    #[error("request to analyzer at {url} failed: {source}")]
    Remote {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("analyzer at {url} returned {status}: {body}")]
    RemoteStatus { url: String, status: u16, body: String },
    #[error("analyzer returned malformed JSON: {0}")]
    MalformedResponse(#[source] serde_json::Error),
    #[error("analyzer panicked: {0}")]
    Panicked(String),
    #[error("{0}")]
    Backend(String),
}

/// External emotion-analysis capability.
///
/// Implementations report failure through the return value; callers decide
/// whether a failure degrades to "no label" or surfaces as an error.
pub trait EmotionAnalyzer: Send {
    fn analyze(
        &mut self,
        image: ImageSource<'_>,
        options: &AnalysisOptions,
    ) -> Result<AnalysisReport, AnalysisError>;
}
