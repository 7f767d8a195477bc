use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, ValueEnum};

use crate::analysis::domain::analysis_report::FaceSelection;
use crate::analysis::domain::emotion_analyzer::AnalysisOptions;
use crate::analysis::infrastructure::analyzer_factory::AnalyzerBackend;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    Onnx,
    Remote,
}

/// Analyzer options shared by the capture utility and the service.
#[derive(Args, Clone, Debug)]
pub struct AnalyzerArgs {
    /// Analysis capability: local ONNX models or a remote service.
    #[arg(long, value_enum, default_value = "onnx")]
    pub backend: BackendKind,

    /// URL of the remote analysis service (`--backend remote`).
    #[arg(long, env = "EMOTION_ANALYZER_URL")]
    pub analyzer_url: Option<String>,

    /// Request timeout for the remote analysis service, in seconds.
    #[arg(long, default_value = "20")]
    pub remote_timeout_secs: u64,

    /// Face locator confidence threshold (0.0-1.0).
    #[arg(long, default_value = "0.25")]
    pub confidence: f64,

    /// Directory checked for model files before downloading.
    #[arg(long, env = "EMOTION_MODEL_DIR")]
    pub model_dir: Option<PathBuf>,

    /// Fail analysis when no face is located instead of analysing the whole image.
    #[arg(long)]
    pub enforce_detection: bool,

    /// Which face to report when several are found: first or single.
    #[arg(long, default_value = "first")]
    pub face_selection: FaceSelection,
}

impl AnalyzerArgs {
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(format!(
                "Confidence must be between 0.0 and 1.0, got {}",
                self.confidence
            ));
        }
        if self.backend == BackendKind::Remote && self.analyzer_url.is_none() {
            return Err("--analyzer-url is required with --backend remote".to_string());
        }
        if self.remote_timeout_secs == 0 {
            return Err("Remote timeout must be at least 1 second".to_string());
        }
        Ok(())
    }

    pub fn backend(&self) -> AnalyzerBackend {
        match (self.backend, &self.analyzer_url) {
            (BackendKind::Remote, Some(url)) => AnalyzerBackend::Remote {
                url: url.clone(),
                timeout: Duration::from_secs(self.remote_timeout_secs),
            },
            _ => AnalyzerBackend::Onnx {
                confidence: self.confidence,
                model_dir: self.model_dir.clone(),
            },
        }
    }

    pub fn options(&self) -> AnalysisOptions {
        AnalysisOptions {
            enforce_detection: self.enforce_detection,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{CommandFactory, Parser};

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        analyzer: AnalyzerArgs,
    }

    fn parse(args: &[&str]) -> AnalyzerArgs {
        TestCli::parse_from(std::iter::once("test").chain(args.iter().copied())).analyzer
    }

    #[test]
    fn test_defaults_are_relaxed_onnx_first_face() {
        let args = parse(&[]);
        assert_eq!(args.backend, BackendKind::Onnx);
        assert_eq!(args.face_selection, FaceSelection::First);
        assert!(!args.options().enforce_detection);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_remote_requires_url() {
        let mut args = parse(&["--backend", "remote"]);
        args.analyzer_url = None;
        assert_eq!(
            args.validate(),
            Err("--analyzer-url is required with --backend remote".to_string())
        );
    }

    #[test]
    fn test_analyzer_url_reads_env_name() {
        let env = TestCli::command()
            .get_arguments()
            .find(|arg| arg.get_id() == "analyzer_url")
            .and_then(|arg| arg.get_env())
            .map(|env| env.to_string_lossy().into_owned());
        assert_eq!(env.as_deref(), Some("EMOTION_ANALYZER_URL"));
    }

    #[test]
    fn test_remote_backend_carries_url_and_timeout() {
        let args = parse(&[
            "--backend",
            "remote",
            "--analyzer-url",
            "http://127.0.0.1:7000/analyze",
            "--remote-timeout-secs",
            "5",
        ]);
        assert_eq!(
            args.backend(),
            AnalyzerBackend::Remote {
                url: "http://127.0.0.1:7000/analyze".to_string(),
                timeout: Duration::from_secs(5),
            }
        );
    }

    #[test]
    fn test_confidence_out_of_range_is_rejected() {
        assert!(parse(&["--confidence", "1.5"]).validate().is_err());
    }

    #[test]
    fn test_face_selection_single() {
        let args = parse(&["--face-selection", "single", "--enforce-detection"]);
        assert_eq!(args.face_selection, FaceSelection::Single);
        assert!(args.options().enforce_detection);
    }
}
