use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use thiserror::Error;

use emotion_core::analysis::infrastructure::analyzer_args::AnalyzerArgs;
use emotion_core::shared::constants::DEFAULT_SERVICE_PORT;

const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("upload directory {0} does not exist or is not a directory")]
    UploadDir(PathBuf),
    #[error("analysis timeout must be at least 1 second")]
    ZeroTimeout,
    #[error("maximum upload size must be non-zero")]
    ZeroUploadLimit,
    #[error("{0}")]
    Analyzer(String),
}

/// HTTP service returning the dominant emotion of an uploaded image.
#[derive(Parser, Debug, Clone)]
#[command(name = "emotion-service")]
pub struct ServiceConfig {
    /// Address to bind.
    #[arg(long, default_value = "127.0.0.1")]
    pub host: IpAddr,

    /// Port to listen on [default: 6000].
    #[arg(long, env = "EMOTION_DETECT_PORT")]
    pub port: Option<u16>,

    /// Port from the older `PY_DETECT_PORT` variable, used when `--port` is unset.
    #[arg(long, env = "PY_DETECT_PORT", hide = true)]
    pub legacy_port: Option<u16>,

    /// Directory for staged uploads (defaults to the system temp dir).
    #[arg(long, env = "EMOTION_UPLOAD_DIR")]
    pub upload_dir: Option<PathBuf>,

    /// Largest accepted request body, in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    pub max_upload_bytes: usize,

    /// Upper bound on a single analysis, in seconds.
    #[arg(long, default_value = "20")]
    pub analysis_timeout_secs: u64,

    #[command(flatten)]
    pub analyzer: AnalyzerArgs,
}

impl ServiceConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.analyzer.validate().map_err(ConfigError::Analyzer)?;
        if self.analysis_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.max_upload_bytes == 0 {
            return Err(ConfigError::ZeroUploadLimit);
        }
        let dir = self.upload_dir();
        if !dir.is_dir() {
            return Err(ConfigError::UploadDir(dir));
        }
        Ok(())
    }

    pub fn port(&self) -> u16 {
        self.port
            .or(self.legacy_port)
            .unwrap_or(DEFAULT_SERVICE_PORT)
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port())
    }

    pub fn upload_dir(&self) -> PathBuf {
        self.upload_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    pub fn analysis_timeout(&self) -> Duration {
        Duration::from_secs(self.analysis_timeout_secs)
    }
}
