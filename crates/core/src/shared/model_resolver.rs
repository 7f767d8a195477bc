use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::shared::constants::{
    EMOTION_MODEL_NAME, EMOTION_MODEL_URL, FACE_MODEL_NAME, FACE_MODEL_URL,
};

const APP_DIR: &str = "EmotionDetect";

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("failed to create cache directory: {0}")]
    CacheDir(#[source] std::io::Error),
    #[error("download failed for {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("download interrupted for {url}: {source}")]
    Interrupted {
        url: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write model to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not determine cache directory")]
    NoCacheDir,
}

/// A downloadable model file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModelSpec {
    pub name: &'static str,
    pub url: &'static str,
}

pub const FACE_MODEL: ModelSpec = ModelSpec {
    name: FACE_MODEL_NAME,
    url: FACE_MODEL_URL,
};

pub const EMOTION_MODEL: ModelSpec = ModelSpec {
    name: EMOTION_MODEL_NAME,
    url: EMOTION_MODEL_URL,
};

/// Progress callback: `(bytes_downloaded, total_bytes)`.
/// `total_bytes` is 0 if the server didn't provide Content-Length.
pub type ProgressFn = Box<dyn Fn(u64, u64) + Send>;

/// Resolve a model file, checking cache locations before downloading.
///
/// Resolution order:
/// 1. User cache directory (platform-specific)
/// 2. Bundled path (for development / pre-packaged installs)
/// 3. Download from URL to cache
pub fn resolve(
    model: ModelSpec,
    bundled_dir: Option<&Path>,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, ModelResolveError> {
    resolve_in(&model_cache_dir()?, model, bundled_dir, progress)
}

fn resolve_in(
    cache_dir: &Path,
    model: ModelSpec,
    bundled_dir: Option<&Path>,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, ModelResolveError> {
    let cached_path = cache_dir.join(model.name);
    if cached_path.exists() {
        return Ok(cached_path);
    }

    if let Some(bundled_path) = bundled_dir.map(|dir| dir.join(model.name)) {
        if bundled_path.exists() {
            return Ok(bundled_path);
        }
    }

    log::info!("Downloading {} from {}", model.name, model.url);
    fs::create_dir_all(cache_dir).map_err(ModelResolveError::CacheDir)?;
    download(model.url, &cached_path, progress)?;
    Ok(cached_path)
}

/// Platform-specific model cache directory.
///
/// - macOS: `~/Library/Application Support/EmotionDetect/models/`
/// - Linux: `$XDG_CACHE_HOME/EmotionDetect/models/` or `~/.cache/EmotionDetect/models/`
/// - Windows: `%LOCALAPPDATA%/EmotionDetect/models/`
pub fn model_cache_dir() -> Result<PathBuf, ModelResolveError> {
    #[cfg(target_os = "macos")]
    let base = dirs::data_dir();
    #[cfg(not(target_os = "macos"))]
    let base = dirs::cache_dir();

    base.map(|d| d.join(APP_DIR).join("models"))
        .ok_or(ModelResolveError::NoCacheDir)
}

fn download(url: &str, dest: &Path, progress: Option<ProgressFn>) -> Result<(), ModelResolveError> {
    let temp_path = dest.with_extension("part");

    let result = download_inner(url, dest, &temp_path, progress);

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }

    result
}

fn download_inner(
    url: &str,
    dest: &Path,
    temp_path: &Path,
    progress: Option<ProgressFn>,
) -> Result<(), ModelResolveError> {
    let mut response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(|e| ModelResolveError::Download {
            url: url.to_string(),
            source: e,
        })?;

    let total = response.content_length().unwrap_or(0);
    let write_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source| ModelResolveError::Write { path, source }
    };

    let mut file = fs::File::create(temp_path).map_err(write_err(temp_path))?;
    stream_to(&mut response, &mut file, url, temp_path, total, progress.as_ref())?;
    file.flush().map_err(write_err(temp_path))?;
    drop(file);

    fs::rename(temp_path, dest).map_err(write_err(dest))
}

/// Copies `reader` into `writer` in chunks, reporting progress. Read errors
/// are download failures; write errors belong to `temp_path`.
fn stream_to(
    reader: &mut impl Read,
    writer: &mut impl Write,
    url: &str,
    temp_path: &Path,
    total: u64,
    progress: Option<&ProgressFn>,
) -> Result<u64, ModelResolveError> {
    // Stream in chunks; the emotion model alone is ~35MB.
    let mut buf = vec![0u8; 256 * 1024];
    let mut downloaded: u64 = 0;
    loop {
        let n = reader
            .read(&mut buf)
            .map_err(|source| ModelResolveError::Interrupted {
                url: url.to_string(),
                source,
            })?;
        if n == 0 {
            break;
        }
        writer
            .write_all(&buf[..n])
            .map_err(|source| ModelResolveError::Write {
                path: temp_path.to_path_buf(),
                source,
            })?;
        downloaded += n as u64;
        if let Some(cb) = progress {
            cb(downloaded, total);
        }
    }
    Ok(downloaded)
}
