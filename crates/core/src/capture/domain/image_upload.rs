use std::path::Path;

use thiserror::Error;

use crate::shared::constants::DEFAULT_UPLOAD_EXTENSION;

/// Why an upload produced no image.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadRejection {
    #[error("no image file provided")]
    MissingImage,
    #[error("empty filename")]
    EmptyFilename,
    #[error("invalid upload")]
    Unreadable(String),
}

/// An uploaded image file that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    filename: String,
    bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Result<Self, UploadRejection> {
        let filename = filename.into();
        if filename.is_empty() {
            return Err(UploadRejection::EmptyFilename);
        }
        Ok(Self { filename, bytes })
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Extension of the original filename with a leading dot, or `.jpg`.
    pub fn extension(&self) -> String {
        Path::new(&self.filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .filter(|ext| !ext.is_empty())
            .map(|ext| format!(".{ext}"))
            .unwrap_or_else(|| DEFAULT_UPLOAD_EXTENSION.to_string())
    }
}
