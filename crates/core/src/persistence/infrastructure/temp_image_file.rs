use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

const PREFIX: &str = "emotion-";

/// Uniquely named image file that is deleted when the guard is dropped.
///
/// Every exit from the owning scope, including unwinding, removes the file.
#[derive(Debug)]
pub struct TempImageFile {
    file: NamedTempFile,
}

impl TempImageFile {
    /// Writes `bytes` to a new file `emotion-XXXXXX<extension>` inside `dir`.
    pub fn create_in(dir: &Path, extension: &str, bytes: &[u8]) -> io::Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix(PREFIX)
            .suffix(extension)
            .tempfile_in(dir)?;
        file.write_all(bytes)?;
        file.flush()?;
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}
