//! Where a job's image bytes come from.

use std::path::{Path, PathBuf};

/// Errors raised while reading image bytes.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The source produced no bytes.
    #[error("image source is empty")]
    Empty,
}

/// Resolves a locator to raw, still-encoded image bytes.
///
/// Called once, on the worker thread, when a job starts.
pub trait ImageSource: Send {
    /// Read the whole encoded image.
    ///
    /// # Errors
    ///
    /// Returns a [`SourceError`] if the bytes cannot be produced.
    fn read(&self) -> Result<Vec<u8>, SourceError>;

    /// Human-readable locator for log lines.
    fn describe(&self) -> String;
}

impl ImageSource for PathBuf {
    fn read(&self) -> Result<Vec<u8>, SourceError> {
        read_file(self)
    }

    fn describe(&self) -> String {
        self.display().to_string()
    }
}

impl ImageSource for Vec<u8> {
    fn read(&self) -> Result<Vec<u8>, SourceError> {
        if self.is_empty() {
            return Err(SourceError::Empty);
        }
        Ok(self.clone())
    }

    fn describe(&self) -> String {
        format!("<{} bytes in memory>", self.len())
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, SourceError> {
    let bytes = std::fs::read(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if bytes.is_empty() {
        return Err(SourceError::Empty);
    }
    Ok(bytes)
}
