//! Error types for the conversion pipeline.
//!
//! Each pipeline stage has its own error enum; [`Error`] wraps them so the
//! top-level conversion can propagate any failure with `?`.

use std::io;
use std::path::PathBuf;
use std::string::FromUtf8Error;

use thiserror::Error;

/// Result type alias for conversion operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Any failure that aborts a conversion run.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Write(#[from] WriteError),
}

/// Failure reading the markdown source.
#[derive(Error, Debug)]
pub enum LoadError {
    /// The input path does not exist.
    #[error("Input file not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// The input is not valid UTF-8.
    #[error("Input file '{}' is not valid UTF-8: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: FromUtf8Error,
    },

    /// Any other I/O failure (permissions, path is a directory, ...).
    #[error("Failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Failure turning the composed HTML into PDF bytes. Markdown rendering
/// itself is infallible, so it has no variant here.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("PDF rendering failed: {0}")]
    Pdf(String),
}

/// Failure writing the PDF to disk.
#[derive(Error, Debug)]
#[error("Failed to write '{}': {source}", path.display())]
pub struct WriteError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_error_message_names_path() {
        let err: Error = LoadError::NotFound {
            path: PathBuf::from("guide.md"),
        }
        .into();
        assert_eq!(err.to_string(), "Input file not found: guide.md");
    }

    #[test]
    fn render_error_carries_cause() {
        let err: Error = RenderError::Pdf("font table corrupt".to_string()).into();
        assert!(err.to_string().contains("font table corrupt"));
        assert!(matches!(err, Error::Render(RenderError::Pdf(_))));
    }
}
