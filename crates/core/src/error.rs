//! Error types for presentation translation.

use crate::backend::BackendError;
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading, translating, or rewriting a presentation.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to open or read the input file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// The file format is not supported or could not be detected.
    #[error("Unsupported or unrecognized file format: {0}")]
    UnsupportedFormat(String),

    /// Invalid or corrupted file.
    #[error("Invalid or corrupted file: {0}")]
    CorruptedFile(String),

    /// ZIP archive error.
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML parsing or writing error.
    #[error("XML error: {0}")]
    XmlError(String),

    /// A markup node was malformed beyond recovery while reading it.
    #[error("Extraction error: {0}")]
    ExtractionError(String),

    /// A write target was malformed or contained an unsupported construct.
    #[error("Application error: {0}")]
    ApplicationError(String),

    /// Hyperlink anchor text could not be located in the translated text.
    #[error("Correlation error: {0}")]
    CorrelationError(String),

    /// A slide number outside the presentation.
    #[error("Invalid slide number: {number}. Valid range: 1-{count}")]
    InvalidSlide { number: usize, count: usize },

    /// The translation backend failed or timed out.
    #[error(transparent)]
    Backend(#[from] BackendError),
}
