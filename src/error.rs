//! Errors that abort an export.

use crate::ooxml::OoxmlError;

/// Fatal export errors. Missing optional parts never surface here.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The package has no main document part
    #[error("Main document part is missing")]
    MissingMainDocument,

    /// The package or the main document part could not be read
    #[error(transparent)]
    Package(#[from] OoxmlError),

    /// Export options could not be deserialized
    #[error("Invalid export options: {0}")]
    InvalidOptions(#[from] serde_json::Error),
}
