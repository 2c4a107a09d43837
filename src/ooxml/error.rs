//! Errors raised while reading an OOXML package.

/// Errors produced by the package reader and the part parsers
#[derive(Debug, thiserror::Error)]
pub enum OoxmlError {
    /// The container is not a readable zip archive
    #[error("Invalid package archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Reading an archive entry failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A part contains XML that cannot be parsed
    #[error("Malformed XML in part {part}: {message}")]
    Xml { part: String, message: String },
}

impl OoxmlError {
    pub(crate) fn xml(part: &str, err: roxmltree::Error) -> Self {
        OoxmlError::Xml {
            part: part.to_string(),
            message: err.to_string(),
        }
    }
}
