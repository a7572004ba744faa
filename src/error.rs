//! Error types for extraction and patch-back.

use thiserror::Error;

/// Result type for extraction and patch-back operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for extraction and patch-back.
///
/// Only document-fatal conditions surface here. Per-element degradations
/// (a shape without a transform, an image whose media entry is missing, an
/// unsupported raster format) are not errors: the affected field goes null
/// or gets flagged, a warning is logged, and extraction continues.
#[derive(Error, Debug)]
pub enum Error {
    /// Required package structure is missing or unreadable
    #[error("malformed presentation: {0}")]
    MalformedInput(String),

    /// Part not found
    #[error("part not found: {0}")]
    PartNotFound(String),

    /// XML parsing error
    #[error("XML error: {0}")]
    Xml(String),

    /// ZIP container error
    #[error("container error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Patch-back could not locate the target shape node
    #[error("patch target not found for element '{element_id}'")]
    PatchTargetNotFound { element_id: String },

    /// Element id string does not decode to slide/ordinal
    #[error("invalid element id: {0}")]
    InvalidElementId(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::Xml(err.to_string())
    }
}
