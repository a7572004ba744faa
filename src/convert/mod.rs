//! Client for the external document-conversion service.
//!
//! The service converts between presentation, PDF, and word-processor
//! formats. Conversions are idempotent on the service side, which is what
//! licenses the client's single bounded retry on transport failures.
//!
//! This module carries its own error enum rather than reusing
//! [`crate::Error`]: converter failures are collaborator verdicts, not
//! package defects, and callers route them differently.

mod client;

pub use client::ConvertClient;

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use phf::phf_map;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upload cap enforced before any bytes leave the process. Mirrors the
/// service's own limit, so oversized payloads fail fast without a round
/// trip.
pub const MAX_UPLOAD_BYTES: usize = 200 * 1024 * 1024;

/// Result type for conversion operations.
pub type ConvertResult<T> = std::result::Result<T, ConvertError>;

static CONVERSION_KINDS: phf::Map<&'static str, ConversionKind> = phf_map! {
    "pptx-to-pdf" => ConversionKind::PptxToPdf,
    "pdf-to-pptx" => ConversionKind::PdfToPptx,
    "pptx-to-word" => ConversionKind::PptxToWord,
    "word-to-pptx" => ConversionKind::WordToPptx,
    "pdf-to-word" => ConversionKind::PdfToWord,
    "word-to-pdf" => ConversionKind::WordToPdf,
};

/// One supported conversion pair, named as the service's `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConversionKind {
    PptxToPdf,
    PdfToPptx,
    PptxToWord,
    WordToPptx,
    PdfToWord,
    WordToPdf,
}

impl ConversionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversionKind::PptxToPdf => "pptx-to-pdf",
            ConversionKind::PdfToPptx => "pdf-to-pptx",
            ConversionKind::PptxToWord => "pptx-to-word",
            ConversionKind::WordToPptx => "word-to-pptx",
            ConversionKind::PdfToWord => "pdf-to-word",
            ConversionKind::WordToPdf => "word-to-pdf",
        }
    }

    /// Extension of the converted output, with the dot.
    pub fn target_extension(&self) -> &'static str {
        match self {
            ConversionKind::PptxToPdf | ConversionKind::WordToPdf => ".pdf",
            ConversionKind::PdfToPptx | ConversionKind::WordToPptx => ".pptx",
            ConversionKind::PptxToWord | ConversionKind::PdfToWord => ".docx",
        }
    }

    /// Rename an input file to the pair's output extension, keeping the stem.
    pub fn output_file_name(&self, input: &str) -> String {
        let stem = input.rsplit_once('.').map(|(s, _)| s).unwrap_or(input);
        format!("{}{}", stem, self.target_extension())
    }
}

impl fmt::Display for ConversionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConversionKind {
    type Err = ConvertError;

    fn from_str(s: &str) -> ConvertResult<Self> {
        CONVERSION_KINDS
            .get(s)
            .copied()
            .ok_or_else(|| ConvertError::InvalidInput(format!("unknown conversion type '{}'", s)))
    }
}

/// Conversion failure taxonomy.
///
/// The messages keep the three user-visible categories apart: the input was
/// bad, the service failed, or the network/timeout got in the way.
#[derive(Error, Debug)]
pub enum ConvertError {
    /// The service rejected the input, or the payload breaks the upload cap
    #[error("invalid input file: {0}")]
    InvalidInput(String),

    /// The service accepted the input but failed the conversion
    #[error("conversion service error: {0}")]
    Service(String),

    /// Client-enforced deadline passed
    #[error("conversion timed out after {0}s")]
    Timeout(u64),

    /// Transport failure before a verdict arrived
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// 200 response the client cannot use
    #[error("invalid converter response: {0}")]
    InvalidResponse(String),
}

impl ConvertError {
    /// Whether retrying the same input can reasonably succeed. Service
    /// verdicts are final; only transport-level failures qualify.
    pub fn is_transient(&self) -> bool {
        matches!(self, ConvertError::Timeout(_) | ConvertError::Network(_))
    }
}

/// A converted document returned by the service.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertedFile {
    /// Output name from Content-Disposition, or derived from the input name
    pub file_name: String,
    pub data: Bytes,
}
