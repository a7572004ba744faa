//! Slidescene - scene-graph extraction and patch-back for PowerPoint
//! presentations
//!
//! This library walks a `.pptx` package and produces a normalized,
//! serializable scene graph (Document → Slide → Element), patches editor
//! field edits back into the slide XML without disturbing any other byte,
//! and ships an async client for the external conversion service.
//!
//! # Features
//!
//! - **Scene extraction**: shapes, pictures, icons, charts, and layout
//!   placeholders with stable ids and strictly increasing z-order
//! - **Style resolution**: literal, theme-scheme, and inherited-fill
//!   color fallbacks; fonts, sizes, bullets, alignment
//! - **Degradation over failure**: a malformed shape nulls its fields and
//!   extraction continues; only manifest-level defects are fatal
//! - **Patch-back**: byte-surgical text, geometry, and style edits
//!   addressed by element id
//! - **Conversion client** (feature `convert`): pptx/pdf/word pairs over
//!   the service's HTTP contract
//!
//! # Example - Extracting a scene graph
//!
//! ```no_run
//! use slidescene::PptxFile;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let pptx = PptxFile::open("deck.pptx")?;
//! let document = pptx.extract()?;
//!
//! for slide in &document.slides {
//!     for element in &slide.elements {
//!         println!("{} z={}", element.id(), element.z_index());
//!     }
//! }
//! println!("{}", document.to_json_pretty()?);
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Patching an edit back
//!
//! ```no_run
//! use slidescene::{ElementPatch, PptxFile};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut pptx = PptxFile::open("deck.pptx")?;
//! let patch = ElementPatch {
//!     text: Some("Revised title".to_string()),
//!     ..Default::default()
//! };
//! pptx.apply_patch("s1-el1", &patch)?;
//! std::fs::write("deck-edited.pptx", pptx.save()?)?;
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Converting through the service
//!
//! ```no_run
//! use slidescene::convert::{ConversionKind, ConvertClient};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ConvertClient::new("http://localhost:4000");
//! let bytes = std::fs::read("deck.pptx")?;
//! let pdf = client
//!     .convert(ConversionKind::PptxToPdf, "deck.pptx", &bytes)
//!     .await?;
//! std::fs::write(&pdf.file_name, &pdf.data)?;
//! # Ok(())
//! # }
//! ```

/// Error and Result types shared across extraction and patch-back
pub mod error;

/// The serializable scene-graph model (Document → Slide → Element)
pub mod model;

/// Package container access: ordered zip entry store and relationship parts
pub mod opc;

/// Patch-back of editor field edits into slide XML
pub mod patch;

/// Presentation parsing: package manifest, themes, shapes, text, media
pub mod pptx;

/// EMU / centimeter / point / pixel conversions
pub mod unit;

/// Client for the external document-conversion service
#[cfg(feature = "convert")]
pub mod convert;

pub(crate) mod xml;

// Re-export the types nearly every caller touches
pub use error::{Error, Result};
pub use model::{Document, Element, Slide};
pub use patch::{ElementPatch, GeometryPatch, PatchOptions, StylePatch};
pub use pptx::PptxFile;
