//! Open Packaging Conventions, the container layer.
//!
//! A `.pptx` file is a ZIP archive of named parts plus `.rels` parts wiring
//! them together. This module covers exactly what extraction and patch-back
//! need:
//!
//! - [`Package`]: eager, order-preserving entry access and repacking
//! - [`Relationships`]: per-part id → target tables with relative-path
//!   normalization

pub mod archive;
pub mod rels;

pub use archive::Package;
pub use rels::{Relationship, Relationships};
