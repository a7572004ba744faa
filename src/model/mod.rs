//! Serializable scene-graph model.
//!
//! Pure data: no XML types leak in here, and everything serializes to the
//! camelCase wire shape editors consume. Optional fields serialize as
//! explicit nulls so downstream `=== null` checks stay valid.

pub mod document;
pub mod element;
pub mod text;

pub use document::{Background, Document, Slide, SlideSize};
pub use element::{
    ChartElement, Element, ElementFamily, ElementId, Geometry, ImageFormat, MediaKind,
    PictureElement, PlaceholderRole, ShapeElement,
};
pub use text::{Alignment, Bullet, BulletKind, Paragraph, Run, StyleBlock, TextContent};
