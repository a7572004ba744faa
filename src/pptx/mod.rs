//! PowerPoint package reading and scene-graph extraction.
//!
//! [`PptxFile`] opens the package and exposes its parts; `extract` walks
//! every slide into the serializable model. Parsing is a single pass per
//! concern over each shape's subtree bytes, so no DOM is ever built.

mod background;
mod extract;
pub(crate) mod geometry;
mod package;
mod picture;
pub(crate) mod shape;
mod style;
mod text;
mod theme;

pub use package::PptxFile;
pub use theme::ColorScheme;
