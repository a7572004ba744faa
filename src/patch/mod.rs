//! Patch-back of editor field edits into slide XML.
//!
//! An element id addresses its source node: family ordinals count source
//! nodes, so siblings that degraded during extraction never shift them.
//! Patching relocates that node, rewrites only the edited fields inside
//! its subtree, and splices the result over the original byte span. Every
//! byte outside the rewritten nodes keeps its exact source value, which
//! keeps diffs of a patched part reviewable and leaves untouched parts
//! bit-identical on resave.
//!
//! Charts are opaque part references and layout placeholders live in parts
//! shared across slides, so ids of either family are refused rather than
//! guessed at.

mod locate;
mod rewrite;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{ElementFamily, ElementId, Geometry};
use crate::pptx::PptxFile;

/// Field edits for one element. Absent fields are left untouched.
///
/// `original_geometry` is not an edit: it carries the geometry captured at
/// extraction time, used to relocate the target when edits elsewhere have
/// renumbered the shape tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ElementPatch {
    /// Replacement for the shape's first text node
    pub text: Option<String>,
    /// Position and size edits, in EMU
    pub geometry: Option<GeometryPatch>,
    /// Style edits for the run holding the first text node
    pub style: Option<StylePatch>,
    pub original_geometry: Option<Geometry>,
}

impl ElementPatch {
    /// Whether no field edit is present.
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.geometry.is_none() && self.style.is_none()
    }
}

/// Position and size edits in EMU. Absent axes keep their source values.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeometryPatch {
    pub x_emu: Option<i64>,
    pub y_emu: Option<i64>,
    pub w_emu: Option<i64>,
    pub h_emu: Option<i64>,
}

/// Run-level style edits.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StylePatch {
    /// Font size in points
    pub font_size: Option<f64>,
    /// Literal colour, `#RRGGBB` or `RRGGBB`
    pub color: Option<String>,
    pub bold: Option<bool>,
}

/// Tuning knobs for patch application.
#[derive(Debug, Clone, Copy)]
pub struct PatchOptions {
    /// Per-axis tolerance of the geometry-proximity fallback, in EMU
    pub tolerance_emu: i64,
}

impl Default for PatchOptions {
    fn default() -> Self {
        Self {
            tolerance_emu: 50_000,
        }
    }
}

impl PptxFile {
    /// Apply field edits to one element, with default [`PatchOptions`].
    pub fn apply_patch(&mut self, element_id: &str, patch: &ElementPatch) -> Result<()> {
        self.apply_patch_with(element_id, patch, &PatchOptions::default())
    }

    /// Apply field edits to the element the id points at.
    ///
    /// Only the nodes backing requested fields are rewritten; all other
    /// bytes of the slide part are preserved exactly. The package is left
    /// untouched on any error, so a failed patch never half-applies.
    ///
    /// Fails with [`Error::PatchTargetNotFound`] when the id's family is
    /// not patchable, the slide or shape cannot be located, or a requested
    /// field has no node to land on.
    pub fn apply_patch_with(
        &mut self,
        element_id: &str,
        patch: &ElementPatch,
        options: &PatchOptions,
    ) -> Result<()> {
        if patch.is_empty() {
            return Ok(());
        }
        let id: ElementId = element_id.parse()?;
        if !matches!(id.family, ElementFamily::Shape | ElementFamily::Media) {
            return Err(Error::PatchTargetNotFound {
                element_id: element_id.to_string(),
            });
        }
        let path = self
            .slide_path(id.slide)
            .ok_or_else(|| Error::PatchTargetNotFound {
                element_id: element_id.to_string(),
            })?
            .to_string();
        let xml = self.package().expect_part(&path)?.to_vec();

        let target = locate::find_target(
            &xml,
            &id,
            patch.original_geometry.as_ref(),
            options.tolerance_emu,
        )?;
        let rewritten = rewrite::apply_to_subtree(target.xml, patch, element_id)?;

        let end = target.start + target.xml.len();
        let mut patched = Vec::with_capacity(xml.len() - target.xml.len() + rewritten.len());
        patched.extend_from_slice(&xml[..target.start]);
        patched.extend_from_slice(&rewritten);
        patched.extend_from_slice(&xml[end..]);

        debug!("patched {} in {}", element_id, path);
        self.package_mut().replace_part(&path, patched)
    }
}
