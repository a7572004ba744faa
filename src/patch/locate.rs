//! Patch target location: ordinal first, geometry proximity second.
//!
//! The id ordinal counts source nodes of the element's family, so it
//! normally lands directly on the right subtree. When edits elsewhere have
//! shortened the slide and the ordinal runs past the end, the stored
//! original geometry picks the nearest candidate within tolerance.

use log::debug;

use crate::error::{Error, Result};
use crate::model::{ElementFamily, ElementId, Geometry};
use crate::pptx::geometry::read_transform;
use crate::pptx::shape::{Drawable, FrameContent, NodeKind, classify_frame, scan_shape_tree};

/// Whether two positions agree within a per-axis native-unit tolerance.
pub(crate) fn within_tolerance(a: (i64, i64), b: (i64, i64), tolerance_emu: i64) -> bool {
    (a.0 - b.0).abs() <= tolerance_emu && (a.1 - b.1).abs() <= tolerance_emu
}

/// Whether a drawable counts toward the id family's ordinal.
///
/// Must mirror the extraction counters exactly: `el` counts shapes and
/// connectors, `img` counts pictures plus graphic frames that wrap one
/// (icons get `img` ids, and they shift the ordinals of later pictures).
fn family_matches(family: ElementFamily, drawable: &Drawable<'_>) -> Result<bool> {
    Ok(match family {
        ElementFamily::Shape => matches!(drawable.kind, NodeKind::Shape | NodeKind::Connector),
        ElementFamily::Media => match drawable.kind {
            NodeKind::Picture => true,
            NodeKind::Frame => matches!(classify_frame(drawable.xml)?, FrameContent::Picture),
            _ => false,
        },
        ElementFamily::Chart | ElementFamily::LayoutPlaceholder => false,
    })
}

/// Find the subtree an element id points at inside a slide part.
pub(crate) fn find_target<'a>(
    xml: &'a [u8],
    id: &ElementId,
    original_geometry: Option<&Geometry>,
    tolerance_emu: i64,
) -> Result<Drawable<'a>> {
    let not_found = || Error::PatchTargetNotFound {
        element_id: id.to_string(),
    };

    let mut candidates: Vec<Drawable<'a>> = Vec::new();
    for drawable in scan_shape_tree(xml)? {
        if family_matches(id.family, &drawable)? {
            candidates.push(drawable);
        }
    }

    if let Some(&target) = candidates.get(id.ordinal - 1) {
        return Ok(target);
    }

    // ordinal out of range: try the stored original position
    let Some(hint) = original_geometry else {
        return Err(not_found());
    };
    debug!(
        "{} ordinal past {} candidates, matching by position",
        id,
        candidates.len()
    );
    for candidate in candidates {
        let Ok(Some(g)) = read_transform(candidate.xml) else {
            continue;
        };
        if within_tolerance((g.x_emu, g.y_emu), (hint.x_emu, hint.y_emu), tolerance_emu) {
            return Ok(candidate);
        }
    }
    Err(not_found())
}
