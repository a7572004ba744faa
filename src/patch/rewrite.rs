//! Subtree rewriting for patch-back.
//!
//! The located shape subtree is echoed event by event into a fresh writer.
//! Only the nodes a patch field names are rebuilt; every other event is
//! forwarded with its original backing bytes, so untouched markup inside
//! the subtree survives byte for byte. Callers splice the result over the
//! original span, which keeps the rest of the slide part untouched.
//!
//! Edit targets:
//! - text: the first `a:t` in the shape's text body
//! - geometry: `a:off` / `a:ext` of the first `a:xfrm`
//! - style: the `a:rPr` of the run holding that first `a:t`, created in
//!   place when the run carries none

use std::io::Cursor;

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::{Error, Result};
use crate::unit::points_to_centipoints;

use super::{ElementPatch, GeometryPatch, StylePatch};

/// Facts about the style/text target, gathered before the echo pass so
/// injection decisions are settled up front rather than mid-stream.
struct TextTarget {
    /// 1-based index of the `a:r`/`a:fld` holding the first `a:t`,
    /// counted across the whole text body
    container: usize,
    has_rpr: bool,
    rpr_has_fill: bool,
}

/// Which requested edits landed on a real node.
#[derive(Default)]
struct Applied {
    text: bool,
    off: bool,
    ext: bool,
    size: bool,
    bold: bool,
    color: bool,
}

impl Applied {
    fn satisfies(&self, patch: &ElementPatch) -> bool {
        if patch.text.is_some() && !self.text {
            return false;
        }
        if let Some(g) = &patch.geometry {
            if (g.x_emu.is_some() || g.y_emu.is_some()) && !self.off {
                return false;
            }
            if (g.w_emu.is_some() || g.h_emu.is_some()) && !self.ext {
                return false;
            }
        }
        if let Some(s) = &patch.style {
            if s.font_size.is_some() && !self.size {
                return false;
            }
            if s.bold.is_some() && !self.bold {
                return false;
            }
            if s.color.is_some() && !self.color {
                return false;
            }
        }
        true
    }
}

fn hex_attr(color: &str) -> String {
    color.trim_start_matches('#').to_ascii_uppercase()
}

fn off_edits(g: &GeometryPatch) -> Vec<(&'static str, String)> {
    let mut edits = Vec::new();
    if let Some(x) = g.x_emu {
        edits.push(("x", x.to_string()));
    }
    if let Some(y) = g.y_emu {
        edits.push(("y", y.to_string()));
    }
    edits
}

fn ext_edits(g: &GeometryPatch) -> Vec<(&'static str, String)> {
    let mut edits = Vec::new();
    if let Some(w) = g.w_emu {
        edits.push(("cx", w.to_string()));
    }
    if let Some(h) = g.h_emu {
        edits.push(("cy", h.to_string()));
    }
    edits
}

fn rpr_edits(style: &StylePatch) -> Vec<(&'static str, String)> {
    let mut edits = Vec::new();
    if let Some(pt) = style.font_size {
        edits.push(("sz", points_to_centipoints(pt).to_string()));
    }
    if let Some(bold) = style.bold {
        edits.push(("b", if bold { "1" } else { "0" }.to_string()));
    }
    edits
}

/// Copy an element tag, replacing listed attributes in place and appending
/// the ones the source tag lacked. Untouched attributes keep their raw bytes.
fn rebuild_with_attrs(e: &BytesStart, edits: &[(&'static str, String)]) -> BytesStart<'static> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let mut rebuilt = BytesStart::new(name);
    let mut replaced: Vec<&str> = Vec::new();
    for attr in e.attributes().flatten() {
        match edits.iter().find(|(k, _)| k.as_bytes() == attr.key.as_ref()) {
            Some((k, v)) => {
                rebuilt.push_attribute((*k, v.as_str()));
                replaced.push(*k);
            }
            None => rebuilt.push_attribute(attr),
        }
    }
    for (k, v) in edits {
        if !replaced.contains(k) {
            rebuilt.push_attribute((*k, v.as_str()));
        }
    }
    rebuilt
}

fn emit(writer: &mut Writer<Cursor<Vec<u8>>>, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| Error::Xml(format!("failed to write patched node: {}", e)))
}

fn write_solid_fill(writer: &mut Writer<Cursor<Vec<u8>>>, hex: &str) -> Result<()> {
    emit(writer, Event::Start(BytesStart::new("a:solidFill")))?;
    let mut clr = BytesStart::new("a:srgbClr");
    clr.push_attribute(("val", hex));
    emit(writer, Event::Empty(clr))?;
    emit(writer, Event::End(BytesEnd::new("a:solidFill")))
}

fn write_synth_rpr(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    style: &StylePatch,
    color_hex: Option<&str>,
) -> Result<()> {
    let mut rpr = BytesStart::new("a:rPr");
    for (k, v) in rpr_edits(style) {
        rpr.push_attribute((k, v.as_str()));
    }
    match color_hex {
        Some(hex) => {
            emit(writer, Event::Start(rpr))?;
            write_solid_fill(writer, hex)?;
            emit(writer, Event::End(BytesEnd::new("a:rPr")))
        }
        None => emit(writer, Event::Empty(rpr)),
    }
}

/// Locate the run holding the shape's first `a:t` and note whether it
/// already carries run properties and a fill.
fn prescan_text_target(xml: &[u8]) -> Result<Option<TextTarget>> {
    let mut reader = Reader::from_reader(xml);
    let mut container = 0usize;
    let mut in_rpr = false;
    let mut has_rpr = false;
    let mut rpr_has_fill = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"r" | b"fld" => {
                    container += 1;
                    has_rpr = false;
                    rpr_has_fill = false;
                }
                b"rPr" if container > 0 => {
                    has_rpr = true;
                    in_rpr = true;
                }
                b"solidFill" if in_rpr => rpr_has_fill = true,
                b"t" if container > 0 => {
                    return Ok(Some(TextTarget {
                        container,
                        has_rpr,
                        rpr_has_fill,
                    }));
                }
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match e.local_name().as_ref() {
                b"rPr" if container > 0 => {
                    has_rpr = true;
                    rpr_has_fill = false;
                }
                b"t" if container > 0 => {
                    return Ok(Some(TextTarget {
                        container,
                        has_rpr,
                        rpr_has_fill,
                    }));
                }
                _ => {}
            },
            Ok(Event::End(ref e)) => {
                if e.local_name().as_ref() == b"rPr" {
                    in_rpr = false;
                }
            }
            Ok(Event::Eof) => return Ok(None),
            Err(e) => return Err(Error::Xml(e.to_string())),
            _ => {}
        }
    }
}

/// Apply the patch's field edits to one shape subtree.
///
/// Returns the rewritten subtree, or `PatchTargetNotFound` when a requested
/// edit has no node to land on. Nothing is written on failure, so the caller
/// leaves the source part untouched.
pub(crate) fn apply_to_subtree(
    xml: &[u8],
    patch: &ElementPatch,
    element_id: &str,
) -> Result<Vec<u8>> {
    let target = prescan_text_target(xml)?;
    let color_hex = patch
        .style
        .as_ref()
        .and_then(|s| s.color.as_deref())
        .map(hex_attr);

    let mut reader = Reader::from_reader(xml);
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    let mut applied = Applied::default();

    let mut container = 0usize;
    let mut in_target_run = false;
    let mut in_target_rpr = false;
    let mut in_target_fill = false;
    let mut text_done = false;
    let mut in_xfrm = false;
    let mut xfrm_done = false;
    // replaced a:t content in flight
    let mut skip_text = false;
    // depth of a colour subtree being swallowed after replacement
    let mut skip_depth = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) => {
                if skip_depth > 0 {
                    skip_depth += 1;
                    continue;
                }
                let local = e.local_name().as_ref().to_vec();
                match local.as_slice() {
                    b"xfrm" if patch.geometry.is_some() && !in_xfrm && !xfrm_done => {
                        in_xfrm = true;
                        emit(&mut writer, Event::Start(e))?;
                    }
                    b"off" if in_xfrm => {
                        if let Some(g) = patch.geometry {
                            let rebuilt = rebuild_with_attrs(&e, &off_edits(&g));
                            applied.off = true;
                            emit(&mut writer, Event::Start(rebuilt))?;
                        }
                    }
                    b"ext" if in_xfrm => {
                        if let Some(g) = patch.geometry {
                            let rebuilt = rebuild_with_attrs(&e, &ext_edits(&g));
                            applied.ext = true;
                            emit(&mut writer, Event::Start(rebuilt))?;
                        }
                    }
                    b"r" | b"fld" => {
                        container += 1;
                        in_target_run = target.as_ref().is_some_and(|t| t.container == container);
                        emit(&mut writer, Event::Start(e))?;
                    }
                    b"rPr" if in_target_run && patch.style.is_some() => {
                        if let Some(style) = patch.style.as_ref() {
                            let rebuilt = rebuild_with_attrs(&e, &rpr_edits(style));
                            in_target_rpr = true;
                            applied.size = true;
                            applied.bold = true;
                            emit(&mut writer, Event::Start(rebuilt))?;
                            if let (Some(hex), Some(t)) = (color_hex.as_deref(), target.as_ref()) {
                                if !t.rpr_has_fill {
                                    write_solid_fill(&mut writer, hex)?;
                                    applied.color = true;
                                }
                            }
                        }
                    }
                    b"solidFill" if in_target_rpr => {
                        in_target_fill = true;
                        emit(&mut writer, Event::Start(e))?;
                    }
                    b"srgbClr" | b"schemeClr" | b"sysClr" | b"prstClr" | b"scrgbClr"
                    | b"hslClr"
                        if in_target_fill && color_hex.is_some() && !applied.color =>
                    {
                        if let Some(hex) = color_hex.as_deref() {
                            let mut clr = BytesStart::new("a:srgbClr");
                            clr.push_attribute(("val", hex));
                            emit(&mut writer, Event::Empty(clr))?;
                            applied.color = true;
                        }
                        // swallow the old colour node's children and end tag
                        skip_depth = 1;
                    }
                    b"t" if in_target_run && !text_done => {
                        if let (Some(style), Some(t)) = (patch.style.as_ref(), target.as_ref()) {
                            if !t.has_rpr {
                                write_synth_rpr(&mut writer, style, color_hex.as_deref())?;
                                applied.size = true;
                                applied.bold = true;
                                applied.color |= color_hex.is_some();
                            }
                        }
                        text_done = true;
                        match patch.text.as_deref() {
                            Some(new_text) => {
                                emit(&mut writer, Event::Start(e))?;
                                emit(&mut writer, Event::Text(BytesText::new(new_text)))?;
                                skip_text = true;
                                applied.text = true;
                            }
                            None => emit(&mut writer, Event::Start(e))?,
                        }
                    }
                    _ => emit(&mut writer, Event::Start(e))?,
                }
            }
            Ok(Event::Empty(e)) => {
                if skip_depth > 0 {
                    continue;
                }
                let local = e.local_name().as_ref().to_vec();
                match local.as_slice() {
                    b"off" if in_xfrm => {
                        if let Some(g) = patch.geometry {
                            let rebuilt = rebuild_with_attrs(&e, &off_edits(&g));
                            applied.off = true;
                            emit(&mut writer, Event::Empty(rebuilt))?;
                        }
                    }
                    b"ext" if in_xfrm => {
                        if let Some(g) = patch.geometry {
                            let rebuilt = rebuild_with_attrs(&e, &ext_edits(&g));
                            applied.ext = true;
                            emit(&mut writer, Event::Empty(rebuilt))?;
                        }
                    }
                    b"rPr" if in_target_run && patch.style.is_some() => {
                        if let Some(style) = patch.style.as_ref() {
                            let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                            let rebuilt = rebuild_with_attrs(&e, &rpr_edits(style));
                            applied.size = true;
                            applied.bold = true;
                            match color_hex.as_deref() {
                                Some(hex) => {
                                    emit(&mut writer, Event::Start(rebuilt))?;
                                    write_solid_fill(&mut writer, hex)?;
                                    emit(&mut writer, Event::End(BytesEnd::new(name)))?;
                                    applied.color = true;
                                }
                                None => emit(&mut writer, Event::Empty(rebuilt))?,
                            }
                        }
                    }
                    b"srgbClr" | b"schemeClr" | b"sysClr" | b"prstClr" | b"scrgbClr"
                    | b"hslClr"
                        if in_target_fill && color_hex.is_some() && !applied.color =>
                    {
                        if let Some(hex) = color_hex.as_deref() {
                            let mut clr = BytesStart::new("a:srgbClr");
                            clr.push_attribute(("val", hex));
                            emit(&mut writer, Event::Empty(clr))?;
                            applied.color = true;
                        }
                    }
                    b"t" if in_target_run && !text_done => {
                        if let (Some(style), Some(t)) = (patch.style.as_ref(), target.as_ref()) {
                            if !t.has_rpr {
                                write_synth_rpr(&mut writer, style, color_hex.as_deref())?;
                                applied.size = true;
                                applied.bold = true;
                                applied.color |= color_hex.is_some();
                            }
                        }
                        text_done = true;
                        match patch.text.as_deref() {
                            Some(new_text) => {
                                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                                emit(&mut writer, Event::Start(e))?;
                                emit(&mut writer, Event::Text(BytesText::new(new_text)))?;
                                emit(&mut writer, Event::End(BytesEnd::new(name)))?;
                                applied.text = true;
                            }
                            None => emit(&mut writer, Event::Empty(e))?,
                        }
                    }
                    _ => emit(&mut writer, Event::Empty(e))?,
                }
            }
            Ok(Event::End(e)) => {
                if skip_depth > 0 {
                    skip_depth -= 1;
                    continue;
                }
                match e.local_name().as_ref() {
                    b"xfrm" if in_xfrm => {
                        in_xfrm = false;
                        xfrm_done = true;
                    }
                    b"rPr" if in_target_rpr => {
                        in_target_rpr = false;
                        in_target_fill = false;
                    }
                    b"solidFill" if in_target_fill => in_target_fill = false,
                    b"r" | b"fld" => in_target_run = false,
                    b"t" if skip_text => skip_text = false,
                    _ => {}
                }
                emit(&mut writer, Event::End(e))?;
            }
            Ok(Event::Text(t)) => {
                if skip_depth == 0 && !skip_text {
                    emit(&mut writer, Event::Text(t))?;
                }
            }
            Ok(other) => {
                if skip_depth == 0 && !skip_text {
                    emit(&mut writer, other)?;
                }
            }
            Err(e) => return Err(Error::Xml(e.to_string())),
        }
    }

    if !applied.satisfies(patch) {
        return Err(Error::PatchTargetNotFound {
            element_id: element_id.to_string(),
        });
    }
    Ok(writer.into_inner().into_inner())
}
