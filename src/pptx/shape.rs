//! Shape-tree scanning and shape element assembly.
//!
//! The scanner walks a slide part in document order and hands back each
//! drawable's byte span. Group shapes are entered transparently: their
//! children surface as individual drawables in place, which is what keeps
//! stacking order identical to source order. Graphic frames are captured
//! whole so a picture nested inside one is never seen twice.

use quick_xml::Reader;
use quick_xml::events::Event;
use quick_xml::name::QName;

use crate::error::{Error, Result};
use crate::model::{PlaceholderRole, ShapeElement, StyleBlock, TextContent};
use crate::xml::attr_string;

use super::geometry::{read_preset, read_transform};
use super::style::read_shape_props;
use super::text::read_paragraphs;
use super::theme::ColorScheme;

/// Source node kind of a drawable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NodeKind {
    /// `p:sp`
    Shape,
    /// `p:cxnSp`
    Connector,
    /// `p:pic`
    Picture,
    /// `p:graphicFrame`
    Frame,
}

/// One drawable node with its full subtree bytes and the byte offset of
/// the subtree within the scanned part.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Drawable<'a> {
    pub kind: NodeKind,
    pub xml: &'a [u8],
    pub start: usize,
}

fn node_kind(local: &[u8]) -> Option<NodeKind> {
    match local {
        b"sp" => Some(NodeKind::Shape),
        b"cxnSp" => Some(NodeKind::Connector),
        b"pic" => Some(NodeKind::Picture),
        b"graphicFrame" => Some(NodeKind::Frame),
        _ => None,
    }
}

/// Collect every drawable in the shape tree, in document order.
pub(crate) fn scan_shape_tree(xml: &[u8]) -> Result<Vec<Drawable<'_>>> {
    let mut reader = Reader::from_reader(xml);
    let mut shapes = Vec::new();

    loop {
        let pos = reader.buffer_position() as usize;
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let name = e.local_name();
                // spTree and grpSp are walked through, not captured
                if let Some(kind) = node_kind(name.as_ref()) {
                    let qname = e.name().as_ref().to_vec();
                    reader
                        .read_to_end(QName(&qname))
                        .map_err(|e| Error::Xml(e.to_string()))?;
                    let end = reader.buffer_position() as usize;
                    shapes.push(Drawable {
                        kind,
                        xml: &xml[pos..end],
                        start: pos,
                    });
                }
            },
            Ok(Event::Empty(ref e)) => {
                if let Some(kind) = node_kind(e.local_name().as_ref()) {
                    let end = reader.buffer_position() as usize;
                    shapes.push(Drawable {
                        kind,
                        xml: &xml[pos..end],
                        start: pos,
                    });
                }
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Xml(e.to_string())),
            _ => {},
        }
    }

    Ok(shapes)
}

/// Raw placeholder `type` attribute of a shape, if it has a `ph` node.
pub(crate) fn read_ph_type(xml: &[u8]) -> Result<Option<String>> {
    let mut reader = Reader::from_reader(xml);

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                if e.local_name().as_ref() == b"ph" {
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"type" {
                            return Ok(attr_string(&attr));
                        }
                    }
                    return Ok(None);
                }
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Xml(e.to_string())),
            _ => {},
        }
    }
    Ok(None)
}

/// What a graphic frame carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum FrameContent {
    /// Chart part reference (relationship id)
    Chart(String),
    /// An embedded picture (icon glyphs travel this way)
    Picture,
    /// Tables, SmartArt, and anything else out of scope
    Other,
}

/// Classify a graphic frame by its graphic-data child.
pub(crate) fn classify_frame(xml: &[u8]) -> Result<FrameContent> {
    let mut reader = Reader::from_reader(xml);

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                let name = e.local_name();
                if name.as_ref() == b"chart" {
                    for attr in e.attributes().flatten() {
                        if attr.key.local_name().as_ref() == b"id" {
                            if let Some(rid) = attr_string(&attr) {
                                return Ok(FrameContent::Chart(rid));
                            }
                        }
                    }
                } else if name.as_ref() == b"pic" {
                    return Ok(FrameContent::Picture);
                }
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Xml(e.to_string())),
            _ => {},
        }
    }
    Ok(FrameContent::Other)
}

/// Build a shape element from an `sp`/`cxnSp` subtree.
///
/// The shape fill is resolved first so runs can inherit it as an implicit
/// text color; the first run's character style is then promoted to the
/// element-level style block alongside the shape fill and outline.
pub(crate) fn build_shape_element(
    xml: &[u8],
    id: String,
    z_index: u32,
    theme: &ColorScheme,
) -> Result<ShapeElement> {
    let props = read_shape_props(xml)?;
    let fill_css = props.fill.resolve(theme);

    let paragraphs = read_paragraphs(xml, theme, fill_css.as_deref())?;
    let has_text = !paragraphs.is_empty();

    let ph_type = read_ph_type(xml)?;
    let role = PlaceholderRole::from_ph_type(ph_type.as_deref(), has_text);

    let mut style = StyleBlock::default();
    if let Some(first) = paragraphs.first().and_then(|p| p.runs.first()) {
        style.font_family = first.style.font_family.clone();
        style.font_size = first.style.font_size;
        style.bold = first.style.bold;
        style.italic = first.style.italic;
        style.underline = first.style.underline;
        style.color = first.style.color.clone();
    }
    style.fill_color = fill_css;
    style.outline_color = props.outline.resolve(theme);
    style.outline_width = props.outline_width;
    style.align = paragraphs.first().and_then(|p| p.align);

    Ok(ShapeElement {
        id,
        role,
        placeholder_type: ph_type,
        shape_type: read_preset(xml)?,
        z_index,
        geometry: read_transform(xml)?,
        content: has_text.then(|| TextContent::from_paragraphs(paragraphs)),
        style,
    })
}
