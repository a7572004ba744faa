//! Slide background extraction.
//!
//! Reads the slide's own `bg` node: a solid fill resolves to a color, a
//! picture fill inlines the referenced media. A slide without a `bg` node,
//! or one that only carries a symbolic `bgRef` into the layout chain,
//! inherits, and the background stays null rather than an empty record.

use quick_xml::Reader;
use quick_xml::events::Event;
use quick_xml::name::QName;

use crate::error::{Error, Result};
use crate::model::Background;
use crate::opc::{Package, Relationships};

use super::picture::{read_blip_embed, resolve_media};
use super::style::ColorSpec;
use super::theme::ColorScheme;

fn bg_span(xml: &[u8]) -> Result<Option<&[u8]>> {
    let mut reader = Reader::from_reader(xml);

    loop {
        let pos = reader.buffer_position() as usize;
        match reader.read_event() {
            Ok(Event::Start(ref e)) if e.local_name().as_ref() == b"bg" => {
                let qname = e.name().as_ref().to_vec();
                reader
                    .read_to_end(QName(&qname))
                    .map_err(|e| Error::Xml(e.to_string()))?;
                let end = reader.buffer_position() as usize;
                return Ok(Some(&xml[pos..end]));
            },
            Ok(Event::Eof) => return Ok(None),
            Err(e) => return Err(Error::Xml(e.to_string())),
            _ => {},
        }
    }
}

fn read_bg_fill(bg: &[u8]) -> Result<ColorSpec> {
    let mut reader = Reader::from_reader(bg);
    let mut spec = ColorSpec::default();
    let mut in_bgref = false;
    let mut in_fill = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                match e.local_name().as_ref() {
                    // bgRef colors belong to the layout chain, not here
                    b"bgRef" => in_bgref = true,
                    b"solidFill" if !in_bgref => in_fill = true,
                    _ if in_fill => spec.note(e),
                    _ => {},
                }
            },
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"bgRef" => in_bgref = false,
                b"solidFill" => in_fill = false,
                _ => {},
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Xml(e.to_string())),
            _ => {},
        }
    }
    Ok(spec)
}

/// Extract the slide's declared background, if any.
pub(crate) fn read_background(
    slide_xml: &[u8],
    theme: &ColorScheme,
    rels: &Relationships,
    package: &Package,
) -> Result<Option<Background>> {
    let Some(bg) = bg_span(slide_xml)? else {
        return Ok(None);
    };

    let fill_color = read_bg_fill(bg)?.resolve(theme);
    let image_base64 = read_blip_embed(bg)?
        .and_then(|rid| resolve_media(&rid, rels, package))
        .and_then(|m| m.data_url);

    if fill_color.is_none() && image_base64.is_none() {
        return Ok(None);
    }
    Ok(Some(Background {
        fill_color,
        image_base64,
    }))
}
