//! Shape transform extraction.
//!
//! Reads the first `xfrm` node of a shape subtree. A geometry is produced
//! only when both the offset and extent children are present; partial
//! transforms yield `None` so callers never see a half-filled record.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::{Error, Result};
use crate::model::Geometry;
use crate::unit::parse_emu;
use crate::xml::attr_string;

fn read_pair(e: &BytesStart, first: &[u8], second: &[u8]) -> Option<(i64, i64)> {
    let mut a = None;
    let mut b = None;
    for attr in e.attributes().flatten() {
        let key = attr.key.as_ref();
        if key == first {
            a = parse_emu(&attr.value);
        } else if key == second {
            b = parse_emu(&attr.value);
        }
    }
    Some((a?, b?))
}

/// Read position/size/rotation from the first `xfrm` in the subtree.
///
/// Works for `a:xfrm` under `spPr` and for the bare `p:xfrm` of graphic
/// frames alike. Group child offsets are taken as-is; composing nested
/// group transforms is out of scope.
pub(crate) fn read_transform(xml: &[u8]) -> Result<Option<Geometry>> {
    let mut reader = Reader::from_reader(xml);

    let mut in_xfrm = false;
    let mut rot: i64 = 0;
    let mut off: Option<(i64, i64)> = None;
    let mut ext: Option<(i64, i64)> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                let name = e.local_name();
                if !in_xfrm && name.as_ref() == b"xfrm" {
                    in_xfrm = true;
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"rot" {
                            rot = parse_emu(&attr.value).unwrap_or(0);
                        }
                    }
                } else if in_xfrm && name.as_ref() == b"off" {
                    off = read_pair(e, b"x", b"y");
                } else if in_xfrm && name.as_ref() == b"ext" {
                    ext = read_pair(e, b"cx", b"cy");
                }
            },
            Ok(Event::End(ref e)) if e.local_name().as_ref() == b"xfrm" => break,
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Xml(e.to_string())),
            _ => {},
        }
    }

    match (off, ext) {
        (Some((x, y)), Some((w, h))) => Ok(Some(Geometry::from_emu(x, y, w, h, rot))),
        _ => Ok(None),
    }
}

/// Read the preset geometry name (`a:prstGeom prst="..."`) of a shape.
///
/// Custom geometries (`a:custGeom`) have no preset name and yield `None`.
pub(crate) fn read_preset(xml: &[u8]) -> Result<Option<String>> {
    let mut reader = Reader::from_reader(xml);

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                if e.local_name().as_ref() == b"prstGeom" {
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"prst" {
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
