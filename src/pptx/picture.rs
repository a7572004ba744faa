//! Picture element assembly: blip reference, media lookup, payload inlining.
//!
//! A picture whose relationship or media entry is missing still produces an
//! element; the unresolved fields stay null and extraction moves on.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use log::debug;
use quick_xml::Reader;
use quick_xml::events::Event;

use crate::error::{Error, Result};
use crate::model::{ImageFormat, MediaKind, PictureElement};
use crate::opc::{Package, Relationships};
use crate::xml::attr_string;

use super::geometry::read_transform;

/// Find the media relationship id of the first blip in a subtree.
///
/// When an SVG extension blip is present it wins over the raster fallback
/// reference on the same fill.
pub(crate) fn read_blip_embed(xml: &[u8]) -> Result<Option<String>> {
    let mut reader = Reader::from_reader(xml);
    let mut embed: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                let name = e.local_name();
                let is_svg = name.as_ref() == b"svgBlip";
                if is_svg || name.as_ref() == b"blip" {
                    for attr in e.attributes().flatten() {
                        if attr.key.local_name().as_ref() == b"embed" {
                            if is_svg {
                                return Ok(attr_string(&attr));
                            }
                            if embed.is_none() {
                                embed = attr_string(&attr);
                            }
                        }
                    }
                }
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Xml(e.to_string())),
            _ => {},
        }
    }
    Ok(embed)
}

/// A media relationship resolved against the package.
pub(crate) struct ResolvedMedia {
    pub path: String,
    pub name: Option<String>,
    pub format: Option<ImageFormat>,
    /// Inlined payload; stays `None` when the package lacks the entry
    pub data_url: Option<String>,
}

/// Resolve a media relationship id to its package entry and inline it.
pub(crate) fn resolve_media(
    rid: &str,
    rels: &Relationships,
    package: &Package,
) -> Option<ResolvedMedia> {
    let Some(path) = rels.get(rid).and_then(|rel| rel.target_path()) else {
        debug!("unresolved media relationship {}", rid);
        return None;
    };

    let name = path.rsplit('/').next().map(str::to_string);
    let mut format = name
        .as_deref()
        .and_then(|n| n.rsplit('.').next())
        .and_then(ImageFormat::from_extension);

    let data_url = match package.part(&path) {
        Some(data) => {
            if format.is_none() {
                format = ImageFormat::detect_from_bytes(data);
            }
            let mime = format
                .map(|f| f.mime_type())
                .unwrap_or("application/octet-stream");
            Some(format!("data:{};base64,{}", mime, STANDARD.encode(data)))
        },
        None => {
            debug!("media part {} not in package", path);
            None
        },
    };

    Some(ResolvedMedia {
        path,
        name,
        format,
        data_url,
    })
}

/// Build a picture element from a `pic` subtree (or, for icons, the whole
/// graphic frame so the frame transform is picked up).
pub(crate) fn build_picture_element(
    xml: &[u8],
    id: String,
    media: MediaKind,
    z_index: u32,
    rels: &Relationships,
    package: &Package,
) -> Result<PictureElement> {
    let geometry = read_transform(xml)?;
    let resolved = read_blip_embed(xml)?.and_then(|rid| resolve_media(&rid, rels, package));

    let mut image_ref = None;
    let mut image_name = None;
    let mut image_base64 = None;
    let mut format = None;
    if let Some(m) = resolved {
        image_ref = Some(m.path);
        image_name = m.name;
        image_base64 = m.data_url;
        format = m.format;
    }

    Ok(PictureElement {
        id,
        media,
        z_index,
        geometry,
        image_ref,
        image_name,
        image_base64,
        format,
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const PNG: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 1, 2, 3];

    fn package_with_media() -> Package {
        let mut cursor = std::io::Cursor::new(Vec::new());
        let mut writer = zip::ZipWriter::new(&mut cursor);
        let options = zip::write::SimpleFileOptions::default();
        writer.start_file("ppt/media/image3.png", options).unwrap();
        writer.write_all(PNG).unwrap();
        writer.finish().unwrap();
        Package::from_bytes(cursor.into_inner()).unwrap()
    }

    fn slide_rels() -> Relationships {
        Relationships::parse(
            br#"<?xml version="1.0"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="../media/image3.png"/>
</Relationships>"#,
            "ppt/slides",
        )
        .unwrap()
    }

    #[test]
    fn test_picture_resolved_and_inlined() {
        let xml = br#"<p:pic xmlns:p="p" xmlns:a="a" xmlns:r="r">
          <p:nvPicPr/>
          <p:blipFill><a:blip r:embed="rId2"/><a:stretch/></p:blipFill>
          <p:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="360000" cy="360000"/></a:xfrm></p:spPr>
        </p:pic>"#;
        let el = build_picture_element(
            xml,
            "s1-img1".to_string(),
            MediaKind::Image,
            2,
            &slide_rels(),
            &package_with_media(),
        )
        .unwrap();
        assert_eq!(el.image_ref.as_deref(), Some("ppt/media/image3.png"));
        assert_eq!(el.image_name.as_deref(), Some("image3.png"));
        assert_eq!(el.format, Some(ImageFormat::Png));
        let data_url = el.image_base64.unwrap();
        assert!(data_url.starts_with("data:image/png;base64,"));
        assert_eq!(el.geometry.unwrap().w_cm, 1.0);
        assert_eq!(el.z_index, 2);
    }

    #[test]
    fn test_unresolved_relationship_degrades() {
        let xml = br#"<p:pic xmlns:p="p" xmlns:a="a" xmlns:r="r">
          <p:blipFill><a:blip r:embed="rId99"/></p:blipFill><p:spPr/></p:pic>"#;
        let el = build_picture_element(
            xml,
            "s1-img1".to_string(),
            MediaKind::Image,
            1,
            &slide_rels(),
            &package_with_media(),
        )
        .unwrap();
        assert!(el.image_ref.is_none());
        assert!(el.image_base64.is_none());
        assert!(el.format.is_none());
    }

    #[test]
    fn test_svg_blip_preferred() {
        let xml = br#"<a:blipFill xmlns:a="a" xmlns:r="r">
          <a:blip r:embed="rId2"><a:extLst><a:ext>
            <asvg:svgBlip xmlns:asvg="asvg" r:embed="rId7"/>
          </a:ext></a:extLst></a:blip>
        </a:blipFill>"#;
        assert_eq!(read_blip_embed(xml).unwrap().as_deref(), Some("rId7"));
    }

    #[test]
    fn test_missing_media_part_keeps_reference() {
        let rels = Relationships::parse(
            br#"<Relationships xmlns="x">
              <Relationship Id="rId2" Type="t/image" Target="../media/gone.png"/>
            </Relationships>"#,
            "ppt/slides",
        )
        .unwrap();
        let xml = br#"<p:pic xmlns:p="p" xmlns:a="a" xmlns:r="r">
          <p:blipFill><a:blip r:embed="rId2"/></p:blipFill></p:pic>"#;
        let el = build_picture_element(
            xml,
            "s1-img1".to_string(),
            MediaKind::Image,
            1,
            &rels,
            &package_with_media(),
        )
        .unwrap();
        assert_eq!(el.image_ref.as_deref(), Some("ppt/media/gone.png"));
        assert_eq!(el.image_name.as_deref(), Some("gone.png"));
        assert_eq!(el.format, Some(ImageFormat::Png));
        assert!(el.image_base64.is_none());
    }
}
