//! Presentation package access: slide enumeration, relationship parts,
//! theme, and the canvas size manifest.
//!
//! Slide parts are ordered by their numeric suffix, not lexicographically,
//! so `slide10.xml` sorts after `slide2.xml`.

use std::path::Path;

use log::{debug, warn};
use quick_xml::Reader;
use quick_xml::events::Event;

use crate::error::{Error, Result};
use crate::model::SlideSize;
use crate::opc::{Package, Relationships};
use crate::unit::parse_emu;

use super::theme::ColorScheme;

fn slide_number_of(name: &str) -> Option<u32> {
    let digits = name
        .strip_prefix("ppt/slides/slide")?
        .strip_suffix(".xml")?;
    if digits.is_empty() {
        return None;
    }
    atoi_simd::parse::<u32>(digits.as_bytes()).ok()
}

/// `ppt/slides/slide3.xml` → `ppt/slides/_rels/slide3.xml.rels`
fn rels_path(part: &str) -> String {
    match part.rfind('/') {
        Some(i) => format!("{}/_rels/{}.rels", &part[..i], &part[i + 1..]),
        None => format!("_rels/{}.rels", part),
    }
}

fn dir_of(part: &str) -> &str {
    part.rfind('/').map(|i| &part[..i]).unwrap_or("")
}

/// An opened presentation package.
#[derive(Debug)]
pub struct PptxFile {
    package: Package,
    file_name: String,
    slide_paths: Vec<String>,
    theme: ColorScheme,
}

impl PptxFile {
    /// Open a presentation from disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("presentation.pptx")
            .to_string();
        Self::with_package(Package::open(path)?, file_name)
    }

    /// Open a presentation from an in-memory buffer.
    pub fn from_bytes(bytes: Vec<u8>, file_name: impl Into<String>) -> Result<Self> {
        Self::with_package(Package::from_bytes(bytes)?, file_name.into())
    }

    fn with_package(package: Package, file_name: String) -> Result<Self> {
        if !package.contains("ppt/presentation.xml") {
            return Err(Error::MalformedInput(
                "missing ppt/presentation.xml".to_string(),
            ));
        }

        let mut numbered: Vec<(u32, String)> = package
            .part_names()
            .filter_map(|name| slide_number_of(name).map(|n| (n, name.to_string())))
            .collect();
        numbered.sort_by_key(|(n, _)| *n);
        let slide_paths = numbered.into_iter().map(|(_, name)| name).collect();

        let theme = match Self::theme_part(&package) {
            Some(xml) => ColorScheme::parse(xml).unwrap_or_else(|e| {
                warn!("theme part unparsable, scheme colors will not resolve: {}", e);
                ColorScheme::empty()
            }),
            None => {
                warn!("no theme part, scheme colors will not resolve");
                ColorScheme::empty()
            }
        };

        Ok(Self {
            package,
            file_name,
            slide_paths,
            theme,
        })
    }

    /// The theme part named by the presentation's relationships.
    ///
    /// Packages whose rels are missing, unparsable, or point at an absent
    /// part fall back to the conventional `ppt/theme/theme1.xml` name, then
    /// to the first theme part in name order.
    fn theme_part(package: &Package) -> Option<&[u8]> {
        if let Some(path) = Self::theme_path_from_rels(package) {
            match package.part(&path) {
                Some(xml) => return Some(xml),
                None => debug!("presentation rels name absent theme part {}", path),
            }
        }
        if let Some(xml) = package.part("ppt/theme/theme1.xml") {
            return Some(xml);
        }
        let mut names: Vec<&str> = package
            .part_names()
            .filter(|n| n.starts_with("ppt/theme/theme") && n.ends_with(".xml"))
            .collect();
        names.sort_unstable();
        names.first().and_then(|n| package.part(n))
    }

    fn theme_path_from_rels(package: &Package) -> Option<String> {
        let xml = package.part(&rels_path("ppt/presentation.xml"))?;
        let rels = Relationships::parse(xml, dir_of("ppt/presentation.xml")).unwrap_or_else(|e| {
            debug!("rels of ppt/presentation.xml unparsable: {}", e);
            Relationships::empty()
        });
        rels.find_by_type_suffix("/theme")?.target_path()
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn slide_count(&self) -> usize {
        self.slide_paths.len()
    }

    /// Package entry name of a slide, 1-based.
    pub fn slide_path(&self, slide_number: usize) -> Option<&str> {
        if slide_number == 0 {
            return None;
        }
        self.slide_paths.get(slide_number - 1).map(String::as_str)
    }

    pub(crate) fn theme(&self) -> &ColorScheme {
        &self.theme
    }

    pub(crate) fn slide_part(&self, index: usize) -> Result<&[u8]> {
        let path = self
            .slide_paths
            .get(index)
            .ok_or_else(|| Error::PartNotFound(format!("slide index {}", index)))?;
        self.package.expect_part(path)
    }

    /// Relationships of a slide; missing or unparsable parts resolve empty.
    pub(crate) fn slide_rels(&self, index: usize) -> Relationships {
        let Some(path) = self.slide_paths.get(index) else {
            return Relationships::empty();
        };
        match self.package.part(&rels_path(path)) {
            Some(xml) => Relationships::parse(xml, dir_of(path)).unwrap_or_else(|e| {
                debug!("rels of {} unparsable: {}", path, e);
                Relationships::empty()
            }),
            None => Relationships::empty(),
        }
    }

    /// The layout part a slide's relationships point at, with its own
    /// relationships.
    pub(crate) fn layout_for(&self, slide_rels: &Relationships) -> Option<(&[u8], Relationships)> {
        let rel = slide_rels.find_by_type_suffix("slideLayout")?;
        let path = rel.target_path()?;
        let xml = self.package.part(&path)?;
        let rels = match self.package.part(&rels_path(&path)) {
            Some(rels_xml) => Relationships::parse(rels_xml, dir_of(&path)).unwrap_or_else(|e| {
                debug!("rels of {} unparsable: {}", path, e);
                Relationships::empty()
            }),
            None => Relationships::empty(),
        };
        Some((xml, rels))
    }

    /// Canvas size from the presentation part's `sldSz` node.
    ///
    /// Its absence is a manifest-level defect and aborts extraction.
    pub fn slide_size(&self) -> Result<SlideSize> {
        let xml = self.package.expect_part("ppt/presentation.xml")?;
        let mut reader = Reader::from_reader(xml);

        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                    if e.local_name().as_ref() == b"sldSz" {
                        let mut cx = None;
                        let mut cy = None;
                        for attr in e.attributes().flatten() {
                            match attr.key.as_ref() {
                                b"cx" => cx = parse_emu(&attr.value),
                                b"cy" => cy = parse_emu(&attr.value),
                                _ => {},
                            }
                        }
                        return match (cx, cy) {
                            (Some(w), Some(h)) => Ok(SlideSize::from_emu(w, h)),
                            _ => Err(Error::MalformedInput(
                                "sldSz node lacks cx/cy".to_string(),
                            )),
                        };
                    }
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(Error::Xml(e.to_string())),
                _ => {},
            }
        }
        Err(Error::MalformedInput(
            "presentation part has no sldSz node".to_string(),
        ))
    }

    pub fn package(&self) -> &Package {
        &self.package
    }

    pub fn package_mut(&mut self) -> &mut Package {
        &mut self.package
    }

    /// Serialize the (possibly patched) package back to bytes.
    pub fn save(&self) -> Result<Vec<u8>> {
        self.package.save()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn build_pptx(parts: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default();
        for (name, data) in parts {
            writer.start_file(*name, options).unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    const PRESENTATION: &[u8] = br#"<?xml version="1.0"?>
<p:presentation xmlns:p="p" xmlns:a="a">
  <p:sldIdLst><p:sldId id="256" r:id="rId2" xmlns:r="r"/></p:sldIdLst>
  <p:sldSz cx="12192000" cy="6858000"/>
</p:presentation>"#;

    const SLIDE: &[u8] = br#"<p:sld xmlns:p="p"><p:cSld><p:spTree/></p:cSld></p:sld>"#;

    fn sample() -> PptxFile {
        let bytes = build_pptx(&[
            ("ppt/presentation.xml", PRESENTATION),
            ("ppt/slides/slide10.xml", SLIDE),
            ("ppt/slides/slide1.xml", SLIDE),
            ("ppt/slides/slide2.xml", SLIDE),
            (
                "ppt/slides/_rels/slide1.xml.rels",
                br#"<Relationships xmlns="x">
                  <Relationship Id="rId1" Type="t/slideLayout" Target="../slideLayouts/slideLayout1.xml"/>
                </Relationships>"#,
            ),
            (
                "ppt/slideLayouts/slideLayout1.xml",
                br#"<p:sldLayout xmlns:p="p"><p:cSld><p:spTree/></p:cSld></p:sldLayout>"#,
            ),
            (
                "ppt/theme/theme1.xml",
                br#"<a:theme xmlns:a="a"><a:clrScheme>
                  <a:accent1><a:srgbClr val="4472C4"/></a:accent1>
                </a:clrScheme></a:theme>"#,
            ),
        ]);
        PptxFile::from_bytes(bytes, "deck.pptx").unwrap()
    }

    #[test]
    fn test_numeric_slide_order() {
        let pptx = sample();
        assert_eq!(pptx.slide_count(), 3);
        assert_eq!(pptx.slide_path(1), Some("ppt/slides/slide1.xml"));
        assert_eq!(pptx.slide_path(2), Some("ppt/slides/slide2.xml"));
        assert_eq!(pptx.slide_path(3), Some("ppt/slides/slide10.xml"));
        assert_eq!(pptx.slide_path(0), None);
        assert_eq!(pptx.slide_path(4), None);
    }

    #[test]
    fn test_slide_size() {
        let size = sample().slide_size().unwrap();
        assert_eq!(size.width_emu, 12_192_000);
        assert_eq!(size.height_emu, 6_858_000);
        assert_eq!(size.width_cm, 33.87);
        assert_eq!(size.height_cm, 19.05);
    }

    #[test]
    fn test_missing_presentation_part_is_fatal() {
        let bytes = build_pptx(&[("ppt/slides/slide1.xml", SLIDE)]);
        let err = PptxFile::from_bytes(bytes, "x.pptx").unwrap_err();
        assert!(matches!(err, Error::MalformedInput(_)));
    }

    #[test]
    fn test_missing_slide_size_is_fatal() {
        let bytes = build_pptx(&[(
            "ppt/presentation.xml",
            br#"<p:presentation xmlns:p="p"/>"# as &[u8],
        )]);
        let pptx = PptxFile::from_bytes(bytes, "x.pptx").unwrap();
        assert!(matches!(
            pptx.slide_size(),
            Err(Error::MalformedInput(_))
        ));
    }

    #[test]
    fn test_theme_loaded() {
        let pptx = sample();
        assert_eq!(pptx.theme().resolve("accent1"), Some("4472C4"));
    }

    #[test]
    fn test_theme_via_presentation_rels() {
        // the rels name a part the conventional lookup would never find;
        // the decoy theme1.xml must lose to it
        let bytes = build_pptx(&[
            ("ppt/presentation.xml", PRESENTATION),
            (
                "ppt/_rels/presentation.xml.rels",
                br#"<Relationships xmlns="x">
                  <Relationship Id="rId1" Type="t/theme" Target="theme/custom.xml"/>
                </Relationships>"#,
            ),
            (
                "ppt/theme/custom.xml",
                br#"<a:theme xmlns:a="a"><a:clrScheme>
                  <a:accent1><a:srgbClr val="112233"/></a:accent1>
                </a:clrScheme></a:theme>"#,
            ),
            (
                "ppt/theme/theme1.xml",
                br#"<a:theme xmlns:a="a"><a:clrScheme>
                  <a:accent1><a:srgbClr val="FFFFFF"/></a:accent1>
                </a:clrScheme></a:theme>"#,
            ),
        ]);
        let pptx = PptxFile::from_bytes(bytes, "deck.pptx").unwrap();
        assert_eq!(pptx.theme().resolve("accent1"), Some("112233"));
    }

    #[test]
    fn test_open_from_disk_takes_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Q3 deck.pptx");
        std::fs::write(&path, build_pptx(&[("ppt/presentation.xml", PRESENTATION)])).unwrap();

        let pptx = PptxFile::open(&path).unwrap();
        assert_eq!(pptx.file_name(), "Q3 deck.pptx");
    }

    #[test]
    fn test_slide_rels_and_layout() {
        let pptx = sample();
        let rels = pptx.slide_rels(0);
        assert_eq!(rels.len(), 1);
        let (layout_xml, layout_rels) = pptx.layout_for(&rels).unwrap();
        assert!(layout_xml.starts_with(b"<p:sldLayout"));
        assert!(layout_rels.is_empty());

        // slide without a rels part gets an empty map
        assert!(pptx.slide_rels(1).is_empty());
    }
}
