//! Document root of the extracted scene: file-level metadata, per-slide
//! element lists, and the serialization entry points.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::unit::emu_to_cm;

use super::Element;

/// Physical slide dimensions from the presentation part.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideSize {
    pub width_emu: i64,
    pub height_emu: i64,
    pub width_cm: f64,
    pub height_cm: f64,
}

impl SlideSize {
    pub fn from_emu(width: i64, height: i64) -> Self {
        Self {
            width_emu: width,
            height_emu: height,
            width_cm: emu_to_cm(width),
            height_cm: emu_to_cm(height),
        }
    }
}

/// Slide background, when the slide declares one.
///
/// Both fields absent means the slide inherits from its layout chain; in
/// that case the slide's `background` is null, never an empty record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Background {
    /// Resolved solid fill as "#RRGGBB"
    pub fill_color: Option<String>,
    /// Background picture inlined as a data URL
    pub image_base64: Option<String>,
}

/// One slide: its 1-based number, canvas size, optional background, and
/// elements in stacking order.
///
/// `size` repeats the document canvas so a slide serialized on its own
/// still carries its dimensions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slide {
    pub slide_number: usize,
    pub size: SlideSize,
    pub background: Option<Background>,
    pub elements: Vec<Element>,
}

/// The extracted scene graph for a whole presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub file_name: String,
    pub slide_count: usize,
    pub slide_size: SlideSize,
    pub slides: Vec<Slide>,
}

impl Document {
    /// Serialize to compact JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::Other(e.to_string()))
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Other(e.to_string()))
    }

    /// Look up an element anywhere in the document by its id string.
    pub fn find_element(&self, id: &str) -> Option<&Element> {
        self.slides
            .iter()
            .flat_map(|s| s.elements.iter())
            .find(|e| e.id() == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slide_size_derived_cm() {
        let size = SlideSize::from_emu(12_192_000, 6_858_000);
        assert_eq!(size.width_cm, 33.87);
        assert_eq!(size.height_cm, 19.05);
    }

    #[test]
    fn test_wire_field_names() {
        let doc = Document {
            file_name: "deck.pptx".to_string(),
            slide_count: 1,
            slide_size: SlideSize::from_emu(9_144_000, 6_858_000),
            slides: vec![Slide {
                slide_number: 1,
                size: SlideSize::from_emu(9_144_000, 6_858_000),
                background: None,
                elements: Vec::new(),
            }],
        };
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["fileName"], "deck.pptx");
        assert_eq!(json["slideCount"], 1);
        assert_eq!(json["slideSize"]["widthEmu"], 9_144_000);
        assert_eq!(json["slideSize"]["heightCm"], 19.05);
        assert_eq!(json["slides"][0]["slideNumber"], 1);
        assert_eq!(json["slides"][0]["size"]["widthCm"], 25.4);
        assert_eq!(json["slides"][0]["size"]["heightEmu"], 6_858_000);
        // inherited background serializes as null, not {}
        assert!(json["slides"][0]["background"].is_null());
        assert!(json["slides"][0]["elements"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_explicit_background() {
        let slide = Slide {
            slide_number: 2,
            size: SlideSize::from_emu(9_144_000, 6_858_000),
            background: Some(Background {
                fill_color: Some("#1A2B3C".to_string()),
                image_base64: None,
            }),
            elements: Vec::new(),
        };
        let json = serde_json::to_value(&slide).unwrap();
        assert_eq!(json["background"]["fillColor"], "#1A2B3C");
        assert!(json["background"]["imageBase64"].is_null());
    }

    #[test]
    fn test_find_element() {
        use crate::model::{ChartElement, Element};

        let doc = Document {
            file_name: "deck.pptx".to_string(),
            slide_count: 2,
            slide_size: SlideSize::from_emu(9_144_000, 6_858_000),
            slides: vec![
                Slide {
                    slide_number: 1,
                    size: SlideSize::from_emu(9_144_000, 6_858_000),
                    background: None,
                    elements: Vec::new(),
                },
                Slide {
                    slide_number: 2,
                    size: SlideSize::from_emu(9_144_000, 6_858_000),
                    background: None,
                    elements: vec![Element::Chart(ChartElement {
                        id: "s2-chart1".to_string(),
                        z_index: 1,
                        geometry: None,
                        rel_id: "rId3".to_string(),
                    })],
                },
            ],
        };
        assert!(doc.find_element("s2-chart1").is_some());
        assert!(doc.find_element("s1-el1").is_none());
    }
}
