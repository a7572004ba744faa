//! Text content types: paragraphs, runs, bullets, and style blocks.
//!
//! These are the serializable leaves of the scene graph. Field names and
//! nesting are a wire contract shared with renderers and the editor, so
//! optional values serialize as explicit `null` rather than being skipped.

use serde::{Deserialize, Serialize};

/// Paragraph alignment, serialized with the source `algn` codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Alignment {
    #[serde(rename = "l")]
    Left,
    #[serde(rename = "ctr")]
    Center,
    #[serde(rename = "r")]
    Right,
    #[serde(rename = "just")]
    Justify,
}

impl Alignment {
    /// Map an `algn` attribute value.
    pub(crate) fn from_attr(raw: &[u8]) -> Option<Self> {
        match raw {
            b"l" => Some(Self::Left),
            b"ctr" => Some(Self::Center),
            b"r" => Some(Self::Right),
            b"just" => Some(Self::Justify),
            _ => None,
        }
    }
}

/// Bullet rendering mode for a paragraph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BulletKind {
    #[default]
    None,
    Bullet,
    Number,
}

/// Bullet/numbering descriptor.
///
/// `start_at` is stored raw; numbering counters are a renderer concern so
/// that reordering paragraphs in the editor never touches the model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Bullet {
    #[serde(rename = "type")]
    pub kind: BulletKind,
    /// Indent level, 0-based
    pub level: u32,
    /// Literal bullet glyph (buChar), when kind is `bullet`
    pub char: Option<String>,
    /// First number of a numbered list (buAutoNum), when kind is `number`
    pub start_at: Option<i64>,
}

/// Resolved character formatting.
///
/// Every field is what the node literally carries after resolution; absent
/// stays null. Colors are normalized "#RRGGBB", font size is in points,
/// outline width stays in native units.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StyleBlock {
    pub font_family: Option<String>,
    pub font_size: Option<f64>,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub color: Option<String>,
    pub fill_color: Option<String>,
    pub outline_color: Option<String>,
    pub outline_width: Option<i64>,
    pub align: Option<Alignment>,
}

/// One styled text segment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Run {
    pub text: String,
    pub style: StyleBlock,
}

/// One paragraph: surviving runs plus bullet/alignment metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Paragraph {
    pub runs: Vec<Run>,
    pub bullet: Bullet,
    pub align: Option<Alignment>,
}

impl Paragraph {
    /// Concatenated run text of this paragraph.
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

/// A text shape's content: structured paragraphs plus their combined text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextContent {
    /// Paragraph texts joined with newlines, for consumers that only need
    /// the words
    pub text: String,
    pub paragraphs: Vec<Paragraph>,
}

impl TextContent {
    /// Build content from surviving paragraphs, deriving the combined text.
    pub fn from_paragraphs(paragraphs: Vec<Paragraph>) -> Self {
        let text = paragraphs
            .iter()
            .map(|p| p.text())
            .collect::<Vec<_>>()
            .join("\n");
        Self { text, paragraphs }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alignment_from_attr() {
        assert_eq!(Alignment::from_attr(b"ctr"), Some(Alignment::Center));
        assert_eq!(Alignment::from_attr(b"just"), Some(Alignment::Justify));
        assert_eq!(Alignment::from_attr(b"weird"), None);
    }

    #[test]
    fn test_bullet_defaults() {
        let bullet = Bullet::default();
        assert_eq!(bullet.kind, BulletKind::None);
        assert_eq!(bullet.level, 0);
        assert!(bullet.char.is_none());
        assert!(bullet.start_at.is_none());
    }

    #[test]
    fn test_combined_text() {
        let content = TextContent::from_paragraphs(vec![
            Paragraph {
                runs: vec![
                    Run {
                        text: "Hello ".to_string(),
                        ..Default::default()
                    },
                    Run {
                        text: "world".to_string(),
                        ..Default::default()
                    },
                ],
                ..Default::default()
            },
            Paragraph {
                runs: vec![Run {
                    text: "Second".to_string(),
                    ..Default::default()
                }],
                ..Default::default()
            },
        ]);
        assert_eq!(content.text, "Hello world\nSecond");
    }

    #[test]
    fn test_wire_field_names() {
        let para = Paragraph {
            runs: vec![Run {
                text: "x".to_string(),
                style: StyleBlock {
                    font_size: Some(24.0),
                    fill_color: Some("#112233".to_string()),
                    ..Default::default()
                },
            }],
            bullet: Bullet {
                kind: BulletKind::Number,
                level: 1,
                start_at: Some(3),
                ..Default::default()
            },
            align: Some(Alignment::Center),
        };
        let json = serde_json::to_value(&para).unwrap();
        assert_eq!(json["bullet"]["type"], "number");
        assert_eq!(json["bullet"]["startAt"], 3);
        assert_eq!(json["align"], "ctr");
        assert_eq!(json["runs"][0]["style"]["fontSize"], 24.0);
        assert_eq!(json["runs"][0]["style"]["fillColor"], "#112233");
        // absent values stay present-and-null on the wire
        assert!(json["runs"][0]["style"]["fontFamily"].is_null());
    }

    #[test]
    fn test_serde_round_trip() {
        let para = Paragraph {
            runs: vec![Run {
                text: "round trip".to_string(),
                style: StyleBlock {
                    bold: true,
                    color: Some("#FF0000".to_string()),
                    ..Default::default()
                },
            }],
            bullet: Bullet {
                kind: BulletKind::Bullet,
                char: Some("•".to_string()),
                ..Default::default()
            },
            align: None,
        };
        let json = serde_json::to_string(&para).unwrap();
        let back: Paragraph = serde_json::from_str(&json).unwrap();
        assert_eq!(back, para);
    }
}
