//! Slide elements: the tagged union produced by the classifiers.
//!
//! One variant per classifier, so consumers get an exhaustive `match`
//! instead of loose string checks on a `kind` field. The `kind` tag plus
//! camelCase fields are the wire contract.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::unit::{emu_to_cm, rotation_to_degrees};

/// Position, size, and rotation of an element.
///
/// Native units plus derived centimeters (rounded to two decimals), so
/// renderers never repeat the conversion. `rot` is degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Geometry {
    pub x_emu: i64,
    pub y_emu: i64,
    pub w_emu: i64,
    pub h_emu: i64,
    pub x_cm: f64,
    pub y_cm: f64,
    pub w_cm: f64,
    pub h_cm: f64,
    #[serde(default)]
    pub rot: f64,
}

impl Geometry {
    /// Build a geometry from native offsets/extents and a raw `rot` value.
    pub fn from_emu(x: i64, y: i64, w: i64, h: i64, rot_raw: i64) -> Self {
        Self {
            x_emu: x,
            y_emu: y,
            w_emu: w,
            h_emu: h,
            x_cm: emu_to_cm(x),
            y_cm: emu_to_cm(y),
            w_cm: emu_to_cm(w),
            h_cm: emu_to_cm(h),
            rot: rotation_to_degrees(rot_raw),
        }
    }
}

/// Semantic role of a shape, mapped from its placeholder type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlaceholderRole {
    Title,
    Content,
    SlideNumber,
    Date,
    Footer,
    Header,
    PageNumber,
    /// Text shape without a recognized placeholder
    Textbox,
    /// Plain shape without a recognized placeholder
    Shape,
}

/// Placeholder `type` attribute → role. `ctrTitle` folds into `title`.
static PLACEHOLDER_ROLES: phf::Map<&'static str, PlaceholderRole> = phf::phf_map! {
    "title" => PlaceholderRole::Title,
    "ctrTitle" => PlaceholderRole::Title,
    "body" => PlaceholderRole::Content,
    "sldNum" => PlaceholderRole::SlideNumber,
    "dt" => PlaceholderRole::Date,
    "ftr" => PlaceholderRole::Footer,
    "hdr" => PlaceholderRole::Header,
    "pgNum" => PlaceholderRole::PageNumber,
};

impl PlaceholderRole {
    /// Resolve a shape's role from its raw placeholder type.
    ///
    /// Unrecognized or absent types split on whether the shape carries
    /// text: `textbox` for text shapes, `shape` for plain ones.
    pub fn from_ph_type(ph_type: Option<&str>, has_text: bool) -> Self {
        match ph_type.and_then(|t| PLACEHOLDER_ROLES.get(t)) {
            Some(&role) => role,
            None if has_text => Self::Textbox,
            None => Self::Shape,
        }
    }

    /// Roles eligible for the layout-placeholder fallback.
    pub fn is_layout_fallback(&self) -> bool {
        matches!(
            self,
            Self::Date | Self::SlideNumber | Self::Footer | Self::Header | Self::PageNumber
        )
    }
}

/// Raster/vector format of an embedded image, detected but never decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    Bmp,
    Tiff,
    Emf,
    Wmf,
    Svg,
}

impl ImageFormat {
    /// MIME type for data-URL payloads.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
            Self::Bmp => "image/bmp",
            Self::Tiff => "image/tiff",
            Self::Emf => "image/emf",
            Self::Wmf => "image/wmf",
            Self::Svg => "image/svg+xml",
        }
    }

    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "gif" => Some(Self::Gif),
            "bmp" => Some(Self::Bmp),
            "tif" | "tiff" => Some(Self::Tiff),
            "emf" => Some(Self::Emf),
            "wmf" => Some(Self::Wmf),
            "svg" => Some(Self::Svg),
            _ => None,
        }
    }

    /// Detect format from magic bytes.
    pub fn detect_from_bytes(data: &[u8]) -> Option<Self> {
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            Some(Self::Png)
        } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(Self::Jpeg)
        } else if data.starts_with(b"GIF8") {
            Some(Self::Gif)
        } else if data.starts_with(b"BM") {
            Some(Self::Bmp)
        } else if data.starts_with(&[0x49, 0x49, 0x2A, 0x00])
            || data.starts_with(&[0x4D, 0x4D, 0x00, 0x2A])
        {
            Some(Self::Tiff)
        } else if data.starts_with(&[0x01, 0x00, 0x00, 0x00])
            && data.len() > 44
            && &data[40..44] == b" EMF"
        {
            Some(Self::Emf)
        } else if data.starts_with(&[0xD7, 0xCD, 0xC6, 0x9A])
            || data.starts_with(&[0x01, 0x00, 0x09, 0x00])
        {
            Some(Self::Wmf)
        } else {
            None
        }
    }

    /// Whether browsers/renderers can display this format directly.
    ///
    /// EMF, WMF, and TIFF are carried through with payload intact but
    /// renderers show a placeholder instead of decoding them.
    pub fn supports_preview(&self) -> bool {
        !matches!(self, Self::Emf | Self::Wmf | Self::Tiff)
    }
}

/// Media element flavor: a plain picture or an icon glyph embedded through
/// a graphic frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Icon,
}

/// Ordinal family an element id counts within.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementFamily {
    /// `el`: shape nodes
    Shape,
    /// `img`: pictures and icons
    Media,
    /// `chart`: graphic-frame charts
    Chart,
    /// `lp`: layout placeholders
    LayoutPlaceholder,
}

impl ElementFamily {
    fn prefix(&self) -> &'static str {
        match self {
            Self::Shape => "el",
            Self::Media => "img",
            Self::Chart => "chart",
            Self::LayoutPlaceholder => "lp",
        }
    }
}

/// Decoded element id: slide number, family, and 1-based ordinal.
///
/// The string form ("s3-el2") is stable across re-extractions of the same
/// source and is what patch-back uses to find the shape again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementId {
    pub slide: usize,
    pub family: ElementFamily,
    pub ordinal: usize,
}

impl ElementId {
    pub fn shape(slide: usize, ordinal: usize) -> Self {
        Self {
            slide,
            family: ElementFamily::Shape,
            ordinal,
        }
    }

    pub fn media(slide: usize, ordinal: usize) -> Self {
        Self {
            slide,
            family: ElementFamily::Media,
            ordinal,
        }
    }

    pub fn chart(slide: usize, ordinal: usize) -> Self {
        Self {
            slide,
            family: ElementFamily::Chart,
            ordinal,
        }
    }

    pub fn layout_placeholder(slide: usize, ordinal: usize) -> Self {
        Self {
            slide,
            family: ElementFamily::LayoutPlaceholder,
            ordinal,
        }
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}-{}{}", self.slide, self.family.prefix(), self.ordinal)
    }
}

impl FromStr for ElementId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        let invalid = || Error::InvalidElementId(s.to_string());
        let bytes = s.as_bytes();
        if bytes.first() != Some(&b's') {
            return Err(invalid());
        }
        let dash = s.find('-').ok_or_else(invalid)?;
        let slide = atoi_simd::parse::<usize>(&bytes[1..dash]).map_err(|_| invalid())?;

        let rest = &bytes[dash + 1..];
        let digits_at = rest
            .iter()
            .position(|b| b.is_ascii_digit())
            .ok_or_else(invalid)?;
        let family = match &rest[..digits_at] {
            b"el" => ElementFamily::Shape,
            b"img" => ElementFamily::Media,
            b"chart" => ElementFamily::Chart,
            b"lp" => ElementFamily::LayoutPlaceholder,
            _ => return Err(invalid()),
        };
        let ordinal = atoi_simd::parse::<usize>(&rest[digits_at..]).map_err(|_| invalid())?;

        if slide == 0 || ordinal == 0 {
            return Err(invalid());
        }
        Ok(Self {
            slide,
            family,
            ordinal,
        })
    }
}

/// A text or plain shape. Plain shapes carry `content: null`.
///
/// Layout placeholders reuse this record; their variant tag marks the
/// different source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeElement {
    pub id: String,
    #[serde(rename = "type")]
    pub role: PlaceholderRole,
    /// Raw placeholder `type` attribute, before role mapping
    pub placeholder_type: Option<String>,
    /// Preset geometry name (`rect`, `ellipse`, `roundRect`, ...)
    pub shape_type: Option<String>,
    pub z_index: u32,
    pub geometry: Option<Geometry>,
    pub content: Option<super::TextContent>,
    pub style: super::StyleBlock,
}

/// A picture or icon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PictureElement {
    pub id: String,
    #[serde(rename = "type")]
    pub media: MediaKind,
    pub z_index: u32,
    pub geometry: Option<Geometry>,
    /// Package entry name of the media ("ppt/media/image3.png")
    pub image_ref: Option<String>,
    /// Final path segment ("image3.png")
    pub image_name: Option<String>,
    /// Inlined payload as a data URL, when the media entry exists
    pub image_base64: Option<String>,
    pub format: Option<ImageFormat>,
}

/// A graphic-frame chart; the chart part is opaque to extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartElement {
    pub id: String,
    pub z_index: u32,
    pub geometry: Option<Geometry>,
    /// Relationship id of the chart part in the slide's rels
    pub rel_id: String,
}

/// One drawable on a slide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Element {
    Shape(ShapeElement),
    Picture(PictureElement),
    Icon(PictureElement),
    Chart(ChartElement),
    LayoutPlaceholder(ShapeElement),
}

impl Element {
    /// Stable element id string.
    pub fn id(&self) -> &str {
        match self {
            Self::Shape(e) | Self::LayoutPlaceholder(e) => &e.id,
            Self::Picture(e) | Self::Icon(e) => &e.id,
            Self::Chart(e) => &e.id,
        }
    }

    /// Stacking order, 1-based, strictly increasing within a slide.
    pub fn z_index(&self) -> u32 {
        match self {
            Self::Shape(e) | Self::LayoutPlaceholder(e) => e.z_index,
            Self::Picture(e) | Self::Icon(e) => e.z_index,
            Self::Chart(e) => e.z_index,
        }
    }

    /// Geometry, when the source node carried a full transform.
    pub fn geometry(&self) -> Option<&Geometry> {
        match self {
            Self::Shape(e) | Self::LayoutPlaceholder(e) => e.geometry.as_ref(),
            Self::Picture(e) | Self::Icon(e) => e.geometry.as_ref(),
            Self::Chart(e) => e.geometry.as_ref(),
        }
    }
}
