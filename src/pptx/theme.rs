//! Theme color scheme resolution.
//!
//! Parses the `a:clrScheme` block of a theme part into a slot → RGB map so
//! symbolic color references (`a:schemeClr`) on shapes and runs can be
//! resolved to literal hex values.

use std::collections::HashMap;

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::error::{Error, Result};
use crate::xml::attr_string;

/// Scheme slot names as they appear in `a:clrScheme`.
const SCHEME_SLOTS: [&[u8]; 12] = [
    b"dk1", b"lt1", b"dk2", b"lt2", b"accent1", b"accent2", b"accent3", b"accent4", b"accent5",
    b"accent6", b"hlink", b"folHlink",
];

/// Resolved theme palette: scheme slot name → RGB hex (no leading '#').
///
/// Shape-level references use mapped aliases (`tx1`, `bg1`, ...) which
/// [`resolve`](Self::resolve) translates to their scheme slots.
#[derive(Debug, Clone, Default)]
pub struct ColorScheme {
    colors: HashMap<String, String>,
}

impl ColorScheme {
    /// A scheme with no entries; every lookup misses.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse the first `a:clrScheme` block out of a theme part.
    pub fn parse(xml: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(true);

        let mut colors = HashMap::new();
        let mut in_scheme = false;
        let mut slot: Option<String> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                    let name = e.local_name();
                    if name.as_ref() == b"clrScheme" {
                        in_scheme = true;
                    } else if in_scheme && SCHEME_SLOTS.contains(&name.as_ref()) {
                        slot = std::str::from_utf8(name.as_ref())
                            .ok()
                            .map(|s| s.to_string());
                    } else if let Some(ref current) = slot {
                        // srgbClr carries the value directly; sysClr reports
                        // the last rendered color in lastClr
                        let attr_name: &[u8] = match name.as_ref() {
                            b"srgbClr" => b"val",
                            b"sysClr" => b"lastClr",
                            _ => continue,
                        };
                        for attr in e.attributes().flatten() {
                            if attr.key.local_name().as_ref() == attr_name {
                                if let Some(hex) = attr_string(&attr) {
                                    colors.entry(current.clone()).or_insert(hex);
                                }
                            }
                        }
                    }
                },
                Ok(Event::End(ref e)) => {
                    let name = e.local_name();
                    if name.as_ref() == b"clrScheme" {
                        // only the first scheme counts; extraScheme blocks
                        // repeat the element later in the part
                        break;
                    }
                    if slot.as_deref().map(str::as_bytes) == Some(name.as_ref()) {
                        slot = None;
                    }
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(Error::Xml(e.to_string())),
                _ => {},
            }
        }

        Ok(Self { colors })
    }

    /// Resolve a scheme color name to its RGB hex value.
    ///
    /// Accepts both raw slot names and the mapped aliases shapes actually
    /// reference (`tx1` → `dk1`, `bg1` → `lt1`, ...).
    pub fn resolve(&self, name: &str) -> Option<&str> {
        let slot = match name {
            "tx1" => "dk1",
            "bg1" => "lt1",
            "tx2" => "dk2",
            "bg2" => "lt2",
            other => other,
        };
        self.colors.get(slot).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}
