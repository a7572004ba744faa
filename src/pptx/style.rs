//! Color resolution and shape-level style properties.
//!
//! Colors resolve through an explicit ordered provider chain (literal,
//! then symbolic via the theme, then inherited) so the precedence is
//! testable on its own rather than buried in parser conditionals.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::{Error, Result};
use crate::unit::parse_emu;
use crate::xml::attr_string;

use super::theme::ColorScheme;

/// Format a raw RGB hex value as a CSS color.
pub(crate) fn hex_css(hex: &str) -> String {
    format!("#{}", hex.to_ascii_uppercase())
}

/// One step in a color fallback chain.
pub(crate) enum ColorProvider<'a> {
    /// Literal RGB hex on the node itself
    Literal(Option<&'a str>),
    /// Symbolic scheme reference, resolved through the theme
    Scheme(Option<&'a str>, &'a ColorScheme),
    /// Already-resolved color inherited from an enclosing scope
    Inherited(Option<&'a str>),
}

impl ColorProvider<'_> {
    fn color(&self) -> Option<String> {
        match self {
            Self::Literal(hex) => hex.map(hex_css),
            Self::Scheme(name, theme) => name.and_then(|n| theme.resolve(n)).map(hex_css),
            Self::Inherited(css) => css.map(str::to_string),
        }
    }
}

/// Evaluate providers in order; the first that yields a color wins.
pub(crate) fn first_color(providers: &[ColorProvider<'_>]) -> Option<String> {
    providers.iter().find_map(|p| p.color())
}

/// Raw color reference as found in the XML, before resolution.
///
/// A fill carries at most one of these children; the struct keeps whichever
/// appeared so resolution order stays with the provider chain.
#[derive(Debug, Clone, Default)]
pub(crate) struct ColorSpec {
    pub srgb: Option<String>,
    pub scheme: Option<String>,
    pub sys_last: Option<String>,
}

impl ColorSpec {
    /// Record a color child element (`srgbClr`, `schemeClr`, `sysClr`).
    pub(crate) fn note(&mut self, e: &BytesStart) {
        match e.local_name().as_ref() {
            b"srgbClr" => {
                for attr in e.attributes().flatten() {
                    if attr.key.as_ref() == b"val" && self.srgb.is_none() {
                        self.srgb = attr_string(&attr);
                    }
                }
            },
            b"schemeClr" => {
                for attr in e.attributes().flatten() {
                    if attr.key.as_ref() == b"val" && self.scheme.is_none() {
                        self.scheme = attr_string(&attr);
                    }
                }
            },
            b"sysClr" => {
                for attr in e.attributes().flatten() {
                    if attr.key.as_ref() == b"lastClr" && self.sys_last.is_none() {
                        self.sys_last = attr_string(&attr);
                    }
                }
            },
            _ => {},
        }
    }

    /// Resolve to a CSS color: literal, then scheme, then system last-color.
    pub(crate) fn resolve(&self, theme: &ColorScheme) -> Option<String> {
        first_color(&[
            ColorProvider::Literal(self.srgb.as_deref()),
            ColorProvider::Scheme(self.scheme.as_deref(), theme),
            ColorProvider::Literal(self.sys_last.as_deref()),
        ])
    }
}

/// Shape-level fill and outline, read from `spPr`.
#[derive(Debug, Clone, Default)]
pub(crate) struct ShapeProps {
    pub fill: ColorSpec,
    pub outline: ColorSpec,
    pub outline_width: Option<i64>,
}

/// Read the direct fill and outline of a shape subtree.
///
/// Only `spPr`-level `solidFill` counts as the shape fill; run fills live
/// under `txBody` and are read by the text extractor. Gradient, pattern,
/// and picture fills resolve to no color.
pub(crate) fn read_shape_props(xml: &[u8]) -> Result<ShapeProps> {
    let mut reader = Reader::from_reader(xml);

    let mut props = ShapeProps::default();
    let mut in_sppr = false;
    let mut in_ln = false;
    // which ColorSpec an open solidFill feeds
    let mut fill_target: Option<bool> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                let name = e.local_name();
                match name.as_ref() {
                    b"spPr" => in_sppr = true,
                    b"txBody" => break,
                    b"ln" if in_sppr => {
                        in_ln = true;
                        for attr in e.attributes().flatten() {
                            if attr.key.as_ref() == b"w" {
                                props.outline_width = parse_emu(&attr.value);
                            }
                        }
                    },
                    b"solidFill" if in_sppr => fill_target = Some(in_ln),
                    _ => {
                        if let Some(is_outline) = fill_target {
                            if is_outline {
                                props.outline.note(e);
                            } else {
                                props.fill.note(e);
                            }
                        }
                    },
                }
            },
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"spPr" => break,
                b"ln" => in_ln = false,
                b"solidFill" => fill_target = None,
                _ => {},
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Xml(e.to_string())),
            _ => {},
        }
    }

    Ok(props)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn theme_with_accent() -> ColorScheme {
        ColorScheme::parse(
            br#"<a:theme xmlns:a="a"><a:clrScheme>
                <a:dk1><a:srgbClr val="101010"/></a:dk1>
                <a:accent1><a:srgbClr val="4472C4"/></a:accent1>
            </a:clrScheme></a:theme>"#,
        )
        .unwrap()
    }

    #[test]
    fn test_provider_precedence() {
        let theme = theme_with_accent();
        // literal wins over scheme and inherited
        let got = first_color(&[
            ColorProvider::Literal(Some("ff0000")),
            ColorProvider::Scheme(Some("accent1"), &theme),
            ColorProvider::Inherited(Some("#00FF00")),
        ]);
        assert_eq!(got.as_deref(), Some("#FF0000"));

        // scheme wins over inherited
        let got = first_color(&[
            ColorProvider::Literal(None),
            ColorProvider::Scheme(Some("accent1"), &theme),
            ColorProvider::Inherited(Some("#00FF00")),
        ]);
        assert_eq!(got.as_deref(), Some("#4472C4"));

        // inherited is the last resort
        let got = first_color(&[
            ColorProvider::Literal(None),
            ColorProvider::Scheme(None, &theme),
            ColorProvider::Inherited(Some("#00FF00")),
        ]);
        assert_eq!(got.as_deref(), Some("#00FF00"));

        // nothing yields nothing
        let got = first_color(&[
            ColorProvider::Literal(None),
            ColorProvider::Scheme(Some("accent9"), &theme),
            ColorProvider::Inherited(None),
        ]);
        assert_eq!(got, None);
    }

    #[test]
    fn test_shape_fill_and_outline() {
        let xml = br#"<p:sp xmlns:p="p" xmlns:a="a"><p:spPr>
            <a:solidFill><a:srgbClr val="1A2B3C"/></a:solidFill>
            <a:ln w="12700"><a:solidFill><a:schemeClr val="accent1"/></a:solidFill></a:ln>
        </p:spPr></p:sp>"#;
        let props = read_shape_props(xml).unwrap();
        let theme = theme_with_accent();
        assert_eq!(props.fill.resolve(&theme).as_deref(), Some("#1A2B3C"));
        assert_eq!(props.outline.resolve(&theme).as_deref(), Some("#4472C4"));
        assert_eq!(props.outline_width, Some(12_700));
    }

    #[test]
    fn test_run_fill_not_mistaken_for_shape_fill() {
        let xml = br#"<p:sp xmlns:p="p" xmlns:a="a"><p:spPr/>
            <p:txBody><a:p><a:r>
              <a:rPr><a:solidFill><a:srgbClr val="FF0000"/></a:solidFill></a:rPr>
              <a:t>hi</a:t>
            </a:r></a:p></p:txBody></p:sp>"#;
        let props = read_shape_props(xml).unwrap();
        assert!(props.fill.resolve(&ColorScheme::empty()).is_none());
    }

    #[test]
    fn test_no_fill() {
        let xml = br#"<p:sp xmlns:p="p" xmlns:a="a"><p:spPr><a:noFill/></p:spPr></p:sp>"#;
        let props = read_shape_props(xml).unwrap();
        assert!(props.fill.resolve(&ColorScheme::empty()).is_none());
        assert!(props.outline_width.is_none());
    }
}
