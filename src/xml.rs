//! Small shared helpers for quick-xml event handling.

use quick_xml::events::attributes::Attribute;

/// Copy an attribute value into an owned `String`, decoding entity and
/// character references (`&#8226;` becomes the bullet glyph).
///
/// Undecodable values yield `None`; callers degrade the field rather than
/// abort.
#[inline]
pub(crate) fn attr_string(attr: &Attribute<'_>) -> Option<String> {
    attr.unescape_value().ok().map(|v| v.into_owned())
}

/// True when an attribute value spells an OOXML boolean truth ("1"/"true").
#[inline]
pub(crate) fn attr_is_true(attr: &Attribute<'_>) -> bool {
    matches!(attr.value.as_ref(), b"1" | b"true")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;

    fn attr<'a>(value: &'a [u8]) -> Attribute<'a> {
        Attribute {
            key: quick_xml::name::QName(b"val"),
            value: Cow::Borrowed(value),
        }
    }

    #[test]
    fn test_attr_string() {
        assert_eq!(attr_string(&attr(b"FF0000")), Some("FF0000".to_string()));
        assert_eq!(attr_string(&attr(b"")), Some(String::new()));
        assert_eq!(attr_string(&attr(&[0xFF, 0xFE])), None);
    }

    #[test]
    fn test_attr_string_decodes_references() {
        assert_eq!(attr_string(&attr(b"&#8226;")), Some("\u{2022}".to_string()));
        assert_eq!(attr_string(&attr(b"&#x2731;")), Some("\u{2731}".to_string()));
        assert_eq!(attr_string(&attr(b"A &amp; B")), Some("A & B".to_string()));
        // undeclared entities cannot be resolved
        assert_eq!(attr_string(&attr(b"&nosuch;")), None);
    }

    #[test]
    fn test_attr_is_true() {
        assert!(attr_is_true(&attr(b"1")));
        assert!(attr_is_true(&attr(b"true")));
        assert!(!attr_is_true(&attr(b"0")));
        assert!(!attr_is_true(&attr(b"false")));
        assert!(!attr_is_true(&attr(b"none")));
    }
}
