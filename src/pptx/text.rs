//! Text body extraction: paragraphs, runs, bullets, run styles.
//!
//! Whitespace-only runs are dropped at the source, and a paragraph whose
//! every run was dropped is discarded with them, so downstream consumers
//! only ever see text that renders. Numbering is never computed here; the
//! raw start-at and indent level travel with the paragraph.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::{Error, Result};
use crate::model::{Alignment, Bullet, BulletKind, Paragraph, Run, StyleBlock};
use crate::unit::{centipoints_to_points, parse_emu};
use crate::xml::{attr_is_true, attr_string};

use super::style::{ColorProvider, ColorSpec, first_color};
use super::theme::ColorScheme;

#[derive(Default)]
struct ParaAcc {
    runs: Vec<Run>,
    bullet: Bullet,
    align: Option<Alignment>,
}

#[derive(Default)]
struct RunAcc {
    text: String,
    font_family: Option<String>,
    size: Option<f64>,
    bold: bool,
    italic: bool,
    underline: bool,
    color: ColorSpec,
}

fn read_ppr_attrs(e: &BytesStart, para: &mut ParaAcc) {
    for attr in e.attributes().flatten() {
        match attr.key.as_ref() {
            b"algn" => para.align = Alignment::from_attr(&attr.value),
            b"lvl" => {
                para.bullet.level = atoi_simd::parse::<u32>(&attr.value).unwrap_or(0);
            },
            _ => {},
        }
    }
}

fn read_rpr_attrs(e: &BytesStart, run: &mut RunAcc) {
    for attr in e.attributes().flatten() {
        match attr.key.as_ref() {
            b"sz" => run.size = parse_emu(&attr.value).map(centipoints_to_points),
            b"b" => run.bold = attr_is_true(&attr),
            b"i" => run.italic = attr_is_true(&attr),
            b"u" => run.underline = attr.value.as_ref() != b"none",
            _ => {},
        }
    }
}

/// Resolve the run's color and drop it if nothing survived trimming.
fn finalize_run(acc: RunAcc, theme: &ColorScheme, inherited_fill: Option<&str>) -> Option<Run> {
    if acc.text.trim().is_empty() {
        return None;
    }
    let color = first_color(&[
        ColorProvider::Literal(acc.color.srgb.as_deref()),
        ColorProvider::Scheme(acc.color.scheme.as_deref(), theme),
        ColorProvider::Literal(acc.color.sys_last.as_deref()),
        ColorProvider::Inherited(inherited_fill),
    ]);
    Some(Run {
        text: acc.text,
        style: StyleBlock {
            font_family: acc.font_family,
            font_size: acc.size,
            bold: acc.bold,
            italic: acc.italic,
            underline: acc.underline,
            color,
            ..Default::default()
        },
    })
}

/// Extract the paragraphs of the first text body in a shape subtree.
///
/// `inherited_fill` is the enclosing shape's resolved fill color; runs
/// without their own color fall back to it (some producers rely on the
/// shape fill as an implicit text color).
pub(crate) fn read_paragraphs(
    xml: &[u8],
    theme: &ColorScheme,
    inherited_fill: Option<&str>,
) -> Result<Vec<Paragraph>> {
    let mut reader = Reader::from_reader(xml);

    let mut paragraphs = Vec::new();
    let mut in_body = false;
    let mut para: Option<ParaAcc> = None;
    let mut run: Option<RunAcc> = None;
    let mut in_ppr = false;
    let mut in_rpr = false;
    let mut in_fill = false;
    let mut in_t = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"txBody" => in_body = true,
                b"p" if in_body => para = Some(ParaAcc::default()),
                b"pPr" => {
                    if let Some(p) = para.as_mut() {
                        read_ppr_attrs(e, p);
                        in_ppr = true;
                    }
                },
                b"r" | b"fld" if para.is_some() => run = Some(RunAcc::default()),
                b"rPr" => {
                    if let Some(r) = run.as_mut() {
                        read_rpr_attrs(e, r);
                        in_rpr = true;
                    }
                },
                b"solidFill" if in_rpr => in_fill = true,
                b"t" if run.is_some() => in_t = true,
                b"br" => append_line_break(&mut para),
                _ => handle_leaf(e, &mut para, &mut run, in_ppr, in_rpr, in_fill),
            },
            Ok(Event::Empty(ref e)) => match e.local_name().as_ref() {
                b"pPr" => {
                    if let Some(p) = para.as_mut() {
                        read_ppr_attrs(e, p);
                    }
                },
                b"rPr" => {
                    if let Some(r) = run.as_mut() {
                        read_rpr_attrs(e, r);
                    }
                },
                b"br" => append_line_break(&mut para),
                _ => handle_leaf(e, &mut para, &mut run, in_ppr, in_rpr, in_fill),
            },
            Ok(Event::Text(ref t)) if in_t => {
                let text = t.xml_content().map_err(|e| Error::Xml(e.to_string()))?;
                if let Some(r) = run.as_mut() {
                    r.text.push_str(&text);
                }
            },
            // entity and character references arrive as their own events,
            // splitting the surrounding text
            Ok(Event::GeneralRef(ref e)) if in_t => {
                let name = e.decode().map_err(|e| Error::Xml(e.to_string()))?;
                if let Some(ch) = resolve_reference(&name) {
                    if let Some(r) = run.as_mut() {
                        r.text.push(ch);
                    }
                }
            },
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"txBody" => break,
                b"p" => {
                    if let Some(p) = para.take() {
                        // a paragraph with no surviving runs is discarded
                        if !p.runs.is_empty() {
                            paragraphs.push(Paragraph {
                                runs: p.runs,
                                bullet: p.bullet,
                                align: p.align,
                            });
                        }
                    }
                },
                b"r" | b"fld" => {
                    if let Some(acc) = run.take() {
                        if let Some(r) = finalize_run(acc, theme, inherited_fill) {
                            if let Some(p) = para.as_mut() {
                                p.runs.push(r);
                            }
                        }
                    }
                },
                b"rPr" => {
                    in_rpr = false;
                    in_fill = false;
                },
                b"solidFill" => in_fill = false,
                b"pPr" => in_ppr = false,
                b"t" => in_t = false,
                _ => {},
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Xml(e.to_string())),
            _ => {},
        }
    }

    Ok(paragraphs)
}

/// Leaf elements inside pPr (bullets) and rPr (font, colors).
fn handle_leaf(
    e: &BytesStart,
    para: &mut Option<ParaAcc>,
    run: &mut Option<RunAcc>,
    in_ppr: bool,
    in_rpr: bool,
    in_fill: bool,
) {
    let name = e.local_name();
    if in_ppr {
        if let Some(p) = para.as_mut() {
            match name.as_ref() {
                b"buChar" => {
                    p.bullet.kind = BulletKind::Bullet;
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"char" {
                            p.bullet.char = attr_string(&attr);
                        }
                    }
                },
                b"buAutoNum" => {
                    p.bullet.kind = BulletKind::Number;
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"startAt" {
                            p.bullet.start_at = parse_emu(&attr.value);
                        }
                    }
                },
                b"buNone" => {
                    p.bullet.kind = BulletKind::None;
                    p.bullet.char = None;
                },
                _ => {},
            }
        }
    }
    if in_rpr {
        if let Some(r) = run.as_mut() {
            if name.as_ref() == b"latin" {
                for attr in e.attributes().flatten() {
                    if attr.key.as_ref() == b"typeface" {
                        r.font_family = attr_string(&attr);
                    }
                }
            } else if in_fill {
                r.color.note(e);
            }
        }
    }
}

/// A line break becomes a newline on the preceding run so the combined
/// paragraph text keeps it.
fn append_line_break(para: &mut Option<ParaAcc>) {
    if let Some(p) = para.as_mut() {
        if let Some(last) = p.runs.last_mut() {
            last.text.push('\n');
        }
    }
}

/// Resolve a general reference to its character: the five predefined
/// entities plus decimal and hex character references. Undeclared entity
/// names resolve to nothing and drop out of the run.
fn resolve_reference(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "apos" => Some('\''),
        "quot" => Some('"'),
        _ => {
            let digits = name.strip_prefix('#')?;
            let code = match digits.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => atoi_simd::parse::<u32>(digits.as_bytes()).ok()?,
            };
            char::from_u32(code)
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(inner: &str) -> Vec<u8> {
        format!(
            r#"<p:sp xmlns:p="p" xmlns:a="a" xmlns:r="r"><p:spPr/><p:txBody>{}</p:txBody></p:sp>"#,
            inner
        )
        .into_bytes()
    }

    fn parse(inner: &str) -> Vec<Paragraph> {
        read_paragraphs(&body(inner), &ColorScheme::empty(), None).unwrap()
    }

    #[test]
    fn test_styled_runs() {
        let paras = parse(
            r#"<a:p>
              <a:r>
                <a:rPr sz="2400" b="1" i="0">
                  <a:solidFill><a:srgbClr val="FF0000"/></a:solidFill>
                  <a:latin typeface="Calibri"/>
                </a:rPr>
                <a:t>Hello </a:t>
              </a:r>
              <a:r><a:rPr u="sng"/><a:t>world</a:t></a:r>
            </a:p>"#,
        );
        assert_eq!(paras.len(), 1);
        assert_eq!(paras[0].runs.len(), 2);
        let first = &paras[0].runs[0];
        assert_eq!(first.text, "Hello ");
        assert_eq!(first.style.font_size, Some(24.0));
        assert!(first.style.bold);
        assert!(!first.style.italic);
        assert_eq!(first.style.color.as_deref(), Some("#FF0000"));
        assert_eq!(first.style.font_family.as_deref(), Some("Calibri"));
        assert!(paras[0].runs[1].style.underline);
        assert_eq!(paras[0].text(), "Hello world");
    }

    #[test]
    fn test_whitespace_runs_dropped() {
        let paras = parse(
            r#"<a:p><a:r><a:t>   </a:t></a:r><a:r><a:t>kept</a:t></a:r></a:p>
               <a:p><a:r><a:t>  </a:t></a:r></a:p>"#,
        );
        // second paragraph vanishes entirely
        assert_eq!(paras.len(), 1);
        assert_eq!(paras[0].runs.len(), 1);
        assert_eq!(paras[0].runs[0].text, "kept");
    }

    #[test]
    fn test_all_whitespace_body_is_empty() {
        let paras = parse(r#"<a:p><a:r><a:t> </a:t></a:r></a:p><a:p/>"#);
        assert!(paras.is_empty());
    }

    #[test]
    fn test_scheme_color_and_inherited_fill() {
        let theme = ColorScheme::parse(
            br#"<a:x xmlns:a="a"><a:clrScheme>
                <a:accent2><a:srgbClr val="ED7D31"/></a:accent2>
            </a:clrScheme></a:x>"#,
        )
        .unwrap();

        let xml = body(
            r#"<a:p>
              <a:r><a:rPr><a:solidFill><a:schemeClr val="accent2"/></a:solidFill></a:rPr><a:t>themed</a:t></a:r>
              <a:r><a:t>plain</a:t></a:r>
            </a:p>"#,
        );
        let paras = read_paragraphs(&xml, &theme, Some("#112233")).unwrap();
        assert_eq!(paras[0].runs[0].style.color.as_deref(), Some("#ED7D31"));
        // no explicit color: the shape fill stands in
        assert_eq!(paras[0].runs[1].style.color.as_deref(), Some("#112233"));
    }

    #[test]
    fn test_bullet_metadata() {
        let paras = parse(
            r#"<a:p><a:pPr lvl="1"><a:buChar char="&#8226;"/></a:pPr><a:r><a:t>a</a:t></a:r></a:p>
               <a:p><a:pPr><a:buAutoNum type="arabicPeriod" startAt="3"/></a:pPr><a:r><a:t>b</a:t></a:r></a:p>
               <a:p><a:r><a:t>c</a:t></a:r></a:p>"#,
        );
        assert_eq!(paras.len(), 3);
        assert_eq!(paras[0].bullet.kind, BulletKind::Bullet);
        assert_eq!(paras[0].bullet.level, 1);
        assert_eq!(paras[0].bullet.char.as_deref(), Some("\u{2022}"));
        assert_eq!(paras[1].bullet.kind, BulletKind::Number);
        assert_eq!(paras[1].bullet.start_at, Some(3));
        assert_eq!(paras[2].bullet.kind, BulletKind::None);
        assert_eq!(paras[2].bullet.level, 0);
    }

    #[test]
    fn test_alignment() {
        let paras = parse(r#"<a:p><a:pPr algn="ctr"/><a:r><a:t>mid</a:t></a:r></a:p>"#);
        assert_eq!(paras[0].align, Some(Alignment::Center));
    }

    #[test]
    fn test_field_text() {
        let paras = parse(
            r#"<a:p><a:fld id="{X}" type="slidenum"><a:rPr sz="1200"/><a:t>2</a:t></a:fld></a:p>"#,
        );
        assert_eq!(paras.len(), 1);
        assert_eq!(paras[0].runs[0].text, "2");
        assert_eq!(paras[0].runs[0].style.font_size, Some(12.0));
    }

    #[test]
    fn test_entities_unescaped() {
        let paras = parse(r#"<a:p><a:r><a:t>A &amp; B &lt;ok&gt;</a:t></a:r></a:p>"#);
        assert_eq!(paras[0].runs[0].text, "A & B <ok>");
    }

    #[test]
    fn test_char_references_resolved() {
        let paras =
            parse(r#"<a:p><a:r><a:t>&#169; 2024 &#x2022; end</a:t></a:r></a:p>"#);
        assert_eq!(paras[0].runs[0].text, "\u{a9} 2024 \u{2022} end");
    }

    #[test]
    fn test_line_break_joins_text() {
        let paras = parse(
            r#"<a:p><a:r><a:t>one</a:t></a:r><a:br/><a:r><a:t>two</a:t></a:r></a:p>"#,
        );
        assert_eq!(paras[0].text(), "one\ntwo");
    }
}
