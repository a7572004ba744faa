//! Scene assembly: per-slide walks, id/z bookkeeping, layout fallback.
//!
//! Stacking order is source document order. Every drawable gets its z-index
//! from a counter that only advances on emission, while id ordinals count
//! source nodes per family, so a degraded element never shifts the ids of
//! its siblings. A failing element is dropped without aborting the slide; a
//! failing slide yields an empty slide without aborting the document.

use std::collections::HashSet;

use log::{debug, warn};

use crate::error::Result;
use crate::model::{
    ChartElement, Document, Element, ElementId, MediaKind, PlaceholderRole, Slide, SlideSize,
};

use super::background::read_background;
use super::package::PptxFile;
use super::picture::build_picture_element;
use super::shape::{FrameContent, NodeKind, build_shape_element, classify_frame, read_ph_type, scan_shape_tree};

#[derive(Default)]
struct Counters {
    el: usize,
    img: usize,
    chart: usize,
    lp: usize,
}

impl PptxFile {
    /// Extract the whole presentation into a scene-graph document.
    pub fn extract(&self) -> Result<Document> {
        let slide_size = self.slide_size()?;

        let mut slides = Vec::with_capacity(self.slide_count());
        for index in 0..self.slide_count() {
            slides.push(self.build_slide(index, slide_size));
        }

        let element_total: usize = slides.iter().map(|s| s.elements.len()).sum();
        debug!(
            "{}: extracted {} slides, {} elements",
            self.file_name(),
            slides.len(),
            element_total
        );

        Ok(Document {
            file_name: self.file_name().to_string(),
            slide_count: slides.len(),
            slide_size,
            slides,
        })
    }

    fn build_slide(&self, index: usize, size: SlideSize) -> Slide {
        let slide_number = index + 1;
        match self.try_build_slide(index, slide_number, size) {
            Ok(slide) => slide,
            Err(e) => {
                warn!("slide {}: {}", slide_number, e);
                Slide {
                    slide_number,
                    size,
                    background: None,
                    elements: Vec::new(),
                }
            },
        }
    }

    fn try_build_slide(&self, index: usize, slide_number: usize, size: SlideSize) -> Result<Slide> {
        let xml = self.slide_part(index)?;
        let rels = self.slide_rels(index);
        let theme = self.theme();

        let background = match read_background(xml, theme, &rels, self.package()) {
            Ok(bg) => bg,
            Err(e) => {
                debug!("slide {} background: {}", slide_number, e);
                None
            },
        };

        let mut elements = Vec::new();
        let mut z: u32 = 0;
        let mut counters = Counters::default();

        for drawable in scan_shape_tree(xml)? {
            match drawable.kind {
                NodeKind::Shape | NodeKind::Connector => {
                    counters.el += 1;
                    let id = ElementId::shape(slide_number, counters.el).to_string();
                    match build_shape_element(drawable.xml, id, z + 1, theme) {
                        Ok(el) => {
                            z += 1;
                            elements.push(Element::Shape(el));
                        },
                        Err(e) => debug!("slide {} el{}: {}", slide_number, counters.el, e),
                    }
                },
                NodeKind::Picture => {
                    counters.img += 1;
                    let id = ElementId::media(slide_number, counters.img).to_string();
                    match build_picture_element(
                        drawable.xml,
                        id,
                        MediaKind::Image,
                        z + 1,
                        &rels,
                        self.package(),
                    ) {
                        Ok(el) => {
                            z += 1;
                            elements.push(Element::Picture(el));
                        },
                        Err(e) => debug!("slide {} img{}: {}", slide_number, counters.img, e),
                    }
                },
                NodeKind::Frame => match classify_frame(drawable.xml) {
                    Ok(FrameContent::Chart(rel_id)) => {
                        counters.chart += 1;
                        let id = ElementId::chart(slide_number, counters.chart).to_string();
                        let geometry = match super::geometry::read_transform(drawable.xml) {
                            Ok(g) => g,
                            Err(e) => {
                                debug!("slide {} {}: {}", slide_number, id, e);
                                None
                            },
                        };
                        z += 1;
                        elements.push(Element::Chart(ChartElement {
                            id,
                            z_index: z,
                            geometry,
                            rel_id,
                        }));
                    },
                    Ok(FrameContent::Picture) => {
                        counters.img += 1;
                        let id = ElementId::media(slide_number, counters.img).to_string();
                        match build_picture_element(
                            drawable.xml,
                            id,
                            MediaKind::Icon,
                            z + 1,
                            &rels,
                            self.package(),
                        ) {
                            Ok(el) => {
                                z += 1;
                                elements.push(Element::Icon(el));
                            },
                            Err(e) => debug!("slide {} img{}: {}", slide_number, counters.img, e),
                        }
                    },
                    Ok(FrameContent::Other) => {},
                    Err(e) => debug!("slide {} frame: {}", slide_number, e),
                },
            }
        }

        self.append_layout_fallback(&rels, slide_number, &mut elements, &mut z, &mut counters);

        Ok(Slide {
            slide_number,
            size,
            background,
            elements,
        })
    }

    /// Append layout placeholders for standard roles the slide leaves
    /// empty, after everything else so they stack on top only by default.
    fn append_layout_fallback(
        &self,
        rels: &crate::opc::Relationships,
        slide_number: usize,
        elements: &mut Vec<Element>,
        z: &mut u32,
        counters: &mut Counters,
    ) {
        let Some((layout_xml, _layout_rels)) = self.layout_for(rels) else {
            return;
        };

        // roles the slide already fills with text
        let mut covered: HashSet<PlaceholderRole> = elements
            .iter()
            .filter_map(|el| match el {
                Element::Shape(s) if s.role.is_layout_fallback() && s.content.is_some() => {
                    Some(s.role)
                },
                _ => None,
            })
            .collect();

        let drawables = match scan_shape_tree(layout_xml) {
            Ok(d) => d,
            Err(e) => {
                debug!("slide {} layout: {}", slide_number, e);
                return;
            },
        };

        for drawable in drawables {
            if drawable.kind != NodeKind::Shape {
                continue;
            }
            let ph_type = match read_ph_type(drawable.xml) {
                Ok(t) => t,
                Err(_) => continue,
            };
            let Some(ph_type) = ph_type else { continue };
            let role = PlaceholderRole::from_ph_type(Some(&ph_type), false);
            if !role.is_layout_fallback() || covered.contains(&role) {
                continue;
            }

            counters.lp += 1;
            let id = ElementId::layout_placeholder(slide_number, counters.lp).to_string();
            match build_shape_element(drawable.xml, id, *z + 1, self.theme()) {
                Ok(el) => {
                    *z += 1;
                    covered.insert(role);
                    elements.push(Element::LayoutPlaceholder(el));
                },
                Err(e) => debug!("slide {} lp{}: {}", slide_number, counters.lp, e),
            }
        }
    }
}
