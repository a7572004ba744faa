//! Relationship parts (`.rels`): the per-part id to target tables.
//!
//! Every internal reference a slide makes (images, charts, its layout) goes
//! through a relationship id resolved here. Targets are stored as written
//! (usually relative, "../media/image3.png") and normalized to package
//! entry names on demand.

use std::collections::HashMap;

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::error::{Error, Result};
use crate::xml::attr_string;

/// A single relationship from a source part to a target.
#[derive(Debug, Clone)]
pub struct Relationship {
    /// Relationship ID (e.g., "rId1", "rId2")
    r_id: String,

    /// Relationship type URI
    reltype: String,

    /// Target reference - either a part path or an external URL
    target_ref: String,

    /// Directory of the source part, for resolving relative targets
    base_dir: String,

    /// Whether this is an external relationship
    is_external: bool,
}

impl Relationship {
    /// Get the relationship ID.
    #[inline]
    pub fn r_id(&self) -> &str {
        &self.r_id
    }

    /// Get the relationship type URI.
    #[inline]
    pub fn reltype(&self) -> &str {
        &self.reltype
    }

    /// Get the target reference as written in the source.
    #[inline]
    pub fn target_ref(&self) -> &str {
        &self.target_ref
    }

    /// Check if this is an external relationship.
    #[inline]
    pub fn is_external(&self) -> bool {
        self.is_external
    }

    /// Resolve the target to a package entry name.
    ///
    /// `../media/image3.png` relative to `ppt/slides` becomes
    /// `ppt/media/image3.png`. External targets have no package path.
    pub fn target_path(&self) -> Option<String> {
        if self.is_external {
            return None;
        }
        Some(resolve_rel_target(&self.base_dir, &self.target_ref))
    }
}

/// Collection of relationships from a single source part.
#[derive(Debug, Default)]
pub struct Relationships {
    rels: Vec<Relationship>,
    index: HashMap<String, usize>,
}

impl Relationships {
    /// An empty collection, for parts that have no `.rels` sibling.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse a `.rels` part.
    ///
    /// # Arguments
    /// * `xml` - The relationship part's bytes
    /// * `base_dir` - Directory of the source part (e.g., "ppt/slides")
    pub fn parse(xml: &[u8], base_dir: &str) -> Result<Self> {
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(true);

        let mut rels = Self::default();

        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                    if e.local_name().as_ref() != b"Relationship" {
                        continue;
                    }
                    let mut r_id = None;
                    let mut reltype = None;
                    let mut target_ref = None;
                    let mut is_external = false;

                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"Id" => r_id = attr_string(&attr),
                            b"Type" => reltype = attr_string(&attr),
                            b"Target" => target_ref = attr_string(&attr),
                            b"TargetMode" => {
                                is_external = attr.value.as_ref() == b"External";
                            },
                            _ => {},
                        }
                    }

                    if let (Some(r_id), Some(reltype), Some(target_ref)) =
                        (r_id, reltype, target_ref)
                    {
                        let idx = rels.rels.len();
                        rels.index.insert(r_id.clone(), idx);
                        rels.rels.push(Relationship {
                            r_id,
                            reltype,
                            target_ref,
                            base_dir: base_dir.to_string(),
                            is_external,
                        });
                    }
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(Error::Xml(e.to_string())),
                _ => {},
            }
        }

        Ok(rels)
    }

    /// Get a relationship by its ID.
    #[inline]
    pub fn get(&self, r_id: &str) -> Option<&Relationship> {
        self.index.get(r_id).map(|&i| &self.rels[i])
    }

    /// Find the first relationship whose type URI ends with `suffix`.
    ///
    /// Type URIs are long and versioned; lookups match on the trailing
    /// segment ("/theme", "/slideLayout", "/image").
    pub fn find_by_type_suffix(&self, suffix: &str) -> Option<&Relationship> {
        self.rels.iter().find(|r| r.reltype.ends_with(suffix))
    }

    /// Iterate relationships in source order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.rels.iter()
    }

    /// Number of relationships in the collection.
    #[inline]
    pub fn len(&self) -> usize {
        self.rels.len()
    }

    /// Check if the collection is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rels.is_empty()
    }
}

/// Normalize a relationship target against its source part's directory.
///
/// Only forward-slash package paths are involved, so this is plain segment
/// arithmetic: `..` pops, `.` and empty segments drop.
pub(crate) fn resolve_rel_target(base_dir: &str, target: &str) -> String {
    let mut parts: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();

    for seg in target.split('/') {
        match seg {
            ".." => {
                parts.pop();
            },
            "." | "" => {},
            s => parts.push(s),
        }
    }

    parts.join("/")
}
