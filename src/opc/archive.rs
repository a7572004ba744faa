//! Physical package access over the ZIP container.
//!
//! Every entry is loaded up front in archive order. Keeping the full entry
//! list (not just the parts the extractor touches) lets patch-back write a
//! container whose unmodified parts are byte-for-byte copies of the input.

use std::collections::HashMap;
use std::io::{Cursor, Read, Write};
use std::path::Path;

use zip::ZipArchive;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::error::{Error, Result};

/// An opened package container.
///
/// Entry order follows the source archive so a saved copy keeps the same
/// part layout. Lookup is by exact entry name ("ppt/slides/slide1.xml").
#[derive(Debug)]
pub struct Package {
    entries: Vec<Entry>,
    index: HashMap<String, usize>,
}

#[derive(Debug)]
struct Entry {
    name: String,
    data: Vec<u8>,
}

impl Package {
    /// Open a package from a file path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(bytes)
    }

    /// Open a package from in-memory bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| Error::MalformedInput(format!("not a ZIP container: {}", e)))?;

        let mut entries = Vec::with_capacity(archive.len());
        let mut index = HashMap::with_capacity(archive.len());

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data)?;
            index.insert(name.clone(), entries.len());
            entries.push(Entry { name, data });
        }

        Ok(Self { entries, index })
    }

    /// Get a part's bytes by entry name.
    #[inline]
    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.index.get(name).map(|&i| self.entries[i].data.as_slice())
    }

    /// Get a part's bytes, failing with `PartNotFound` when absent.
    pub fn expect_part(&self, name: &str) -> Result<&[u8]> {
        self.part(name)
            .ok_or_else(|| Error::PartNotFound(name.to_string()))
    }

    /// Check whether an entry exists.
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Iterate entry names in archive order.
    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    /// Replace an existing part's bytes (patch-back).
    ///
    /// Refuses to create new entries: patching only ever rewrites parts the
    /// source already has.
    pub fn replace_part(&mut self, name: &str, data: Vec<u8>) -> Result<()> {
        let &i = self
            .index
            .get(name)
            .ok_or_else(|| Error::PartNotFound(name.to_string()))?;
        self.entries[i].data = data;
        Ok(())
    }

    /// Serialize the package back into container bytes.
    ///
    /// Entries are written in original order; payloads of untouched parts
    /// are the exact input bytes.
    pub fn save(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        {
            let cursor = Cursor::new(&mut out);
            let mut writer = ZipWriter::new(cursor);
            let options = SimpleFileOptions::default();

            for entry in &self.entries {
                writer.start_file(entry.name.as_str(), options)?;
                writer.write_all(&entry.data)?;
            }

            writer.finish()?;
        }
        Ok(out)
    }
}
