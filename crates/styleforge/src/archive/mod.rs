//! ZIP-packaged artifact bundles: one root JSON document plus zero or more
//! sprite-sheet sidecars (a PNG and its index JSON, optionally with an
//! `@2x` pixel-ratio variant).

pub mod error;

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::io::{Cursor, Read, Write};

use serde_json::Value;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

pub use error::{ArchiveError, Result};

/// An in-memory artifact bundle.
///
/// The root JSON document is parsed and mutable; sidecar entries are kept
/// as raw bytes and copied through on re-serialization without
/// recompression, so a bundle survives a load/update round trip with every
/// untouched entry byte-identical. Some servers produce sidecar index
/// entries whose compressed form must not be re-encoded; raw copy keeps
/// those intact.
pub struct StyleArchive {
    raw: Vec<u8>,
    root_name: String,
    root: Value,
    sidecars: BTreeMap<String, Vec<u8>>,
}

impl StyleArchive {
    /// Parses a ZIP blob and validates its structure: exactly one root JSON
    /// document, and every PNG paired with an index JSON of the same stem.
    pub fn load(bytes: Vec<u8>) -> Result<Self> {
        let mut zip = ZipArchive::new(Cursor::new(bytes.as_slice()))?;

        let mut json_entries = Vec::new();
        let mut png_entries = Vec::new();
        for i in 0..zip.len() {
            let entry = zip.by_index(i)?;
            if entry.is_dir() {
                continue;
            }
            let name = entry.name().to_string();
            match extension(&name) {
                Some("json") => json_entries.push(name),
                Some("png") => png_entries.push(name),
                _ => {}
            }
        }

        let json_count = json_entries.len();
        let png_count = png_entries.len();
        if json_count != png_count + 1 {
            return Err(ArchiveError::Structure {
                json_count,
                png_count,
            });
        }

        let json_stems: HashSet<&str> = json_entries.iter().map(|n| stem(n)).collect();
        for png in &png_entries {
            if !json_stems.contains(stem(png)) {
                return Err(ArchiveError::UnpairedSidecar(png.clone()));
            }
        }

        let png_stems: HashSet<&str> = png_entries.iter().map(|n| stem(n)).collect();
        let mut roots = json_entries
            .iter()
            .filter(|n| !png_stems.contains(stem(n)));
        let root_name = match (roots.next(), roots.next()) {
            (Some(name), None) => name.clone(),
            _ => {
                return Err(ArchiveError::Structure {
                    json_count,
                    png_count,
                })
            }
        };

        let mut sidecars = BTreeMap::new();
        for name in json_entries.iter().chain(png_entries.iter()) {
            if *name == root_name {
                continue;
            }
            let mut entry = zip.by_name(name)?;
            let mut data = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut data)?;
            sidecars.insert(name.clone(), data);
        }

        let root = {
            let mut entry = zip.by_name(&root_name)?;
            let mut data = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut data)?;
            serde_json::from_slice(&data).map_err(|source| ArchiveError::RootParse {
                name: root_name.clone(),
                source,
            })?
        };

        drop(zip);
        Ok(Self {
            raw: bytes,
            root_name,
            root,
            sidecars,
        })
    }

    pub fn root_name(&self) -> &str {
        &self.root_name
    }

    pub fn root_document(&self) -> &Value {
        &self.root
    }

    pub fn sidecar_names(&self) -> impl Iterator<Item = &str> {
        self.sidecars.keys().map(String::as_str)
    }

    /// Resolves a sidecar reference (a placeholder-host URL or a bare name,
    /// optionally `@2x`-suffixed, with its file extension) to the matching
    /// sidecar's bytes. Matching is on the final path segment with any
    /// query string stripped.
    pub fn asset(&self, reference: &str) -> Option<&[u8]> {
        let trimmed = reference.split(['?', '#']).next().unwrap_or(reference);
        let name = trimmed.trim_end_matches('/').rsplit('/').next()?;
        self.sidecars.get(name).map(Vec::as_slice)
    }

    /// Replaces the root document and re-serializes the whole bundle.
    /// Every other entry is copied raw, preserving its compressed bytes.
    pub fn update_root_document(&mut self, new_root: Value) -> Result<Vec<u8>> {
        let serialized =
            serde_json::to_vec(&new_root).map_err(ArchiveError::RootSerialize)?;

        let mut reader = ZipArchive::new(Cursor::new(self.raw.as_slice()))?;
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

        for i in 0..reader.len() {
            let entry = reader.by_index_raw(i)?;
            if entry.name() == self.root_name {
                drop(entry);
                let options =
                    SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
                writer.start_file(self.root_name.clone(), options)?;
                writer.write_all(&serialized)?;
            } else {
                writer.raw_copy_file(entry)?;
            }
        }

        let bytes = writer.finish()?.into_inner();
        self.root = new_root;
        self.raw = bytes.clone();
        Ok(bytes)
    }
}

// Summary Debug; sidecar and raw bytes are not worth dumping.
impl fmt::Debug for StyleArchive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StyleArchive")
            .field("root_name", &self.root_name)
            .field("sidecars", &self.sidecars.len())
            .field("bytes", &self.raw.len())
            .finish()
    }
}

fn extension(name: &str) -> Option<&str> {
    name.rsplit_once('.').map(|(_, ext)| ext)
}

fn stem(name: &str) -> &str {
    name.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(name)
}
