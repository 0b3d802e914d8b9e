//! Persistent cache of name resolutions.
//!
//! The file is a single JSON object mapping each raw source name to either the
//! matched attribute record or `null` when the name could not be resolved.
//! Keys are written in sorted order and non-ASCII text is written literally, so
//! the file diffs cleanly between runs.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::CacheError;
use crate::models::AttributeRecord;

/// Attribute record as stored in the cache: plain JSON values, decimals lowered to floats
pub type CachedRecord = serde_json::Map<String, Value>;

/// Result of resolving one source name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Option<CachedRecord>", into = "Option<CachedRecord>")]
pub enum CacheEntry {
    Resolved(CachedRecord),
    /// Looked up and not found; never retried while the entry exists
    Unresolved,
}

impl CacheEntry {
    /// Copy `record` into cache form
    pub fn resolved(record: &AttributeRecord) -> Self {
        CacheEntry::Resolved(
            record
                .iter()
                .map(|(field, value)| (field.clone(), value.to_json_lossy()))
                .collect(),
        )
    }

    pub fn record(&self) -> Option<&CachedRecord> {
        match self {
            CacheEntry::Resolved(record) => Some(record),
            CacheEntry::Unresolved => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, CacheEntry::Resolved(_))
    }
}

impl From<Option<CachedRecord>> for CacheEntry {
    fn from(value: Option<CachedRecord>) -> Self {
        value.map_or(CacheEntry::Unresolved, CacheEntry::Resolved)
    }
}

impl From<CacheEntry> for Option<CachedRecord> {
    fn from(entry: CacheEntry) -> Self {
        match entry {
            CacheEntry::Resolved(record) => Some(record),
            CacheEntry::Unresolved => None,
        }
    }
}

/// Source name -> resolution, optionally backed by a file.
///
/// Not meant for concurrent writers; one instance per run.
#[derive(Debug, Default)]
pub struct ResolutionCache {
    path: Option<PathBuf>,
    entries: BTreeMap<String, CacheEntry>,
}

impl ResolutionCache {
    /// Cache with no backing file; `save` does nothing
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Cache backed by `path`, starting from its contents if the file exists
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let path = path.into();
        let entries = Self::load(&path)?;
        info!(
            "Loaded {} cached names from {}",
            entries.len(),
            path.display()
        );
        Ok(Self {
            path: Some(path),
            entries,
        })
    }

    /// Read a cache file; a missing file is an empty cache
    pub fn load(path: &Path) -> Result<BTreeMap<String, CacheEntry>, CacheError> {
        if !path.exists() {
            debug!("No cache file at {}", path.display());
            return Ok(BTreeMap::new());
        }

        let file = File::open(path).map_err(|source| CacheError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_reader(BufReader::new(file)).map_err(|source| CacheError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, serde_json::Error> {
        Ok(Self {
            path: None,
            entries: serde_json::from_reader(reader)?,
        })
    }

    /// Pretty-printed JSON, two-space indent, sorted keys
    pub fn to_writer<W: Write>(&self, writer: W) -> Result<(), serde_json::Error> {
        serde_json::to_writer_pretty(writer, &self.entries)
    }

    /// Rewrite the whole backing file.
    ///
    /// The new content goes to a temporary file in the same directory which is then
    /// renamed over the old one, so readers never see a half-written cache.
    pub fn save(&self) -> Result<(), CacheError> {
        let Some(path) = &self.path else {
            debug!("In-memory cache, nothing to save");
            return Ok(());
        };

        let write_err = |source| CacheError::Write {
            path: path.clone(),
            source,
        };

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(write_err)?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            self.to_writer(&mut writer)?;
            writer.write_all(b"\n").map_err(write_err)?;
            writer.flush().map_err(write_err)?;
        }
        tmp.persist(path).map_err(|e| write_err(e.error))?;

        info!(
            "Saved {} cached names ({} unresolved) to {}",
            self.entries.len(),
            self.unresolved_count(),
            path.display()
        );
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&CacheEntry> {
        self.entries.get(name)
    }

    /// Record the resolution for `name`, returning any previous entry
    pub fn put(&mut self, name: impl Into<String>, entry: CacheEntry) -> Option<CacheEntry> {
        self.entries.insert(name.into(), entry)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &CacheEntry)> {
        self.entries.iter()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn unresolved_count(&self) -> usize {
        self.entries.values().filter(|e| !e.is_resolved()).count()
    }
}
