//! Durable catalog of known packages (`exists.txt`)
//!
//! The catalog is loaded once at startup and grows by appending one line per
//! new package. Updating an existing entry requires rewriting the whole file
//! because the line format cannot be patched in place.

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::entry::{validate_name, CatalogEntry};
use super::CatalogError;

/// In-memory catalog backed by a line-oriented file
#[derive(Debug, Clone)]
pub struct Catalog {
    /// Location of the durable representation
    path: PathBuf,
    /// Entries keyed by lower-cased name
    entries: HashMap<String, CatalogEntry>,
    /// Highest index observed or assigned
    last_index: u64,
}

impl Catalog {
    /// Create an empty catalog that persists to `path`
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: HashMap::new(),
            last_index: 0,
        }
    }

    /// Load the catalog, degrading to an empty one if the file cannot be read
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match Self::try_load(&path) {
            Ok(catalog) => catalog,
            Err(e) => {
                warn!("Starting with an empty package catalog: {}", e);
                Self::empty(path)
            }
        }
    }

    /// Load the catalog, surfacing read errors
    pub fn try_load(path: &Path) -> Result<Self, CatalogError> {
        let bytes = fs::read(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        // A torn write can split a multi-byte name; keep every intact line
        let content = String::from_utf8_lossy(&bytes);

        let mut catalog = Self::empty(path);
        let mut skipped = 0usize;
        for line in content.lines() {
            match CatalogEntry::parse_line(line) {
                Some(entry) => {
                    catalog.last_index = catalog.last_index.max(entry.index);
                    catalog.entries.insert(entry.key(), entry);
                }
                None if line.trim().is_empty() => {}
                None => skipped += 1,
            }
        }

        debug!(
            "Loaded {} catalog entries from {:?} ({} lines skipped)",
            catalog.entries.len(),
            path,
            skipped
        );
        Ok(catalog)
    }

    /// Path of the durable file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Highest index observed or assigned so far
    pub fn last_index(&self) -> u64 {
        self.last_index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Case-insensitive exact lookup
    pub fn lookup(&self, name: &str) -> Option<&CatalogEntry> {
        self.entries.get(&name.to_lowercase())
    }

    /// All entries in ascending index order
    pub fn entries(&self) -> Vec<&CatalogEntry> {
        let mut entries: Vec<&CatalogEntry> = self.entries.values().collect();
        entries.sort_by_key(|e| e.index);
        entries
    }

    /// Add a new package and append it to the durable file.
    ///
    /// The entry is inserted in memory before the write is attempted; a
    /// failed write is returned as an error but does not undo the insert.
    pub fn add(&mut self, name: &str, downloads: u64) -> Result<CatalogEntry, CatalogError> {
        validate_name(name)?;

        let key = name.to_lowercase();
        if let Some(existing) = self.entries.get(&key) {
            return Err(CatalogError::AlreadyPresent {
                name: existing.name.clone(),
                index: existing.index,
            });
        }

        let index = self
            .last_index
            .checked_add(1)
            .ok_or(CatalogError::IndexExhausted {
                last: self.last_index,
            })?;
        let entry = CatalogEntry::new(index, name, downloads);
        self.last_index = entry.index;
        self.entries.insert(key, entry.clone());

        self.append_line(&entry)?;
        info!("Added {} to the catalog at index {}", entry.name, entry.index);

        Ok(entry)
    }

    /// Update the download count of an existing entry and rewrite the file.
    ///
    /// Returns `false` when the package is not in the catalog.
    pub fn set_downloads(&mut self, name: &str, downloads: u64) -> Result<bool, CatalogError> {
        match self.entries.get_mut(&name.to_lowercase()) {
            Some(entry) => {
                entry.downloads = downloads;
            }
            None => return Ok(false),
        }

        self.rewrite()?;
        Ok(true)
    }

    /// Regenerate the whole file from memory in ascending index order
    pub fn rewrite(&self) -> Result<(), CatalogError> {
        let mut content = String::new();
        for entry in self.entries() {
            content.push_str(&entry.to_line());
            content.push('\n');
        }

        self.ensure_parent()?;
        fs::write(&self.path, content).map_err(|source| self.write_error(source))?;

        debug!("Rewrote catalog {:?} with {} entries", self.path, self.len());
        Ok(())
    }

    fn append_line(&self, entry: &CatalogEntry) -> Result<(), CatalogError> {
        self.ensure_parent()?;

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| self.write_error(source))?;

        let mut line = String::new();
        if !ends_with_newline(&mut file).map_err(|source| self.write_error(source))? {
            line.push('\n');
        }
        line.push_str(&entry.to_line());
        line.push('\n');

        file.write_all(line.as_bytes())
            .and_then(|_| file.sync_data())
            .map_err(|source| self.write_error(source))
    }

    fn ensure_parent(&self) -> Result<(), CatalogError> {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                fs::create_dir_all(parent).map_err(|source| self.write_error(source))
            }
            _ => Ok(()),
        }
    }

    fn write_error(&self, source: std::io::Error) -> CatalogError {
        CatalogError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

/// Whether the file is empty or its last byte is a newline
fn ends_with_newline(file: &mut fs::File) -> std::io::Result<bool> {
    let len = file.metadata()?.len();
    if len == 0 {
        return Ok(true);
    }

    file.seek(SeekFrom::Start(len - 1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}
