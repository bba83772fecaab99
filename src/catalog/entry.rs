//! Catalog entries and their line representation in `exists.txt`
//!
//! Each entry occupies one line of the form
//! `<index>. [<name>](<url>) - <downloads>`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::CatalogError;

/// Base URL that package names are appended to
pub const PACKAGE_URL_BASE: &str = "https://www.npmjs.org/package/";

static LINE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+)\.\s+\[([^\]]+)\]\(([^)]+)\)\s+-\s+(\d+)")
        .expect("catalog line pattern is a valid regex")
});

/// A package known to the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Position in the catalog, assigned once and never reused
    pub index: u64,
    /// Package name as first seen (case preserved)
    pub name: String,
    /// Reference URL for the package
    pub url: String,
    /// Popularity metric
    pub downloads: u64,
}

impl CatalogEntry {
    /// Build an entry whose URL is derived from the name
    pub fn new(index: u64, name: &str, downloads: u64) -> Self {
        Self {
            index,
            name: name.to_string(),
            url: package_url(name),
            downloads,
        }
    }

    /// Lower-cased lookup key
    pub fn key(&self) -> String {
        self.name.to_lowercase()
    }

    /// Parse one catalog line.
    ///
    /// Returns `None` for anything that does not match the line format,
    /// including an index of zero and numbers too large for `u64`.
    pub fn parse_line(line: &str) -> Option<Self> {
        let caps = LINE_PATTERN.captures(line)?;

        let index: u64 = caps[1].parse().ok()?;
        if index == 0 {
            return None;
        }
        let downloads: u64 = caps[4].parse().ok()?;

        Some(Self {
            index,
            name: caps[2].to_string(),
            url: caps[3].to_string(),
            downloads,
        })
    }

    /// Render the entry as a catalog line, without the trailing newline
    pub fn to_line(&self) -> String {
        format!(
            "{}. [{}]({}) - {}",
            self.index, self.name, self.url, self.downloads
        )
    }
}

/// Reference URL for a package name
pub fn package_url(name: &str) -> String {
    format!("{PACKAGE_URL_BASE}{name}")
}

/// Check that a name can be written to the catalog without breaking the line format
pub fn validate_name(name: &str) -> Result<(), CatalogError> {
    if name.is_empty() {
        return Err(CatalogError::InvalidName {
            name: name.to_string(),
            reason: "name is empty".to_string(),
        });
    }

    if let Some(c) = name
        .chars()
        .find(|c| c.is_whitespace() || matches!(c, '[' | ']' | '(' | ')'))
    {
        return Err(CatalogError::InvalidName {
            name: name.to_string(),
            reason: format!("character {c:?} is not allowed"),
        });
    }

    Ok(())
}
