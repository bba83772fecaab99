//! Requirements manifest (`requirements.txt`)
//!
//! One package name per line. Blank lines and lines starting with `#` are
//! ignored; the remaining order is the install order.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

/// Template written when scaffolding a new manifest
pub const MANIFEST_TEMPLATE: &str = "\
# Packages to install
# One package per line
# Example:
# express
# lodash
# moment
";

/// Errors raised while reading or editing the manifest
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("Manifest {0:?} does not exist")]
    NotFound(PathBuf),

    #[error("Manifest {0:?} already exists")]
    AlreadyExists(PathBuf),

    #[error("Failed to {action} manifest {path:?}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A requirements manifest on disk
#[derive(Debug, Clone)]
pub struct Manifest {
    path: PathBuf,
}

impl Manifest {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Path of the copy taken before the manifest is edited
    pub fn backup_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(".backup");
        PathBuf::from(name)
    }

    /// Read the package names in install order
    pub fn read(&self) -> Result<Vec<String>, ManifestError> {
        if !self.path.exists() {
            return Err(ManifestError::NotFound(self.path.clone()));
        }

        let content = fs::read_to_string(&self.path).map_err(|source| self.io("read", source))?;
        let packages = parse_requirements(&content);
        debug!("Read {} packages from {:?}", packages.len(), self.path);
        Ok(packages)
    }

    /// Write the commented template, refusing to overwrite unless `force`
    pub fn create_template(&self, force: bool) -> Result<(), ManifestError> {
        if self.path.exists() && !force {
            return Err(ManifestError::AlreadyExists(self.path.clone()));
        }

        fs::write(&self.path, MANIFEST_TEMPLATE).map_err(|source| self.io("create", source))
    }

    /// Replace every line equal to `old` (after trimming) with `new`.
    ///
    /// A copy of the current manifest is written to [`Manifest::backup_path`]
    /// first. Returns the number of lines replaced.
    pub fn replace_package(&self, old: &str, new: &str) -> Result<usize, ManifestError> {
        fs::copy(&self.path, self.backup_path()).map_err(|source| self.io("back up", source))?;

        let content = fs::read_to_string(&self.path).map_err(|source| self.io("read", source))?;

        let mut replaced = 0;
        let updated: Vec<String> = content
            .split('\n')
            .map(|line| {
                if line.trim() == old {
                    replaced += 1;
                    line.replacen(old, new, 1)
                } else {
                    line.to_string()
                }
            })
            .collect();

        fs::write(&self.path, updated.join("\n")).map_err(|source| self.io("update", source))?;
        Ok(replaced)
    }

    fn io(&self, action: &'static str, source: std::io::Error) -> ManifestError {
        ManifestError::Io {
            action,
            path: self.path.clone(),
            source,
        }
    }
}

/// Trimmed, non-empty, non-comment lines in order
pub fn parse_requirements(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect()
}
