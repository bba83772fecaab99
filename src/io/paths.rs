use std::path::{Path, PathBuf};

use crate::Result;

pub const MANIFEST_FILE: &str = "requirements.txt";
pub const CATALOG_FILE: &str = "exists.txt";
pub const CONFIG_FILE: &str = ".reqinstall-config.json";

/// Locations of the files reqinstall reads and writes for a project
#[derive(Debug, Clone)]
pub struct InstallPaths {
    /// Project root (working directory by default)
    pub project_root: PathBuf,
    /// Requirements manifest
    pub manifest: PathBuf,
    /// Known-package catalog
    pub catalog: PathBuf,
    /// Project config with the cached contribution answer
    pub config: PathBuf,
}

impl InstallPaths {
    /// Paths rooted at the current working directory
    pub fn new() -> Result<Self> {
        let current_dir = std::env::current_dir()?;
        Ok(Self::for_project(&current_dir))
    }

    /// Paths rooted at a specific project directory
    pub fn for_project(project_root: &Path) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            manifest: project_root.join(MANIFEST_FILE),
            catalog: project_root.join(CATALOG_FILE),
            config: project_root.join(CONFIG_FILE),
        }
    }

    /// Override the manifest location; relative paths resolve against the project root
    pub fn with_manifest(mut self, manifest: &Path) -> Self {
        self.manifest = self.resolve(manifest);
        self
    }

    /// Override the catalog location; relative paths resolve against the project root
    pub fn with_catalog(mut self, catalog: &Path) -> Self {
        self.catalog = self.resolve(catalog);
        self
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_paths() {
        let project_root = Path::new("/tmp/test-project");
        let paths = InstallPaths::for_project(project_root);

        assert_eq!(paths.manifest, project_root.join("requirements.txt"));
        assert_eq!(paths.catalog, project_root.join("exists.txt"));
        assert_eq!(paths.config, project_root.join(".reqinstall-config.json"));
    }

    #[test]
    fn test_overrides_resolve_against_root() {
        let project_root = Path::new("/tmp/test-project");
        let paths = InstallPaths::for_project(project_root)
            .with_manifest(Path::new("deps/frontend.txt"))
            .with_catalog(Path::new("/var/lib/catalog.txt"));

        assert_eq!(paths.manifest, project_root.join("deps/frontend.txt"));
        assert_eq!(paths.catalog, PathBuf::from("/var/lib/catalog.txt"));
    }

    #[test]
    fn test_current_dir_paths() {
        let paths = InstallPaths::new().unwrap();
        assert!(paths.manifest.ends_with("requirements.txt"));
    }
}
