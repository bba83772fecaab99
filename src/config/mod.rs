//! Project configuration (`.reqinstall-config.json`)
//!
//! Settings are layered: built-in defaults, then the project config file,
//! then command-line overrides applied by the caller. The same file caches
//! the one-time answer to "contribute new packages to the catalog?".

mod settings;

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub use settings::{
    InstallSettings, DEFAULT_INSTALL_COMMAND, DEFAULT_INSTALL_TIMEOUT_SECS,
    DEFAULT_MAX_RETRY_HOPS, DEFAULT_VERIFY_COMMAND, DEFAULT_VERIFY_TIMEOUT_SECS,
    PACKAGE_PLACEHOLDER,
};

/// Errors raised while reading, writing or validating configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write config {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid setting: {0}")]
    Invalid(String),
}

/// Contents of the project config file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    /// Cached answer to the contribution question; `None` until asked
    #[serde(default)]
    pub will_contribute: Option<bool>,

    /// Install command template, e.g. `npm install {package}`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_command: Option<String>,

    /// Verification command template, e.g. `npm list {package} --depth=0`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verify_command: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_timeout_secs: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verify_timeout_secs: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity_threshold: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retry_hops: Option<usize>,

    /// Fields this version does not know about, kept on save
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Project config bound to its file
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    config: ProjectConfig,
}

impl ConfigStore {
    /// Load the config, treating an unreadable file as an empty config
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let config = match Self::try_load(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!("Ignoring project config: {}", e);
                ProjectConfig::default()
            }
        };
        Self { path, config }
    }

    /// Load the config; a missing file is an empty config
    pub fn try_load(path: &Path) -> Result<ProjectConfig, ConfigError> {
        if !path.exists() {
            return Ok(ProjectConfig::default());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Wrap an in-memory config without reading anything
    pub fn with_config(path: impl Into<PathBuf>, config: ProjectConfig) -> Self {
        Self {
            path: path.into(),
            config,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    /// Cached contribution answer, if the question was already answered
    pub fn will_contribute(&self) -> Option<bool> {
        self.config.will_contribute
    }

    /// Cache the contribution answer for this run and persist it.
    ///
    /// The in-memory answer is kept even if the write fails.
    pub fn set_will_contribute(&mut self, answer: bool) -> Result<(), ConfigError> {
        self.config.will_contribute = Some(answer);
        self.save()
    }

    /// Write the config as pretty JSON
    pub fn save(&self) -> Result<(), ConfigError> {
        let content =
            serde_json::to_string_pretty(&self.config).map_err(|source| ConfigError::Parse {
                path: self.path.clone(),
                source,
            })?;

        fs::write(&self.path, content).map_err(|source| ConfigError::Write {
            path: self.path.clone(),
            source,
        })?;

        debug!("Saved project config to {:?}", self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_config_is_unanswered() {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::load(dir.path().join(".reqinstall-config.json"));

        assert_eq!(store.will_contribute(), None);
        assert_eq!(store.config(), &ProjectConfig::default());
    }

    #[test]
    fn test_corrupt_config_falls_back_to_default() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".reqinstall-config.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            ConfigStore::try_load(&path),
            Err(ConfigError::Parse { .. })
        ));
        assert_eq!(ConfigStore::load(&path).will_contribute(), None);
    }

    #[test]
    fn test_answer_is_persisted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".reqinstall-config.json");

        let mut store = ConfigStore::load(&path);
        store.set_will_contribute(true).unwrap();

        let reloaded = ConfigStore::load(&path);
        assert_eq!(reloaded.will_contribute(), Some(true));
    }

    #[test]
    fn test_unanswered_serializes_as_null() {
        let json = serde_json::to_value(ProjectConfig::default()).unwrap();
        assert_eq!(json, serde_json::json!({ "willContribute": null }));
    }

    #[test]
    fn test_save_preserves_unknown_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".reqinstall-config.json");
        fs::write(
            &path,
            r#"{ "willContribute": null, "installCommand": "pnpm add {package}", "team": "web" }"#,
        )
        .unwrap();

        let mut store = ConfigStore::load(&path);
        assert_eq!(
            store.config().install_command.as_deref(),
            Some("pnpm add {package}")
        );
        store.set_will_contribute(false).unwrap();

        let saved: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved["willContribute"], serde_json::json!(false));
        assert_eq!(saved["installCommand"], serde_json::json!("pnpm add {package}"));
        assert_eq!(saved["team"], serde_json::json!("web"));
    }

    #[test]
    fn test_failed_save_keeps_answer_in_memory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing-dir").join("config.json");

        let mut store = ConfigStore::load(&path);
        assert!(store.set_will_contribute(true).is_err());
        assert_eq!(store.will_contribute(), Some(true));
    }
}
