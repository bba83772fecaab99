use std::time::Duration;

use super::{ConfigError, ProjectConfig};
use crate::suggest::DEFAULT_THRESHOLD;

/// Placeholder replaced by the package name in command templates
pub const PACKAGE_PLACEHOLDER: &str = "{package}";

pub const DEFAULT_INSTALL_COMMAND: &str = "npm install {package}";
pub const DEFAULT_VERIFY_COMMAND: &str = "npm list {package} --depth=0";
pub const DEFAULT_INSTALL_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_VERIFY_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_MAX_RETRY_HOPS: usize = 1;

/// Upper bound on alternate retries, whatever the configuration says
const RETRY_HOPS_CEILING: usize = 3;

/// Resolved settings for an install run
#[derive(Debug, Clone, PartialEq)]
pub struct InstallSettings {
    /// Command template used to install a package
    pub install_command: String,
    /// Command template used to check that a package is present
    pub verify_command: String,
    pub install_timeout: Duration,
    pub verify_timeout: Duration,
    /// Similarity a catalog name must exceed to be offered
    pub similarity_threshold: f64,
    /// How many times a failed package may be retried with an alternate
    pub max_retry_hops: usize,
    /// Rewrite the manifest when an alternate is chosen
    pub update_manifest: bool,
    /// Ask the user questions; when false every question is declined
    pub interactive: bool,
}

impl Default for InstallSettings {
    fn default() -> Self {
        Self {
            install_command: DEFAULT_INSTALL_COMMAND.to_string(),
            verify_command: DEFAULT_VERIFY_COMMAND.to_string(),
            install_timeout: Duration::from_secs(DEFAULT_INSTALL_TIMEOUT_SECS),
            verify_timeout: Duration::from_secs(DEFAULT_VERIFY_TIMEOUT_SECS),
            similarity_threshold: DEFAULT_THRESHOLD,
            max_retry_hops: DEFAULT_MAX_RETRY_HOPS,
            update_manifest: true,
            interactive: true,
        }
    }
}

impl InstallSettings {
    /// Defaults overlaid with whatever the project config sets
    pub fn from_config(config: &ProjectConfig) -> Self {
        let mut settings = Self::default();

        if let Some(cmd) = &config.install_command {
            settings.install_command = cmd.clone();
        }
        if let Some(cmd) = &config.verify_command {
            settings.verify_command = cmd.clone();
        }
        if let Some(secs) = config.install_timeout_secs {
            settings.install_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = config.verify_timeout_secs {
            settings.verify_timeout = Duration::from_secs(secs);
        }
        if let Some(threshold) = config.similarity_threshold {
            settings.similarity_threshold = threshold;
        }
        if let Some(hops) = config.max_retry_hops {
            settings.max_retry_hops = hops;
        }

        settings
    }

    /// Check the settings and clamp the retry bound
    pub fn validate(mut self) -> Result<Self, ConfigError> {
        if !(0.0..1.0).contains(&self.similarity_threshold) {
            return Err(ConfigError::Invalid(format!(
                "similarity threshold must be in [0, 1), got {}",
                self.similarity_threshold
            )));
        }

        for (label, template) in [
            ("install command", &self.install_command),
            ("verify command", &self.verify_command),
        ] {
            let words = shell_words::split(template)
                .map_err(|e| ConfigError::Invalid(format!("{label} '{template}': {e}")))?;
            if words.is_empty() {
                return Err(ConfigError::Invalid(format!("{label} is empty")));
            }
        }

        if self.install_timeout.is_zero() || self.verify_timeout.is_zero() {
            return Err(ConfigError::Invalid("timeouts must be positive".to_string()));
        }

        self.max_retry_hops = self.max_retry_hops.min(RETRY_HOPS_CEILING);
        Ok(self)
    }
}
