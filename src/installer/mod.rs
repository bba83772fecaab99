//! External installer and verifier
//!
//! The orchestrator only needs two operations: install a package, and check
//! that it is present afterwards. Both are behind [`PackageInstaller`] so the
//! batch logic never depends on how packages are actually installed.

mod command;

use std::time::Duration;

use async_trait::async_trait;

pub use command::{render_command, CommandInstaller};

/// Errors reported by an installer
#[derive(Debug, thiserror::Error)]
pub enum InstallError {
    #[error("Invalid command template '{template}': {reason}")]
    InvalidCommand { template: String, reason: String },

    #[error("Failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{command}' exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("'{command}' did not finish within {after:?}")]
    Timeout { command: String, after: Duration },

    #[error("Installation of {0} could not be verified")]
    NotVerified(String),
}

/// Performs and checks installs for the orchestrator
#[async_trait]
pub trait PackageInstaller: Send + Sync {
    /// Install a package; any error means the install failed
    async fn install(&self, package: &str) -> Result<(), InstallError>;

    /// Whether the package is present after installing it
    async fn verify(&self, package: &str) -> Result<bool, InstallError>;
}
