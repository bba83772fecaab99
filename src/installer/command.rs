//! Installer backed by external commands (npm by default)
//!
//! Commands are split with `shell-words` and spawned directly, without a
//! shell, so package names are never interpreted by one.

use std::path::PathBuf;
use std::process::{Output, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::{InstallError, PackageInstaller};
use crate::config::{InstallSettings, PACKAGE_PLACEHOLDER};

/// Runs configurable install and verify commands
#[derive(Debug, Clone)]
pub struct CommandInstaller {
    install_command: String,
    verify_command: String,
    install_timeout: Duration,
    verify_timeout: Duration,
    working_dir: Option<PathBuf>,
}

impl CommandInstaller {
    pub fn from_settings(settings: &InstallSettings) -> Self {
        Self {
            install_command: settings.install_command.clone(),
            verify_command: settings.verify_command.clone(),
            install_timeout: settings.install_timeout,
            verify_timeout: settings.verify_timeout,
            working_dir: None,
        }
    }

    /// Run commands from `dir` instead of the current directory
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    async fn run(
        &self,
        template: &str,
        package: &str,
        timeout: Duration,
    ) -> Result<Output, InstallError> {
        let argv = render_command(template, package)?;
        let shown = argv.join(" ");
        debug!("Running '{}'", shown);

        let mut cmd = Command::new(&argv[0]);
        cmd.args(&argv[1..])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        let child = cmd.spawn().map_err(|source| InstallError::Spawn {
            program: argv[0].clone(),
            source,
        })?;

        match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(output) => output.map_err(|source| InstallError::Spawn {
                program: argv[0].clone(),
                source,
            }),
            Err(_) => Err(InstallError::Timeout {
                command: shown,
                after: timeout,
            }),
        }
    }
}

#[async_trait]
impl PackageInstaller for CommandInstaller {
    async fn install(&self, package: &str) -> Result<(), InstallError> {
        let output = self
            .run(&self.install_command, package, self.install_timeout)
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(InstallError::CommandFailed {
                command: render_command(&self.install_command, package)?.join(" "),
                status: output.status.to_string(),
                stderr: stderr.trim().to_string(),
            });
        }

        Ok(())
    }

    async fn verify(&self, package: &str) -> Result<bool, InstallError> {
        let output = self
            .run(&self.verify_command, package, self.verify_timeout)
            .await?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(output.status.success() && stdout.contains(package))
    }
}

/// Split a command template and substitute the package name.
///
/// Every `{package}` occurrence is replaced; a template without the
/// placeholder gets the package appended as the last argument.
pub fn render_command(template: &str, package: &str) -> Result<Vec<String>, InstallError> {
    let words = shell_words::split(template).map_err(|e| InstallError::InvalidCommand {
        template: template.to_string(),
        reason: e.to_string(),
    })?;

    if words.is_empty() {
        return Err(InstallError::InvalidCommand {
            template: template.to_string(),
            reason: "command is empty".to_string(),
        });
    }

    let has_placeholder = words.iter().any(|w| w.contains(PACKAGE_PLACEHOLDER));
    let mut argv: Vec<String> = words
        .into_iter()
        .map(|w| w.replace(PACKAGE_PLACEHOLDER, package))
        .collect();
    if !has_placeholder {
        argv.push(package.to_string());
    }

    Ok(argv)
}
