use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::{CommandHandler, CommandResult};
use crate::catalog::Catalog;
use crate::cli::app::InstallArgs;
use crate::config::{ConfigStore, InstallSettings, ProjectConfig};
use crate::installer::CommandInstaller;
use crate::io::InstallPaths;
use crate::manifest::{Manifest, ManifestError};
use crate::orchestrator::{Orchestrator, RunSummary};
use crate::prompt::{NonInteractive, Prompter, TerminalPrompter};
use crate::report::{ConsoleSink, EventSink, InstallEvent};

/// Exit status used when a second Ctrl-C aborts the run
const INTERRUPTED_EXIT_CODE: i32 = 130;

const MISSING_MANIFEST_HELP: &str = "\
You can create it in one of these ways:
  1. Manually, one package per line:
       express
       lodash
  2. From the dependencies already installed:
       npm list --parseable --depth=0 | sed '1d' | sed 's/.*node_modules\\/\\(.*\\)/\\1/' | sed 's/@.*$//' > requirements.txt
  3. With `reqinstall init`, which writes a commented template";

/// Handler for the `install` command
pub struct InstallCommand {
    pub paths: InstallPaths,
    pub args: InstallArgs,
}

impl InstallCommand {
    pub fn new(paths: InstallPaths, args: InstallArgs) -> Self {
        let mut paths = paths;
        if let Some(manifest) = &args.manifest {
            paths = paths.with_manifest(manifest);
        }
        if let Some(catalog) = &args.catalog {
            paths = paths.with_catalog(catalog);
        }
        Self { paths, args }
    }

    /// Project config with the command-line flags layered on top
    pub fn resolve_settings(&self, config: &ProjectConfig) -> Result<InstallSettings> {
        let mut settings = InstallSettings::from_config(config);

        if let Some(cmd) = &self.args.install_command {
            settings.install_command = cmd.clone();
        }
        if let Some(cmd) = &self.args.verify_command {
            settings.verify_command = cmd.clone();
        }
        if let Some(secs) = self.args.timeout {
            settings.install_timeout = Duration::from_secs(secs);
        }
        if let Some(threshold) = self.args.threshold {
            settings.similarity_threshold = threshold;
        }
        if let Some(hops) = self.args.max_retries {
            settings.max_retry_hops = hops;
        }
        if self.args.no_manifest_update {
            settings.update_manifest = false;
        }
        if self.args.non_interactive {
            settings.interactive = false;
        }

        settings.validate().context("Invalid install settings")
    }

    fn handle_missing_manifest(
        &self,
        manifest: &Manifest,
        prompter: &mut dyn Prompter,
        sink: &mut impl EventSink,
    ) -> Result<CommandResult> {
        let path = manifest.path().display().to_string();
        sink.emit(InstallEvent::Error(format!("{path} does not exist")));
        sink.emit(InstallEvent::Info(MISSING_MANIFEST_HELP.to_string()));

        if prompter.confirm(&format!("Create a template {path} now?"))? {
            manifest
                .create_template(false)
                .with_context(|| format!("Failed to create {path}"))?;
            sink.emit(InstallEvent::Success(format!("Created {path}")));
            sink.emit(InstallEvent::Info(
                "Add your packages (one per line), then run reqinstall again".to_string(),
            ));
        }

        Ok(CommandResult::Warning(format!(
            "No manifest at {path}, nothing installed"
        )))
    }

    fn result_for(&self, summary: &RunSummary) -> CommandResult {
        if summary.cancelled {
            return CommandResult::Error(format!(
                "Installation cancelled, {} package(s) not attempted",
                summary.skipped
            ));
        }

        if summary.has_failures() {
            let failed: Vec<&str> = summary
                .outcomes
                .iter()
                .filter(|o| !o.is_success())
                .map(|o| o.requested())
                .collect();
            let message = format!("Failed to install: {}", failed.join(", "));
            if self.args.strict {
                CommandResult::Error(message)
            } else {
                CommandResult::Warning(message)
            }
        } else {
            CommandResult::Success(None)
        }
    }
}

#[async_trait(?Send)]
impl CommandHandler for InstallCommand {
    async fn execute(&self) -> Result<CommandResult> {
        let config = ConfigStore::load(self.paths.config.clone());
        let settings = self.resolve_settings(config.config())?;
        debug!(?settings, "resolved install settings");

        let mut sink = ConsoleSink::stdout();
        let mut prompter: Box<dyn Prompter> = if settings.interactive {
            Box::new(TerminalPrompter::stdio())
        } else {
            Box::new(NonInteractive)
        };

        let manifest = Manifest::new(self.paths.manifest.clone());
        let packages = match manifest.read() {
            Ok(packages) => packages,
            Err(ManifestError::NotFound(_)) => {
                return self.handle_missing_manifest(&manifest, prompter.as_mut(), &mut sink);
            }
            Err(e) => return Err(e).context("Failed to read the manifest"),
        };

        if packages.is_empty() {
            let message = format!(
                "No packages to install found in {}",
                manifest.path().display()
            );
            sink.emit(InstallEvent::Warning(message.clone()));
            return Ok(CommandResult::Warning(message));
        }

        sink.emit(InstallEvent::Step("Loading the package catalog".to_string()));
        let catalog = Catalog::load(self.paths.catalog.clone());
        sink.emit(InstallEvent::Info(format!(
            "{} known package(s) in {}",
            catalog.len(),
            catalog.path().display()
        )));

        let installer = CommandInstaller::from_settings(&settings)
            .with_working_dir(self.paths.project_root.clone());

        let mut orchestrator = Orchestrator::new(installer, prompter, sink, catalog, config)
            .with_settings(&settings)
            .with_cancel_flag(watch_for_interrupt());
        if settings.update_manifest {
            orchestrator = orchestrator.with_manifest(manifest);
        }

        info!(packages = packages.len(), "Starting install batch");
        let summary = orchestrator.run(&packages).await;
        Ok(self.result_for(&summary))
    }

    fn name(&self) -> &'static str {
        "install"
    }
}

/// Flag set by the first Ctrl-C; a second one exits immediately
fn watch_for_interrupt() -> Arc<AtomicBool> {
    let flag = Arc::new(AtomicBool::new(false));
    let watched = Arc::clone(&flag);

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            warn!("Could not listen for Ctrl-C");
            return;
        }
        watched.store(true, Ordering::SeqCst);
        eprintln!("\nStopping after the current package (press Ctrl-C again to abort)");

        if tokio::signal::ctrl_c().await.is_ok() {
            std::process::exit(INTERRUPTED_EXIT_CODE);
        }
    });

    flag
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::{FailureReason, PackageOutcome};
    use std::path::{Path, PathBuf};

    fn command(args: InstallArgs) -> InstallCommand {
        InstallCommand::new(InstallPaths::for_project(Path::new("/project")), args)
    }

    fn summary(outcomes: Vec<PackageOutcome>) -> RunSummary {
        let failed = outcomes.iter().filter(|o| !o.is_success()).count();
        RunSummary {
            succeeded: outcomes.len() - failed,
            failed,
            skipped: 0,
            cancelled: false,
            elapsed: Duration::ZERO,
            outcomes,
        }
    }

    fn failure(name: &str) -> PackageOutcome {
        PackageOutcome::Failure {
            requested: name.to_string(),
            reason: FailureReason::NoAlternatives {
                error: "exit status 1".to_string(),
            },
        }
    }

    #[test]
    fn test_path_overrides() {
        let cmd = command(InstallArgs {
            manifest: Some(PathBuf::from("deps.txt")),
            catalog: Some(PathBuf::from("/shared/exists.txt")),
            ..Default::default()
        });

        assert_eq!(cmd.paths.manifest, PathBuf::from("/project/deps.txt"));
        assert_eq!(cmd.paths.catalog, PathBuf::from("/shared/exists.txt"));
    }

    #[test]
    fn test_flags_override_project_config() {
        let config = ProjectConfig {
            install_command: Some("yarn add {package}".to_string()),
            similarity_threshold: Some(0.6),
            max_retry_hops: Some(2),
            ..Default::default()
        };
        let cmd = command(InstallArgs {
            threshold: Some(0.3),
            timeout: Some(10),
            non_interactive: true,
            no_manifest_update: true,
            ..Default::default()
        });

        let settings = cmd.resolve_settings(&config).unwrap();
        assert_eq!(settings.install_command, "yarn add {package}");
        assert_eq!(settings.similarity_threshold, 0.3);
        assert_eq!(settings.install_timeout, Duration::from_secs(10));
        assert_eq!(settings.max_retry_hops, 2);
        assert!(!settings.interactive);
        assert!(!settings.update_manifest);
    }

    #[test]
    fn test_invalid_flags_are_rejected() {
        let cmd = command(InstallArgs {
            threshold: Some(1.5),
            ..Default::default()
        });
        assert!(cmd.resolve_settings(&ProjectConfig::default()).is_err());

        let cmd = command(InstallArgs {
            timeout: Some(0),
            ..Default::default()
        });
        assert!(cmd.resolve_settings(&ProjectConfig::default()).is_err());
    }

    #[test]
    fn test_failures_only_fail_the_exit_code_when_strict() {
        let run = summary(vec![
            PackageOutcome::Success {
                requested: "express".to_string(),
                installed: "express".to_string(),
                contributed: false,
            },
            failure("lodahs"),
        ]);

        let lenient = command(InstallArgs::default()).result_for(&run);
        assert_eq!(lenient.exit_code(), 0);
        assert_eq!(lenient.message(), Some("Failed to install: lodahs"));

        let strict = command(InstallArgs {
            strict: true,
            ..Default::default()
        })
        .result_for(&run);
        assert_eq!(strict.exit_code(), 1);
    }

    #[test]
    fn test_cancelled_run_is_an_error() {
        let mut run = summary(vec![]);
        run.cancelled = true;
        run.skipped = 2;

        let result = command(InstallArgs::default()).result_for(&run);
        assert_eq!(result.exit_code(), 1);
        assert_eq!(
            result.message(),
            Some("Installation cancelled, 2 package(s) not attempted")
        );
    }

    #[test]
    fn test_all_succeeded() {
        let run = summary(vec![PackageOutcome::Success {
            requested: "express".to_string(),
            installed: "express".to_string(),
            contributed: true,
        }]);

        assert_eq!(
            command(InstallArgs::default()).result_for(&run),
            CommandResult::Success(None)
        );
    }
}
