//! Batch installation workflow
//!
//! Each package goes through the same states:
//!
//! ```text
//! Pending ─▶ Installing ─┬─▶ Verified ─▶ Success (optionally contributed to the catalog)
//!                        └─▶ InstallFailed ─▶ suggestion lookup
//!                                 ├─ alternate chosen ─▶ Installing(alternate)
//!                                 └─ nothing suitable / declined / retry limit ─▶ Failure
//! ```
//!
//! Retrying with an alternate is bounded by `max_retry_hops`. A failed
//! package never stops the batch.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::catalog::{Catalog, CatalogError};
use crate::config::{ConfigStore, InstallSettings, DEFAULT_MAX_RETRY_HOPS};
use crate::installer::{InstallError, PackageInstaller};
use crate::manifest::Manifest;
use crate::prompt::Prompter;
use crate::report::{EventSink, InstallEvent};
use crate::suggest::SuggestionEngine;

const CONTRIBUTE_QUESTION: &str =
    "Would you like to contribute newly installed packages to the local package catalog?";

/// Terminal result for one requested package
#[derive(Debug, Clone, PartialEq)]
pub enum PackageOutcome {
    Success {
        /// Name from the manifest
        requested: String,
        /// Name that was actually installed (differs after an alternate was chosen)
        installed: String,
        /// Whether the installed package was added to the catalog
        contributed: bool,
    },
    Failure {
        requested: String,
        reason: FailureReason,
    },
}

impl PackageOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, PackageOutcome::Success { .. })
    }

    pub fn requested(&self) -> &str {
        match self {
            PackageOutcome::Success { requested, .. } | PackageOutcome::Failure { requested, .. } => {
                requested
            }
        }
    }
}

/// Why a package ended in failure
#[derive(Debug, Clone, PartialEq)]
pub enum FailureReason {
    /// No catalog name was similar enough to offer
    NoAlternatives { error: String },
    /// Alternates were offered and none was chosen
    Declined { error: String },
    /// Alternates kept failing until the retry bound was reached
    RetryLimit { hops: usize, error: String },
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::NoAlternatives { error } => {
                write!(f, "{error} (no similar package found)")
            }
            FailureReason::Declined { error } => {
                write!(f, "{error} (no alternative selected)")
            }
            FailureReason::RetryLimit { hops, error } => {
                write!(f, "{error} (gave up after {hops} alternative(s))")
            }
        }
    }
}

/// Aggregate result of a batch
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub succeeded: usize,
    pub failed: usize,
    /// Packages not attempted because the run was cancelled
    pub skipped: usize,
    pub cancelled: bool,
    pub elapsed: Duration,
    pub outcomes: Vec<PackageOutcome>,
}

impl RunSummary {
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

/// Per-package state while it is being processed
#[derive(Debug)]
enum PackageState {
    Installing(String),
    Verified(String),
    InstallFailed { package: String, error: InstallError },
}

/// Drives installs, suggestions, retries and catalog contributions
pub struct Orchestrator<I, P, S> {
    installer: I,
    prompter: P,
    sink: S,
    catalog: Catalog,
    config: ConfigStore,
    engine: SuggestionEngine,
    manifest: Option<Manifest>,
    max_retry_hops: usize,
    interactive: bool,
    cancel: Option<Arc<AtomicBool>>,
}

impl<I, P, S> Orchestrator<I, P, S>
where
    I: PackageInstaller,
    P: Prompter,
    S: EventSink,
{
    pub fn new(installer: I, prompter: P, sink: S, catalog: Catalog, config: ConfigStore) -> Self {
        Self {
            installer,
            prompter,
            sink,
            catalog,
            config,
            engine: SuggestionEngine::new(),
            manifest: None,
            max_retry_hops: DEFAULT_MAX_RETRY_HOPS,
            interactive: true,
            cancel: None,
        }
    }

    /// Apply threshold, retry bound and interactivity from resolved settings
    pub fn with_settings(mut self, settings: &InstallSettings) -> Self {
        self.engine = SuggestionEngine::new().with_threshold(settings.similarity_threshold);
        self.max_retry_hops = settings.max_retry_hops;
        self.interactive = settings.interactive;
        self
    }

    /// Rewrite this manifest when an alternate replaces a failed package
    pub fn with_manifest(mut self, manifest: Manifest) -> Self {
        self.manifest = Some(manifest);
        self
    }

    /// Stop before the next package once `flag` is set
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn prompter(&self) -> &P {
        &self.prompter
    }

    /// Install every package in order and report a summary
    pub async fn run(&mut self, packages: &[String]) -> RunSummary {
        let started = Instant::now();
        let total = packages.len();
        self.sink.emit(InstallEvent::BatchStarted { total });

        let mut summary = RunSummary {
            succeeded: 0,
            failed: 0,
            skipped: 0,
            cancelled: false,
            elapsed: Duration::ZERO,
            outcomes: Vec::with_capacity(total),
        };

        for (i, package) in packages.iter().enumerate() {
            if self.is_cancelled() {
                summary.cancelled = true;
                summary.skipped = total - i;
                self.sink.emit(InstallEvent::Warning(format!(
                    "Cancelled, {} package(s) not attempted",
                    summary.skipped
                )));
                break;
            }

            let outcome = self.install_package(package).await;
            match &outcome {
                PackageOutcome::Success { .. } => summary.succeeded += 1,
                PackageOutcome::Failure { requested, reason } => {
                    summary.failed += 1;
                    self.sink.emit(InstallEvent::Error(format!(
                        "Failed to install {requested}: {reason}"
                    )));
                }
            }
            summary.outcomes.push(outcome);

            self.sink.emit(InstallEvent::Progress {
                completed: i + 1,
                total,
                package: package.clone(),
            });
        }

        summary.elapsed = started.elapsed();
        info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            skipped = summary.skipped,
            "Batch finished"
        );
        self.sink.emit(InstallEvent::Summary(summary.clone()));
        summary
    }

    /// Take one requested package to a terminal outcome
    pub async fn install_package(&mut self, requested: &str) -> PackageOutcome {
        let mut hops = 0;
        let mut state = PackageState::Installing(requested.to_string());

        loop {
            debug!(?state, hops, "package state");
            state = match state {
                PackageState::Installing(package) => {
                    self.sink
                        .emit(InstallEvent::Info(format!("Installing {package}")));
                    match self.attempt(&package).await {
                        Ok(()) => PackageState::Verified(package),
                        Err(error) => PackageState::InstallFailed { package, error },
                    }
                }
                PackageState::Verified(package) => {
                    self.sink.emit(InstallEvent::Success(format!(
                        "{package} installed successfully"
                    )));
                    let contributed = self.contribute(&package);
                    return PackageOutcome::Success {
                        requested: requested.to_string(),
                        installed: package,
                        contributed,
                    };
                }
                PackageState::InstallFailed { package, error } => {
                    warn!("Installing {} failed: {}", package, error);
                    self.sink
                        .emit(InstallEvent::Error(format!("Failed to install {package}")));

                    match self.next_alternate(&package, &error, hops) {
                        Ok(alternate) => {
                            hops += 1;
                            PackageState::Installing(alternate)
                        }
                        Err(reason) => {
                            return PackageOutcome::Failure {
                                requested: requested.to_string(),
                                reason,
                            };
                        }
                    }
                }
            };
        }
    }

    /// Install then verify; an unverified install counts as a failure
    async fn attempt(&self, package: &str) -> Result<(), InstallError> {
        self.installer.install(package).await?;

        if self.installer.verify(package).await? {
            Ok(())
        } else {
            Err(InstallError::NotVerified(package.to_string()))
        }
    }

    /// Look up alternates for a failed package and let the user pick one
    fn next_alternate(
        &mut self,
        failed: &str,
        error: &InstallError,
        hops: usize,
    ) -> Result<String, FailureReason> {
        let error = error.to_string();
        let result = self.engine.suggest(&self.catalog, failed);
        let suggestions = result.suggestions().to_vec();

        if suggestions.is_empty() {
            debug!("No alternatives above {} for {}", self.engine.threshold(), failed);
            return Err(FailureReason::NoAlternatives { error });
        }

        self.sink.emit(InstallEvent::Suggestions {
            package: failed.to_string(),
            suggestions: suggestions.clone(),
        });

        if hops >= self.max_retry_hops {
            self.sink.emit(InstallEvent::Warning(format!(
                "Not retrying {failed}: limit of {} alternative(s) reached",
                self.max_retry_hops
            )));
            return Err(FailureReason::RetryLimit { hops, error });
        }

        let choice = match self.prompter.choose_alternate(failed, &suggestions) {
            Ok(choice) => choice,
            Err(e) => {
                warn!("Could not read a choice for {}: {}", failed, e);
                None
            }
        };

        let Some(alternate) = choice.and_then(|i| suggestions.get(i)) else {
            return Err(FailureReason::Declined { error });
        };
        let alternate = alternate.entry.name.clone();

        self.update_manifest(failed, &alternate);
        Ok(alternate)
    }

    /// Replace the failed name in the manifest; failures are only reported
    fn update_manifest(&mut self, failed: &str, alternate: &str) {
        let Some(manifest) = &self.manifest else {
            return;
        };

        match manifest.replace_package(failed, alternate) {
            Ok(0) => debug!("{} not found in manifest, nothing to replace", failed),
            Ok(_) => {
                let path = manifest.path().display().to_string();
                let backup = manifest.backup_path().display().to_string();
                self.sink.emit(InstallEvent::Success(format!(
                    "Updated {path}: {failed} -> {alternate}"
                )));
                self.sink
                    .emit(InstallEvent::Info(format!("Previous version saved to {backup}")));
            }
            Err(e) => {
                warn!("Manifest update failed: {}", e);
                self.sink.emit(InstallEvent::Warning(format!(
                    "Could not update the manifest: {e}"
                )));
            }
        }
    }

    /// Offer a newly installed package to the catalog.
    ///
    /// Packages already in the catalog are skipped. The contribution question
    /// is asked at most once; the answer is cached in the project config.
    fn contribute(&mut self, package: &str) -> bool {
        if self.catalog.lookup(package).is_some() {
            return false;
        }

        if !self.will_contribute() {
            return false;
        }

        match self.catalog.add(package, 0) {
            Ok(entry) => {
                self.sink.emit(InstallEvent::Success(format!(
                    "{} added to the package catalog (#{})",
                    entry.name, entry.index
                )));
                true
            }
            Err(e @ CatalogError::Write { .. }) => {
                warn!("Catalog write failed: {}", e);
                self.sink.emit(InstallEvent::Warning(format!(
                    "{package} was added for this run but not saved: {e}"
                )));
                false
            }
            Err(e) => {
                self.sink.emit(InstallEvent::Warning(format!(
                    "{package} not added to the catalog: {e}"
                )));
                false
            }
        }
    }

    fn will_contribute(&mut self) -> bool {
        if let Some(answer) = self.config.will_contribute() {
            return answer;
        }

        // Unattended runs never record an answer on the user's behalf
        if !self.interactive {
            return false;
        }

        let answer = match self.prompter.confirm(CONTRIBUTE_QUESTION) {
            Ok(answer) => answer,
            Err(e) => {
                warn!("Could not read the contribution answer: {}", e);
                return false;
            }
        };

        if let Err(e) = self.config.set_will_contribute(answer) {
            warn!("Contribution preference not saved: {}", e);
            self.sink.emit(InstallEvent::Warning(format!(
                "Could not save your answer, it applies to this run only: {e}"
            )));
        }
        answer
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }
}
