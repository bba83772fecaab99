//! Progress and log events emitted during a run
//!
//! The orchestrator reports what it is doing through an [`EventSink`]; sinks
//! only observe and never influence the run.

use std::io::{self, Write};

use tracing::{debug, warn};

use crate::orchestrator::RunSummary;
use crate::suggest::Suggestion;

const PROGRESS_BAR_WIDTH: usize = 40;

/// Something that happened during a run
#[derive(Debug, Clone, PartialEq)]
pub enum InstallEvent {
    /// The batch is about to process `total` packages
    BatchStarted { total: usize },
    Step(String),
    Info(String),
    Success(String),
    Warning(String),
    Error(String),
    /// Ranked alternatives for a package that failed to install
    Suggestions {
        package: String,
        suggestions: Vec<Suggestion>,
    },
    /// `completed` of `total` packages processed
    Progress {
        completed: usize,
        total: usize,
        package: String,
    },
    Summary(RunSummary),
}

impl InstallEvent {
    /// Percentage of the batch done, for progress events
    pub fn percent(&self) -> Option<f64> {
        match self {
            InstallEvent::Progress {
                completed, total, ..
            } if *total > 0 => Some(*completed as f64 / *total as f64 * 100.0),
            InstallEvent::Progress { .. } => Some(100.0),
            _ => None,
        }
    }
}

/// Receives run events
pub trait EventSink {
    fn emit(&mut self, event: InstallEvent);
}

/// Renders events for a person at a terminal
pub struct ConsoleSink<W> {
    out: W,
}

impl ConsoleSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn render(&mut self, event: &InstallEvent) -> io::Result<()> {
        match event {
            InstallEvent::BatchStarted { total } => {
                writeln!(self.out, "\n=== Starting installation ===")?;
                writeln!(self.out, "Packages to install: {total}")?;
            }
            InstallEvent::Step(msg) => {
                let timestamp = chrono::Local::now().format("%H:%M:%S");
                writeln!(self.out, "\n[{timestamp}] 📍 {msg}")?;
            }
            InstallEvent::Info(msg) => writeln!(self.out, "\n ℹ️  {msg}")?,
            InstallEvent::Success(msg) => writeln!(self.out, "\n ✅ {msg}")?,
            InstallEvent::Warning(msg) => writeln!(self.out, "\n ⚠️  {msg}")?,
            InstallEvent::Error(msg) => writeln!(self.out, "\n ❌ {msg}")?,
            InstallEvent::Suggestions { suggestions, .. } => {
                writeln!(self.out, "\n 💡 Similar packages:")?;
                for (i, s) in suggestions.iter().enumerate() {
                    writeln!(
                        self.out,
                        "   {}. {} ({} downloads) - similarity: {:.1}%",
                        i + 1,
                        s.entry.name,
                        s.entry.downloads,
                        s.similarity * 100.0
                    )?;
                }
            }
            InstallEvent::Progress { .. } => {
                let percent = event.percent().unwrap_or(100.0);
                write!(self.out, "\r{}", progress_bar(percent))?;
                self.out.flush()?;
            }
            InstallEvent::Summary(summary) => {
                writeln!(self.out, "\n\n=== Installation summary ===")?;
                writeln!(
                    self.out,
                    "⏱️  Total time: {:.2} seconds",
                    summary.elapsed.as_secs_f64()
                )?;
                writeln!(self.out, "✅ Installed successfully: {}", summary.succeeded)?;
                writeln!(self.out, "❌ Failed: {}", summary.failed)?;
                if summary.cancelled {
                    writeln!(
                        self.out,
                        "⏹️  Cancelled with {} package(s) not attempted",
                        summary.skipped
                    )?;
                }
            }
        }
        Ok(())
    }
}

impl<W: Write> EventSink for ConsoleSink<W> {
    fn emit(&mut self, event: InstallEvent) {
        debug!(?event, "install event");
        if let Err(e) = self.render(&event) {
            warn!("Failed to write progress output: {}", e);
        }
    }
}

/// `[████░░░░] 50.0%` with a fixed-width bar
pub fn progress_bar(percent: f64) -> String {
    let percent = percent.clamp(0.0, 100.0);
    let completed = (PROGRESS_BAR_WIDTH as f64 * percent / 100.0).floor() as usize;
    let remaining = PROGRESS_BAR_WIDTH - completed;
    format!(
        "[{}{}] {:.1}%",
        "█".repeat(completed),
        "░".repeat(remaining),
        percent
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogEntry;
    use std::time::Duration;

    fn rendered(events: Vec<InstallEvent>) -> String {
        let mut sink = ConsoleSink::new(Vec::new());
        for event in events {
            sink.emit(event);
        }
        String::from_utf8(sink.into_inner()).unwrap()
    }

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0.0), format!("[{}] 0.0%", "░".repeat(40)));
        assert_eq!(progress_bar(100.0), format!("[{}] 100.0%", "█".repeat(40)));
        assert_eq!(
            progress_bar(50.0),
            format!("[{}{}] 50.0%", "█".repeat(20), "░".repeat(20))
        );
        assert_eq!(progress_bar(150.0), progress_bar(100.0));
    }

    #[test]
    fn test_progress_percent() {
        let event = InstallEvent::Progress {
            completed: 1,
            total: 3,
            package: "express".to_string(),
        };
        let percent = event.percent().unwrap();
        assert!((percent - 33.333).abs() < 0.01);
        assert_eq!(InstallEvent::Info("x".to_string()).percent(), None);
    }

    #[test]
    fn test_suggestions_show_percentages() {
        let output = rendered(vec![InstallEvent::Suggestions {
            package: "lodash".to_string(),
            suggestions: vec![Suggestion {
                entry: CatalogEntry::new(5, "loadash", 100),
                similarity: 0.7272,
            }],
        }]);

        assert!(output.contains("1. loadash (100 downloads) - similarity: 72.7%"));
    }

    #[test]
    fn test_summary() {
        let output = rendered(vec![InstallEvent::Summary(RunSummary {
            succeeded: 2,
            failed: 1,
            skipped: 0,
            cancelled: false,
            elapsed: Duration::from_millis(1500),
            outcomes: Vec::new(),
        })]);

        assert!(output.contains("Total time: 1.50 seconds"));
        assert!(output.contains("Installed successfully: 2"));
        assert!(output.contains("Failed: 1"));
        assert!(!output.contains("Cancelled"));
    }
}
