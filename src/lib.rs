//! reqinstall - batch package installer with fuzzy-matched alternatives
//!
//! Packages listed in `requirements.txt` are installed one at a time. When
//! an install fails, similar names from the local catalog (`exists.txt`) are
//! offered as replacements, and newly installed packages can be contributed
//! back to that catalog.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod installer;
pub mod io;
pub mod manifest;
pub mod orchestrator;
pub mod prompt;
pub mod report;
pub mod suggest;

pub use error::{ReqInstallError, Result};
