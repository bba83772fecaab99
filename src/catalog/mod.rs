//! Local catalog of previously seen packages
//!
//! The catalog is the source of alternative names when an install fails.
//! It lives in `exists.txt` next to the manifest:
//!
//! ```text
//! 1. [express](https://www.npmjs.org/package/express) - 3400
//! 2. [lodash](https://www.npmjs.org/package/lodash) - 1200
//! ```
//!
//! Lines that do not match this format are ignored when loading, so the
//! file can carry headers or survive a torn trailing write.

mod entry;
mod store;

use std::path::PathBuf;

pub use entry::{package_url, validate_name, CatalogEntry, PACKAGE_URL_BASE};
pub use store::Catalog;

/// Errors raised by catalog reads and mutations
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to read catalog {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write catalog {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Package '{name}' is already in the catalog at index {index}")]
    AlreadyPresent { name: String, index: u64 },

    #[error("Catalog index space exhausted after index {last}")]
    IndexExhausted { last: u64 },

    #[error("Invalid package name '{name}': {reason}")]
    InvalidName { name: String, reason: String },
}
