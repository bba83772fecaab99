use thiserror::Error;

use crate::catalog::CatalogError;
use crate::config::ConfigError;
use crate::installer::InstallError;
use crate::manifest::ManifestError;

#[derive(Error, Debug)]
pub enum ReqInstallError {
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),

    #[error("Install error: {0}")]
    Install(#[from] InstallError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    JsonSerialization(#[from] serde_json::Error),

    #[error("Generic error: {0}")]
    Generic(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ReqInstallError>;
