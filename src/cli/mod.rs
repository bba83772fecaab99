pub mod app;
pub mod commands;

pub use app::{CatalogCommand, Cli, Commands, InstallArgs, LogLevel};
