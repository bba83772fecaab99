use anyhow::Result;
use clap::Parser;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use reqinstall::{
    cli::commands::{
        catalog::CatalogCommand, init::InitCommand, install::InstallCommand,
        suggest::SuggestCommand, CommandHandler, CommandResult,
    },
    cli::{Cli, Commands, LogLevel},
    io::InstallPaths,
    manifest::Manifest,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    initialize_tracing(cli.log_level);

    let paths = match &cli.project_dir {
        Some(dir) => InstallPaths::for_project(dir),
        None => InstallPaths::new()?,
    };
    debug!(?paths, "project paths");

    let command = cli.command.unwrap_or_default();
    debug!(command = command.name(), "dispatching");
    let handler: Box<dyn CommandHandler> = match command {
        Commands::Install(args) => Box::new(InstallCommand::new(paths, args)),
        Commands::Init { manifest, force } => {
            let paths = match manifest {
                Some(path) => paths.with_manifest(&path),
                None => paths,
            };
            Box::new(InitCommand::new(Manifest::new(paths.manifest), force))
        }
        Commands::Suggest {
            name,
            threshold,
            catalog,
            json,
        } => {
            let paths = match catalog {
                Some(path) => paths.with_catalog(&path),
                None => paths,
            };
            Box::new(SuggestCommand::new(paths.catalog, name, threshold, json))
        }
        Commands::Catalog { catalog, command } => {
            let paths = match catalog {
                Some(path) => paths.with_catalog(&path),
                None => paths,
            };
            Box::new(CatalogCommand::new(paths.catalog, command))
        }
    };

    let result = handler.execute().await;
    match result {
        Ok(CommandResult::Success(msg)) => {
            if let Some(msg) = msg {
                println!("{msg}");
            }
            Ok(())
        }
        Ok(CommandResult::Warning(msg)) => {
            eprintln!("⚠️  {msg}");
            Ok(())
        }
        Ok(result @ CommandResult::Error(_)) => {
            let msg = result.message().unwrap_or_default();
            error!(command = handler.name(), "{}", msg);
            eprintln!("❌ {msg}");
            std::process::exit(result.exit_code());
        }
        Err(e) => {
            error!(command = handler.name(), "Command failed: {:#}", e);
            Err(e)
        }
    }
}

/// Initialize the tracing subscriber; logs always go to stderr
fn initialize_tracing(log_level: LogLevel) {
    // RUST_LOG wins over --log-level when set
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_filter_directive()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
