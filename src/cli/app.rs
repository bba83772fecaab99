use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// reqinstall: install packages from requirements.txt with fuzzy-matched fallbacks
#[derive(Parser, Debug)]
#[command(name = "reqinstall")]
#[command(version)]
#[command(about = "Install packages from requirements.txt with fuzzy-matched fallbacks")]
#[command(
    long_about = "Installs every package listed in requirements.txt, verifies each install, and when one fails offers similar names from the local package catalog (exists.txt)."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Project directory holding requirements.txt, exists.txt and the config file
    #[arg(long, global = true)]
    pub project_dir: Option<PathBuf>,

    /// Set log level
    #[arg(long, value_enum, default_value = "warn", global = true)]
    pub log_level: LogLevel,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Install every package in the manifest (default command)
    Install(InstallArgs),

    /// Create a template requirements.txt
    Init {
        /// Manifest path (defaults to requirements.txt in the project directory)
        #[arg(long)]
        manifest: Option<PathBuf>,

        /// Overwrite an existing manifest
        #[arg(short, long)]
        force: bool,
    },

    /// Show the catalog match or closest alternatives for a package name
    Suggest {
        /// Package name to look up
        name: String,

        /// Similarity a name must exceed to be suggested
        #[arg(long)]
        threshold: Option<f64>,

        /// Catalog path (defaults to exists.txt in the project directory)
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Inspect or edit the package catalog
    Catalog {
        /// Catalog path (defaults to exists.txt in the project directory)
        #[arg(long)]
        catalog: Option<PathBuf>,

        #[command(subcommand)]
        command: CatalogCommand,
    },
}

#[derive(Args, Debug, Default, Clone)]
pub struct InstallArgs {
    /// Manifest path (defaults to requirements.txt in the project directory)
    #[arg(long)]
    pub manifest: Option<PathBuf>,

    /// Catalog path (defaults to exists.txt in the project directory)
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Never prompt; failed packages are not replaced and nothing is contributed
    #[arg(long)]
    pub non_interactive: bool,

    /// How many alternates may be tried for one package (at most 3)
    #[arg(long)]
    pub max_retries: Option<usize>,

    /// Similarity a catalog name must exceed to be suggested
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Install command template, e.g. "npm install {package}"
    #[arg(long)]
    pub install_command: Option<String>,

    /// Verification command template, e.g. "npm list {package} --depth=0"
    #[arg(long)]
    pub verify_command: Option<String>,

    /// Timeout in seconds for each install command
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Do not rewrite the manifest when an alternate is chosen
    #[arg(long)]
    pub no_manifest_update: bool,

    /// Exit with a non-zero status when any package fails
    #[arg(long)]
    pub strict: bool,
}

#[derive(Subcommand, Debug)]
pub enum CatalogCommand {
    /// List known packages
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Add a package to the catalog
    Add {
        /// Package name
        name: String,

        /// Initial download count
        #[arg(long, default_value_t = 0)]
        downloads: u64,
    },

    /// Update the download count of a known package
    SetDownloads {
        /// Package name (case-insensitive)
        name: String,

        /// New download count
        downloads: u64,
    },
}

/// Log levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_filter_directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl Commands {
    /// Get the command name as a string
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Install(_) => "install",
            Commands::Init { .. } => "init",
            Commands::Suggest { .. } => "suggest",
            Commands::Catalog { .. } => "catalog",
        }
    }
}

impl Default for Commands {
    fn default() -> Self {
        Commands::Install(InstallArgs::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_defaults_to_install() {
        let cli = Cli::parse_from(["reqinstall"]);

        assert!(cli.command.is_none());
        assert_eq!(cli.command.unwrap_or_default().name(), "install");
        assert_eq!(cli.log_level, LogLevel::Warn);
    }

    #[test]
    fn test_install_flags() {
        let cli = Cli::parse_from([
            "reqinstall",
            "install",
            "--non-interactive",
            "--max-retries",
            "2",
            "--threshold",
            "0.5",
            "--install-command",
            "pnpm add {package}",
            "--strict",
        ]);

        match cli.command {
            Some(Commands::Install(args)) => {
                assert!(args.non_interactive);
                assert_eq!(args.max_retries, Some(2));
                assert_eq!(args.threshold, Some(0.5));
                assert_eq!(args.install_command.as_deref(), Some("pnpm add {package}"));
                assert!(args.strict);
                assert!(!args.no_manifest_update);
                assert_eq!(args.manifest, None);
            }
            _ => panic!("Wrong command parsed"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "reqinstall",
            "suggest",
            "lodahs",
            "--project-dir",
            "/tmp/app",
            "--log-level",
            "debug",
        ]);

        assert_eq!(cli.project_dir, Some(PathBuf::from("/tmp/app")));
        assert_eq!(cli.log_level, LogLevel::Debug);
        match cli.command {
            Some(Commands::Suggest {
                name,
                threshold,
                json,
                ..
            }) => {
                assert_eq!(name, "lodahs");
                assert_eq!(threshold, None);
                assert!(!json);
            }
            _ => panic!("Wrong command parsed"),
        }
    }

    #[test]
    fn test_catalog_subcommands() {
        let cli = Cli::parse_from(["reqinstall", "catalog", "set-downloads", "Lodash", "42"]);

        match cli.command {
            Some(Commands::Catalog {
                command: CatalogCommand::SetDownloads { name, downloads },
                catalog,
            }) => {
                assert_eq!(name, "Lodash");
                assert_eq!(downloads, 42);
                assert_eq!(catalog, None);
            }
            _ => panic!("Wrong command parsed"),
        }

        let cli = Cli::parse_from(["reqinstall", "catalog", "add", "axios"]);
        match cli.command {
            Some(Commands::Catalog {
                command: CatalogCommand::Add { name, downloads },
                ..
            }) => {
                assert_eq!(name, "axios");
                assert_eq!(downloads, 0);
            }
            _ => panic!("Wrong command parsed"),
        }
    }

    #[test]
    fn test_command_names() {
        let list = Commands::Catalog {
            catalog: None,
            command: CatalogCommand::List { json: false },
        };
        assert_eq!(list.name(), "catalog");
        assert_eq!(Commands::default().name(), "install");
    }
}
