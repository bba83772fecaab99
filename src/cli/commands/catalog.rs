//! `catalog` subcommands for inspecting and editing `exists.txt`

use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

use super::{CommandHandler, CommandResult};
use crate::catalog::{Catalog, CatalogEntry};
use crate::cli::app::CatalogCommand as CatalogAction;

/// Handler for the `catalog` command
pub struct CatalogCommand {
    pub catalog: PathBuf,
    pub action: CatalogAction,
}

/// Table row for catalog listings
#[derive(Tabled)]
struct CatalogRow {
    #[tabled(rename = "#")]
    index: u64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Downloads")]
    downloads: u64,
    #[tabled(rename = "URL")]
    url: String,
}

impl From<&CatalogEntry> for CatalogRow {
    fn from(entry: &CatalogEntry) -> Self {
        Self {
            index: entry.index,
            name: entry.name.clone(),
            downloads: entry.downloads,
            url: entry.url.clone(),
        }
    }
}

impl CatalogCommand {
    pub fn new(catalog: PathBuf, action: CatalogAction) -> Self {
        Self { catalog, action }
    }

    fn open(&self) -> Result<Catalog> {
        if !self.catalog.exists() {
            return Ok(Catalog::empty(self.catalog.clone()));
        }
        Catalog::try_load(&self.catalog)
            .with_context(|| format!("Failed to load catalog {}", self.catalog.display()))
    }

    fn list(&self, json: bool) -> Result<CommandResult> {
        let catalog = self.open()?;
        let entries = catalog.entries();

        if json {
            println!("{}", serde_json::to_string_pretty(&entries)?);
            return Ok(CommandResult::Success(None));
        }

        if entries.is_empty() {
            println!("No packages in {}", self.catalog.display());
            return Ok(CommandResult::Success(None));
        }

        println!("{}", render_table(&entries));
        Ok(CommandResult::Success(None))
    }

    fn add(&self, name: &str, downloads: u64) -> Result<CommandResult> {
        let mut catalog = self.open()?;
        let entry = catalog.add(name, downloads)?;
        println!("✅ Added {} as #{}", entry.name, entry.index);
        Ok(CommandResult::Success(None))
    }

    fn set_downloads(&self, name: &str, downloads: u64) -> Result<CommandResult> {
        let mut catalog = self.open()?;
        if catalog.set_downloads(name, downloads)? {
            println!("✅ {name} now has {downloads} downloads");
            Ok(CommandResult::Success(None))
        } else {
            Ok(CommandResult::Error(format!(
                "{name} is not in {}",
                self.catalog.display()
            )))
        }
    }
}

fn render_table(entries: &[&CatalogEntry]) -> String {
    let rows: Vec<CatalogRow> = entries.iter().map(|e| CatalogRow::from(*e)).collect();
    Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()))
        .to_string()
}

#[async_trait(?Send)]
impl CommandHandler for CatalogCommand {
    async fn execute(&self) -> Result<CommandResult> {
        match &self.action {
            CatalogAction::List { json } => self.list(*json),
            CatalogAction::Add { name, downloads } => self.add(name, *downloads),
            CatalogAction::SetDownloads { name, downloads } => {
                self.set_downloads(name, *downloads)
            }
        }
    }

    fn name(&self) -> &'static str {
        "catalog"
    }
}
