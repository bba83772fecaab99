use std::path::PathBuf;

use anyhow::{bail, Result};
use async_trait::async_trait;

use super::{CommandHandler, CommandResult};
use crate::catalog::Catalog;
use crate::suggest::{SuggestionEngine, SuggestionResult, DEFAULT_THRESHOLD};

/// Handler for the `suggest` command
pub struct SuggestCommand {
    pub catalog: PathBuf,
    pub name: String,
    pub threshold: Option<f64>,
    pub json: bool,
}

impl SuggestCommand {
    pub fn new(catalog: PathBuf, name: String, threshold: Option<f64>, json: bool) -> Self {
        Self {
            catalog,
            name,
            threshold,
            json,
        }
    }

    fn render_text(&self, result: &SuggestionResult) -> String {
        if let Some(entry) = result.exact() {
            return format!(
                "{} is in the catalog (#{}, {} downloads)\n{}",
                entry.name, entry.index, entry.downloads, entry.url
            );
        }

        let suggestions = result.suggestions();
        if suggestions.is_empty() {
            return format!("No similar package found for {}", self.name);
        }

        let mut out = format!("Packages similar to {}:", self.name);
        for (i, s) in suggestions.iter().enumerate() {
            out.push_str(&format!(
                "\n  {}. {} ({} downloads) - similarity: {:.1}%",
                i + 1,
                s.entry.name,
                s.entry.downloads,
                s.similarity * 100.0
            ));
        }
        out
    }

    fn render_json(&self, result: &SuggestionResult) -> Result<String> {
        let value = serde_json::json!({
            "query": self.name,
            "exact": result.exact(),
            "suggestions": result.suggestions(),
        });
        Ok(serde_json::to_string_pretty(&value)?)
    }
}

#[async_trait(?Send)]
impl CommandHandler for SuggestCommand {
    async fn execute(&self) -> Result<CommandResult> {
        let threshold = self.threshold.unwrap_or(DEFAULT_THRESHOLD);
        if !(0.0..1.0).contains(&threshold) {
            bail!("Threshold must be in [0, 1), got {threshold}");
        }

        let catalog = Catalog::load(self.catalog.clone());
        let result = SuggestionEngine::new()
            .with_threshold(threshold)
            .suggest(&catalog, &self.name);

        if self.json {
            println!("{}", self.render_json(&result)?);
        } else {
            println!("{}", self.render_text(&result));
        }
        Ok(CommandResult::Success(None))
    }

    fn name(&self) -> &'static str {
        "suggest"
    }
}
