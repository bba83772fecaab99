//! Alternative package suggestions
//!
//! Given a requested name, the engine either finds the package in the
//! catalog (case-insensitive) or ranks every catalog name by similarity and
//! returns a short list of the closest ones.

pub mod similarity;

use serde::Serialize;

use crate::catalog::{Catalog, CatalogEntry};

/// Minimum similarity a candidate must exceed to be suggested
pub const DEFAULT_THRESHOLD: f64 = 0.4;

/// Maximum number of suggestions returned
pub const MAX_SUGGESTIONS: usize = 3;

/// A ranked alternative
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub entry: CatalogEntry,
    pub similarity: f64,
}

/// Outcome of a suggestion lookup
#[derive(Debug, Clone, PartialEq)]
pub enum SuggestionResult {
    /// The name is in the catalog
    Exact(CatalogEntry),
    /// Closest catalog names, best first; may be empty
    Suggestions(Vec<Suggestion>),
}

impl SuggestionResult {
    /// 1 for an exact match, otherwise the top score (0 when nothing qualified)
    pub fn best_similarity(&self) -> f64 {
        match self {
            SuggestionResult::Exact(_) => 1.0,
            SuggestionResult::Suggestions(list) => list.first().map_or(0.0, |s| s.similarity),
        }
    }

    pub fn exact(&self) -> Option<&CatalogEntry> {
        match self {
            SuggestionResult::Exact(entry) => Some(entry),
            SuggestionResult::Suggestions(_) => None,
        }
    }

    /// Ranked alternatives; empty for an exact match
    pub fn suggestions(&self) -> &[Suggestion] {
        match self {
            SuggestionResult::Exact(_) => &[],
            SuggestionResult::Suggestions(list) => list,
        }
    }
}

/// Ranks catalog names against a requested package name
#[derive(Debug, Clone)]
pub struct SuggestionEngine {
    threshold: f64,
    limit: usize,
}

impl Default for SuggestionEngine {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            limit: MAX_SUGGESTIONS,
        }
    }
}

impl SuggestionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the similarity a candidate must strictly exceed
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Look up `name`, falling back to ranked alternatives
    pub fn suggest(&self, catalog: &Catalog, name: &str) -> SuggestionResult {
        let query = name.to_lowercase();

        if let Some(entry) = catalog.lookup(&query) {
            return SuggestionResult::Exact(entry.clone());
        }

        // Rank in index order so ties resolve to the older entry
        let entries = catalog.entries();
        let keys: Vec<String> = entries.iter().map(|e| e.key()).collect();

        let suggestions = similarity::best_matches(&query, keys.iter().map(String::as_str))
            .into_iter()
            .filter(|(_, score)| *score > self.threshold)
            .take(self.limit)
            .filter_map(|(key, score)| {
                catalog.lookup(key).map(|entry| Suggestion {
                    entry: entry.clone(),
                    similarity: score,
                })
            })
            .collect();

        SuggestionResult::Suggestions(suggestions)
    }
}

/// Suggest alternatives for `name` with an explicit threshold
pub fn suggest(catalog: &Catalog, name: &str, threshold: f64) -> SuggestionResult {
    SuggestionEngine::new()
        .with_threshold(threshold)
        .suggest(catalog, name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn catalog_with(dir: &TempDir, lines: &str) -> Catalog {
        let path = dir.path().join("exists.txt");
        fs::write(&path, lines).unwrap();
        Catalog::load(path)
    }

    const POPULAR: &str = "\
1. [express](https://www.npmjs.org/package/express) - 100
2. [lodash](https://www.npmjs.org/package/lodash) - 90
3. [lodash-es](https://www.npmjs.org/package/lodash-es) - 80
4. [lodash.merge](https://www.npmjs.org/package/lodash.merge) - 70
5. [loadash](https://www.npmjs.org/package/loadash) - 100
6. [moment](https://www.npmjs.org/package/moment) - 60
7. [Axios](https://www.npmjs.org/package/Axios) - 50
";

    #[test]
    fn test_exact_match_ignores_case_and_threshold() {
        let dir = TempDir::new().unwrap();
        let catalog = catalog_with(&dir, POPULAR);

        for threshold in [0.0, 0.4, 0.99, 2.0] {
            let result = suggest(&catalog, "AXIOS", threshold);
            assert_eq!(result.exact().map(|e| e.name.as_str()), Some("Axios"));
            assert!(result.suggestions().is_empty());
            assert_eq!(result.best_similarity(), 1.0);
        }
    }

    #[test]
    fn test_suggestions_are_bounded_sorted_and_above_threshold() {
        let dir = TempDir::new().unwrap();
        let catalog = catalog_with(&dir, POPULAR);

        for threshold in [0.0, 0.2, 0.4, 0.6] {
            let result = suggest(&catalog, "lodahs", threshold);
            let list = result.suggestions();

            assert!(result.exact().is_none());
            assert!(list.len() <= MAX_SUGGESTIONS);
            assert!(list.iter().all(|s| s.similarity > threshold));
            assert!(list.windows(2).all(|w| w[0].similarity >= w[1].similarity));
        }
    }

    #[test]
    fn test_misspelled_catalog_entry_is_top_suggestion() {
        let dir = TempDir::new().unwrap();
        let catalog = catalog_with(
            &dir,
            "1. [express](https://www.npmjs.org/package/express) - 1\n\
             5. [loadash](https://www.npmjs.org/package/loadash) - 100\n",
        );

        let result = suggest(&catalog, "lodash", DEFAULT_THRESHOLD);
        let top = &result.suggestions()[0];
        assert_eq!(top.entry.name, "loadash");
        assert_eq!(top.entry.index, 5);
        assert_eq!(top.entry.downloads, 100);
        assert!(top.similarity > DEFAULT_THRESHOLD);
        assert_eq!(result.best_similarity(), top.similarity);
    }

    #[test]
    fn test_no_candidate_above_threshold() {
        let dir = TempDir::new().unwrap();
        let catalog = catalog_with(&dir, POPULAR);

        let result = suggest(&catalog, "leftpad", DEFAULT_THRESHOLD);
        assert!(result.exact().is_none());
        assert!(result.suggestions().is_empty());
        assert_eq!(result.best_similarity(), 0.0);
    }

    #[test]
    fn test_ties_follow_catalog_order() {
        let dir = TempDir::new().unwrap();
        let catalog = catalog_with(
            &dir,
            "2. [xab](https://www.npmjs.org/package/xab) - 0\n\
             1. [abx](https://www.npmjs.org/package/abx) - 0\n",
        );

        let result = suggest(&catalog, "ab", 0.1);
        let names: Vec<&str> = result
            .suggestions()
            .iter()
            .map(|s| s.entry.name.as_str())
            .collect();
        assert_eq!(names, vec!["abx", "xab"]);
    }

    #[test]
    fn test_empty_catalog_has_no_suggestions() {
        let dir = TempDir::new().unwrap();
        let catalog = Catalog::load(dir.path().join("missing.txt"));

        let result = SuggestionEngine::new().suggest(&catalog, "express");
        assert_eq!(result, SuggestionResult::Suggestions(Vec::new()));
    }
}
