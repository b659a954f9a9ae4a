use std::sync::Arc;
use std::time::Duration;

use futures_util::future::{join_all, try_join_all};
use rosterwatch_core::{filter_candidates, CategoryResultSet, ExclusionSet, DEFAULT_QUIET_INTERVAL};
use rosterwatch_logging::{rw_debug, rw_warn};

use crate::source::{LeaderSource, NameSource};
use crate::SourceError;

#[derive(Debug, Clone)]
pub struct SearchSettings {
    pub quiet_interval: Duration,
    /// Suggestions kept per category.
    pub per_category_cap: usize,
    /// Candidates requested from a source before local filtering.
    pub lookup_limit: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            quiet_interval: DEFAULT_QUIET_INTERVAL,
            per_category_cap: 5,
            lookup_limit: 25,
        }
    }
}

/// Candidate names for one category. Sources may return a broader set than
/// the query matches; the aggregator filters locally.
#[async_trait::async_trait]
pub trait CategorySource: Send + Sync {
    async fn candidates(&self, query: &str, limit: usize) -> Result<Vec<String>, SourceError>;
}

/// Category backed by the name lookup endpoint.
pub struct NamesCategory {
    source: Arc<dyn NameSource>,
}

impl NamesCategory {
    pub fn new(source: Arc<dyn NameSource>) -> Self {
        Self { source }
    }
}

#[async_trait::async_trait]
impl CategorySource for NamesCategory {
    async fn candidates(&self, query: &str, limit: usize) -> Result<Vec<String>, SourceError> {
        self.source.lookup(query, limit).await
    }
}

/// Category made of everyone on any leader board, boards in key order.
pub struct LeadersCategory {
    source: Arc<dyn LeaderSource>,
}

impl LeadersCategory {
    pub fn new(source: Arc<dyn LeaderSource>) -> Self {
        Self { source }
    }
}

#[async_trait::async_trait]
impl CategorySource for LeadersCategory {
    async fn candidates(&self, _query: &str, _limit: usize) -> Result<Vec<String>, SourceError> {
        let boards = self.source.leaders().await?;
        Ok(boards
            .into_values()
            .flatten()
            .map(|entry| entry.name)
            .collect())
    }
}

/// Fans one query out to every configured category and merges the results.
pub struct SearchAggregator {
    settings: SearchSettings,
    categories: Vec<(String, Arc<dyn CategorySource>)>,
}

impl SearchAggregator {
    pub fn new(settings: SearchSettings) -> Self {
        Self {
            settings,
            categories: Vec::new(),
        }
    }

    pub fn with_category(
        mut self,
        name: impl Into<String>,
        source: Arc<dyn CategorySource>,
    ) -> Self {
        self.categories.push((name.into(), source));
        self
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    pub fn category_names(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|(name, _)| name.as_str())
    }

    /// Watchlist search: excluded names are never offered, and a failing
    /// category contributes an empty list without affecting the others.
    pub async fn query(&self, text: &str, exclusions: &ExclusionSet) -> CategoryResultSet {
        let text = text.trim();
        if text.is_empty() {
            return CategoryResultSet::empty_for(self.category_names());
        }

        let limit = self.settings.lookup_limit;
        let outcomes = join_all(
            self.categories
                .iter()
                .map(|(_, source)| source.candidates(text, limit)),
        )
        .await;

        let mut results = CategoryResultSet::new();
        for ((category, _), outcome) in self.categories.iter().zip(outcomes) {
            let names = match outcome {
                Ok(candidates) => {
                    filter_candidates(candidates, text, exclusions, self.settings.per_category_cap)
                }
                Err(err) => {
                    rw_warn!("Lookup for {} failed for {:?}: {}", category, text, err);
                    Vec::new()
                }
            };
            results.push(category.clone(), names);
        }
        rw_debug!("Query {:?} produced {} suggestions", text, results.total());
        results
    }

    /// Global search: nothing is excluded, and all lookups must succeed; one
    /// failure empties every category for this attempt.
    pub async fn query_combined(&self, text: &str) -> CategoryResultSet {
        let text = text.trim();
        if text.is_empty() {
            return CategoryResultSet::empty_for(self.category_names());
        }

        let limit = self.settings.lookup_limit;
        let outcome = try_join_all(
            self.categories
                .iter()
                .map(|(_, source)| source.candidates(text, limit)),
        )
        .await;

        match outcome {
            Ok(all_candidates) => {
                let exclusions = ExclusionSet::none();
                let mut results = CategoryResultSet::new();
                for ((category, _), candidates) in self.categories.iter().zip(all_candidates) {
                    let names = filter_candidates(
                        candidates,
                        text,
                        &exclusions,
                        self.settings.per_category_cap,
                    );
                    results.push(category.clone(), names);
                }
                results
            }
            Err(err) => {
                rw_warn!("Combined search for {:?} failed: {}", text, err);
                CategoryResultSet::empty_for(self.category_names())
            }
        }
    }
}
