use std::collections::HashSet;

use crate::{normalize_name_for_dedupe, ExclusionSet};

/// Suggestions for one category, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryResults {
    pub category: String,
    pub names: Vec<String>,
}

/// Suggestions grouped by category, in configured category order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CategoryResultSet {
    categories: Vec<CategoryResults>,
}

impl CategoryResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// A result set with every category present and empty.
    pub fn empty_for<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            categories: categories
                .into_iter()
                .map(|category| CategoryResults {
                    category: category.into(),
                    names: Vec::new(),
                })
                .collect(),
        }
    }

    pub fn push(&mut self, category: impl Into<String>, names: Vec<String>) {
        self.categories.push(CategoryResults {
            category: category.into(),
            names,
        });
    }

    pub fn get(&self, category: &str) -> Option<&[String]> {
        self.categories
            .iter()
            .find(|entry| entry.category == category)
            .map(|entry| entry.names.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = &CategoryResults> {
        self.categories.iter()
    }

    /// Every suggestion as `(category, name)`, categories in order.
    pub fn flatten(&self) -> Vec<(&str, &str)> {
        self.categories
            .iter()
            .flat_map(|entry| {
                entry
                    .names
                    .iter()
                    .map(move |name| (entry.category.as_str(), name.as_str()))
            })
            .collect()
    }

    pub fn total(&self) -> usize {
        self.categories.iter().map(|entry| entry.names.len()).sum()
    }

    /// True when no category has any suggestion.
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Keeps candidates containing `query` (case-insensitive), drops excluded
/// and repeated names, and truncates to `cap`. Source order is preserved.
pub fn filter_candidates<I, S>(
    candidates: I,
    query: &str,
    exclusions: &ExclusionSet,
    cap: usize,
) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let needle = query.trim().to_lowercase();
    if needle.is_empty() || cap == 0 {
        return Vec::new();
    }

    let mut seen = HashSet::new();
    let mut kept = Vec::with_capacity(cap);
    for candidate in candidates {
        let name = candidate.as_ref().trim();
        if name.is_empty() || !name.to_lowercase().contains(&needle) {
            continue;
        }
        if exclusions.contains(name) || !seen.insert(normalize_name_for_dedupe(name)) {
            continue;
        }
        kept.push(name.to_owned());
        if kept.len() == cap {
            break;
        }
    }
    kept
}
