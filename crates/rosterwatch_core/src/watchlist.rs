use std::collections::HashSet;

/// Dedupe key for a watched name: trimmed and lowercased.
pub fn normalize_name_for_dedupe(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Ordered list of watched names, most recently added first.
///
/// Names are unique under [`normalize_name_for_dedupe`]; the stored spelling
/// is the one used on first insertion.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Watchlist {
    names: Vec<String>,
}

impl Watchlist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a list from loaded data, keeping order. Blank entries and
    /// later duplicates of an earlier entry are dropped.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let names = names
            .into_iter()
            .filter_map(|name| {
                let trimmed = name.as_ref().trim();
                if trimmed.is_empty() || !seen.insert(normalize_name_for_dedupe(trimmed)) {
                    None
                } else {
                    Some(trimmed.to_owned())
                }
            })
            .collect();
        Self { names }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Prepends `name` unless it is blank or already present.
    /// Returns the stored spelling when the list changed.
    pub fn add(&mut self, name: &str) -> Option<String> {
        let trimmed = name.trim();
        if trimmed.is_empty() || self.contains(trimmed) {
            return None;
        }
        self.names.insert(0, trimmed.to_owned());
        Some(trimmed.to_owned())
    }

    /// Removes the case-insensitive match for `name`, returning its stored spelling.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let index = self.position(name)?;
        Some(self.names.remove(index))
    }

    /// Empties the list. Returns whether anything was removed.
    pub fn clear(&mut self) -> bool {
        let had_entries = !self.names.is_empty();
        self.names.clear();
        had_entries
    }

    pub fn exclusion_set(&self) -> ExclusionSet {
        ExclusionSet::from_names(&self.names)
    }

    fn position(&self, name: &str) -> Option<usize> {
        let key = normalize_name_for_dedupe(name);
        if key.is_empty() {
            return None;
        }
        self.names
            .iter()
            .position(|existing| normalize_name_for_dedupe(existing) == key)
    }
}

/// Names a suggestion list must not offer, compared case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExclusionSet {
    keys: HashSet<String>,
}

impl ExclusionSet {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keys = names
            .into_iter()
            .map(|name| normalize_name_for_dedupe(name.as_ref()))
            .filter(|key| !key.is_empty())
            .collect();
        Self { keys }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.keys.contains(&normalize_name_for_dedupe(name))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
