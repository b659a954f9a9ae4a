use rosterwatch_core::CategoryResultSet;

/// Numbered suggestion lines, grouped by category. Numbers follow
/// [`CategoryResultSet::flatten`] order so `pick n` can index into it.
pub fn render_suggestions(results: &CategoryResultSet) -> Vec<String> {
    if results.is_empty() {
        return vec!["  (no suggestions)".to_string()];
    }

    let mut lines = Vec::new();
    let mut number = 0;
    for category in results.iter() {
        if category.names.is_empty() {
            continue;
        }
        lines.push(format!("  {}:", category.category));
        for name in &category.names {
            number += 1;
            lines.push(format!("    {number:>2}. {name}"));
        }
    }
    lines
}

pub fn render_watchlist(names: &[String]) -> Vec<String> {
    if names.is_empty() {
        return vec!["  (watchlist is empty)".to_string()];
    }
    names.iter().map(|name| format!("  * {name}")).collect()
}
