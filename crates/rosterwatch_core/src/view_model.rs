use crate::{CategoryResultSet, Phase};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchViewModel {
    pub phase: Phase,
    /// Latest trimmed input.
    pub input: String,
    /// Text of the query whose results are shown, if any.
    pub shown_query: Option<String>,
    pub suggestions: CategoryResultSet,
    pub dispatched: u64,
    /// Results dropped because a newer keystroke superseded them.
    pub discarded: u64,
    pub dirty: bool,
}
