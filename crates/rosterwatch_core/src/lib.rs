//! Rosterwatch core: pure watchlist model, suggestion filtering and the
//! query debouncer state machine. Nothing in this crate performs IO.
mod effect;
mod msg;
mod results;
mod state;
mod update;
mod view_model;
mod watchlist;

pub use effect::Effect;
pub use msg::Msg;
pub use results::{filter_candidates, CategoryResultSet, CategoryResults};
pub use state::{Phase, QuerySeq, SearchState, SuggestionQuery, TimerId, DEFAULT_QUIET_INTERVAL};
pub use update::update;
pub use view_model::SearchViewModel;
pub use watchlist::{normalize_name_for_dedupe, ExclusionSet, Watchlist};
