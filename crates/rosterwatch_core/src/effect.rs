use std::time::Duration;

use crate::{CategoryResultSet, SuggestionQuery, TimerId};

/// Side effects requested by [`crate::update`]; executed by the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Start the quiet-interval timer; it must answer with `Msg::TimerFired`.
    ArmTimer { timer: TimerId, delay: Duration },
    /// Stop a previously armed timer before it fires.
    CancelTimer { timer: TimerId },
    /// Run the lookup for this query; answer with `Msg::ResultsArrived`.
    Dispatch(SuggestionQuery),
    /// Show these suggestions.
    ApplySuggestions {
        query: SuggestionQuery,
        results: CategoryResultSet,
    },
    /// Hide any visible suggestions.
    ClearSuggestions,
}
