use std::time::Duration;

use crate::view_model::SearchViewModel;
use crate::CategoryResultSet;

/// Quiet interval after the last keystroke before a lookup is dispatched.
pub const DEFAULT_QUIET_INTERVAL: Duration = Duration::from_millis(250);

pub type TimerId = u64;
pub type QuerySeq = u64;

/// Search text captured at dispatch time, tagged with its sequence number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionQuery {
    pub seq: QuerySeq,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    /// Waiting for the quiet interval to elapse.
    Pending { timer: TimerId },
    /// A lookup is in flight and its result will be applied.
    Dispatching { seq: QuerySeq },
}

/// Debouncer state: one logical pending-request slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchState {
    quiet_interval: Duration,
    phase: Phase,
    input: String,
    next_timer: TimerId,
    next_seq: QuerySeq,
    in_flight: Option<SuggestionQuery>,
    shown_query: Option<SuggestionQuery>,
    suggestions: CategoryResultSet,
    dispatched: u64,
    discarded: u64,
    dirty: bool,
}

impl Default for SearchState {
    fn default() -> Self {
        Self::new(DEFAULT_QUIET_INTERVAL)
    }
}

impl SearchState {
    pub fn new(quiet_interval: Duration) -> Self {
        Self {
            quiet_interval,
            phase: Phase::Idle,
            input: String::new(),
            next_timer: 1,
            next_seq: 1,
            in_flight: None,
            shown_query: None,
            suggestions: CategoryResultSet::default(),
            dispatched: 0,
            discarded: 0,
            dirty: false,
        }
    }

    pub fn view(&self) -> SearchViewModel {
        SearchViewModel {
            phase: self.phase,
            input: self.input.clone(),
            shown_query: self.shown_query.as_ref().map(|query| query.text.clone()),
            suggestions: self.suggestions.clone(),
            dispatched: self.dispatched,
            discarded: self.discarded,
            dirty: self.dirty,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn quiet_interval(&self) -> Duration {
        self.quiet_interval
    }

    pub fn suggestions(&self) -> &CategoryResultSet {
        &self.suggestions
    }

    /// Returns whether the view changed since the last call, and resets the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn pending_timer(&self) -> Option<TimerId> {
        match self.phase {
            Phase::Pending { timer } => Some(timer),
            _ => None,
        }
    }

    pub(crate) fn awaits(&self, seq: QuerySeq) -> bool {
        self.in_flight.as_ref().is_some_and(|query| query.seq == seq)
    }

    /// Forgets the in-flight query so its result is discarded on arrival.
    pub(crate) fn abandon_in_flight(&mut self) {
        self.in_flight = None;
        if matches!(self.phase, Phase::Dispatching { .. }) {
            self.phase = Phase::Idle;
        }
    }

    pub(crate) fn clear_input(&mut self) {
        self.phase = Phase::Idle;
        self.input.clear();
        self.shown_query = None;
        self.suggestions = CategoryResultSet::default();
        self.dirty = true;
    }

    pub(crate) fn arm_timer(&mut self, text: &str) -> TimerId {
        let timer = self.next_timer;
        self.next_timer += 1;
        self.input = text.to_owned();
        self.phase = Phase::Pending { timer };
        self.dirty = true;
        timer
    }

    pub(crate) fn begin_dispatch(&mut self) -> SuggestionQuery {
        let query = SuggestionQuery {
            seq: self.next_seq,
            text: self.input.clone(),
        };
        self.next_seq += 1;
        self.dispatched += 1;
        self.phase = Phase::Dispatching { seq: query.seq };
        self.in_flight = Some(query.clone());
        self.dirty = true;
        query
    }

    pub(crate) fn apply_results(&mut self, results: CategoryResultSet) -> Option<SuggestionQuery> {
        let query = self.in_flight.take()?;
        self.phase = Phase::Idle;
        self.shown_query = Some(query.clone());
        self.suggestions = results;
        self.dirty = true;
        Some(query)
    }

    pub(crate) fn record_discard(&mut self) {
        self.discarded += 1;
    }

    pub(crate) fn stop(&mut self) {
        self.in_flight = None;
        self.phase = Phase::Idle;
        self.dirty = true;
    }
}
