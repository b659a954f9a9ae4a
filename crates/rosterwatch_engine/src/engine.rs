use std::sync::Arc;

use rosterwatch_core::{
    update, CategoryResultSet, Effect, ExclusionSet, Msg, SearchState, SuggestionQuery, TimerId,
};
use rosterwatch_logging::{rw_debug, rw_trace};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::aggregate::SearchAggregator;

/// Which aggregator path a dispatched query takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    /// Per-category failure isolation; watched names are excluded.
    Watchlist,
    /// Single combined call; no exclusion, any failure empties the result.
    Global,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchEvent {
    /// A lookup was started for this query.
    Dispatched(SuggestionQuery),
    Suggestions {
        query: SuggestionQuery,
        results: CategoryResultSet,
    },
    Cleared,
}

enum SearchCommand {
    Input(String),
    SetExclusions(ExclusionSet),
}

/// Debounced search running as a task on the current tokio runtime.
///
/// Dropping the handle (or calling [`SearchHandle::shutdown`]) cancels any
/// pending timer. Lookups already in flight run to completion but their
/// results are ignored.
pub struct SearchHandle {
    cmd_tx: mpsc::UnboundedSender<SearchCommand>,
    event_rx: mpsc::UnboundedReceiver<SearchEvent>,
    shutdown: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl SearchHandle {
    /// Must be called from within a tokio runtime.
    pub fn spawn(aggregator: Arc<SearchAggregator>, mode: SearchMode) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();

        let task = tokio::spawn(run_search_loop(
            aggregator,
            mode,
            cmd_rx,
            event_tx,
            shutdown.clone(),
        ));

        Self {
            cmd_tx,
            event_rx,
            shutdown,
            task: Some(task),
        }
    }

    /// Feeds one keystroke snapshot of the search box.
    pub fn input_changed(&self, text: impl Into<String>) {
        let _ = self.cmd_tx.send(SearchCommand::Input(text.into()));
    }

    /// Names excluded from later dispatches (typically the watchlist).
    pub fn set_exclusions(&self, exclusions: ExclusionSet) {
        let _ = self.cmd_tx.send(SearchCommand::SetExclusions(exclusions));
    }

    pub fn try_recv(&mut self) -> Option<SearchEvent> {
        self.event_rx.try_recv().ok()
    }

    pub async fn recv(&mut self) -> Option<SearchEvent> {
        self.event_rx.recv().await
    }

    pub async fn shutdown(mut self) {
        self.shutdown.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for SearchHandle {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn run_search_loop(
    aggregator: Arc<SearchAggregator>,
    mode: SearchMode,
    mut cmd_rx: mpsc::UnboundedReceiver<SearchCommand>,
    event_tx: mpsc::UnboundedSender<SearchEvent>,
    shutdown: CancellationToken,
) {
    let (internal_tx, mut internal_rx) = mpsc::unbounded_channel::<Msg>();
    let mut state = SearchState::new(aggregator.settings().quiet_interval);
    let mut exclusions = ExclusionSet::none();
    let mut armed: Option<(TimerId, CancellationToken)> = None;

    loop {
        let msg = tokio::select! {
            _ = shutdown.cancelled() => Some(Msg::Teardown),
            command = cmd_rx.recv() => match command {
                Some(SearchCommand::Input(text)) => Some(Msg::InputChanged(text)),
                Some(SearchCommand::SetExclusions(next)) => {
                    exclusions = next;
                    None
                }
                None => Some(Msg::Teardown),
            },
            Some(msg) = internal_rx.recv() => Some(msg),
        };
        let Some(msg) = msg else {
            continue;
        };

        let stopping = matches!(msg, Msg::Teardown);
        let (next, effects) = update(state, msg);
        state = next;

        for effect in effects {
            match effect {
                Effect::ArmTimer { timer, delay } => {
                    let token = shutdown.child_token();
                    let cancelled = token.clone();
                    let tx = internal_tx.clone();
                    tokio::spawn(async move {
                        tokio::select! {
                            _ = cancelled.cancelled() => {}
                            _ = tokio::time::sleep(delay) => {
                                let _ = tx.send(Msg::TimerFired { timer });
                            }
                        }
                    });
                    armed = Some((timer, token));
                }
                Effect::CancelTimer { timer } => {
                    if let Some((id, token)) = armed.take() {
                        if id == timer {
                            rw_trace!("Cancelled search timer {}", id);
                            token.cancel();
                        } else {
                            armed = Some((id, token));
                        }
                    }
                }
                Effect::Dispatch(query) => {
                    rw_debug!("Dispatching search #{} {:?}", query.seq, query.text);
                    let _ = event_tx.send(SearchEvent::Dispatched(query.clone()));
                    let aggregator = aggregator.clone();
                    let exclusions = exclusions.clone();
                    let tx = internal_tx.clone();
                    tokio::spawn(async move {
                        let results = match mode {
                            SearchMode::Watchlist => {
                                aggregator.query(&query.text, &exclusions).await
                            }
                            SearchMode::Global => aggregator.query_combined(&query.text).await,
                        };
                        let _ = tx.send(Msg::ResultsArrived {
                            seq: query.seq,
                            results,
                        });
                    });
                }
                Effect::ApplySuggestions { query, results } => {
                    let _ = event_tx.send(SearchEvent::Suggestions { query, results });
                }
                Effect::ClearSuggestions => {
                    let _ = event_tx.send(SearchEvent::Cleared);
                }
            }
        }

        if stopping {
            rw_debug!("Search loop stopped");
            break;
        }
    }
}
