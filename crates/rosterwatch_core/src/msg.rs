#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Search box text changed (one keystroke snapshot, untrimmed).
    InputChanged(String),
    /// A quiet-interval timer elapsed.
    TimerFired { timer: crate::TimerId },
    /// Lookup results for a dispatched query.
    ResultsArrived {
        seq: crate::QuerySeq,
        results: crate::CategoryResultSet,
    },
    /// The owner is going away; drop pending work.
    Teardown,
}
