use crate::{Effect, Msg, SearchState};

/// Pure update function: applies a message to state and returns any effects.
///
/// Last keystroke wins: every input change cancels the pending timer and
/// abandons the in-flight query, so at most one result is applied per
/// quiet period and late results never overwrite newer ones.
pub fn update(mut state: SearchState, msg: Msg) -> (SearchState, Vec<Effect>) {
    let effects = match msg {
        Msg::InputChanged(raw) => {
            let mut effects = Vec::with_capacity(2);
            if let Some(timer) = state.pending_timer() {
                effects.push(Effect::CancelTimer { timer });
            }
            state.abandon_in_flight();

            let text = raw.trim();
            if text.is_empty() {
                state.clear_input();
                effects.push(Effect::ClearSuggestions);
            } else {
                let timer = state.arm_timer(text);
                effects.push(Effect::ArmTimer {
                    timer,
                    delay: state.quiet_interval(),
                });
            }
            effects
        }
        Msg::TimerFired { timer } => {
            // A cancelled timer may still fire if cancellation raced the sleep.
            if state.pending_timer() != Some(timer) {
                return (state, Vec::new());
            }
            vec![Effect::Dispatch(state.begin_dispatch())]
        }
        Msg::ResultsArrived { seq, results } => {
            if !state.awaits(seq) {
                state.record_discard();
                return (state, Vec::new());
            }
            match state.apply_results(results.clone()) {
                Some(query) => vec![Effect::ApplySuggestions { query, results }],
                None => Vec::new(),
            }
        }
        Msg::Teardown => {
            let effects = state
                .pending_timer()
                .map(|timer| vec![Effect::CancelTimer { timer }])
                .unwrap_or_default();
            state.stop();
            effects
        }
    };

    (state, effects)
}
