use crate::{AppState, Effect, Msg, PipelineEvent, CONNECTION_LOST_MESSAGE};

/// Pure update function: applies a message to state and returns any effects.
///
/// Connection ownership is expressed through effects: a new session always
/// closes the previous connection before asking for its own, and frames or
/// transport failures tagged with any other session are dropped.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    if state.is_torn_down() {
        return (state, Vec::new());
    }

    let effects = match msg {
        Msg::QuerySubmitted(raw) => {
            let query = raw.trim();
            if query.is_empty() {
                return (state, Vec::new());
            }
            restart(&mut state, query.to_string())
        }
        Msg::RetryClicked => {
            let query = state.session().map(|session| session.query().to_string());
            match query {
                Some(query) => restart(&mut state, query),
                None => Vec::new(),
            }
        }
        Msg::FrameReceived { session, event } => {
            if state.open_connection() != Some(session) {
                return (state, Vec::new());
            }
            let diagnostic = match &event {
                PipelineEvent::Error { message, trace } => Some(Effect::ReportDiagnostic {
                    session,
                    message: message.clone(),
                    trace: trace.clone(),
                }),
                _ => None,
            };
            let terminal = event.is_terminal();
            state.apply_event(event);

            let mut effects = Vec::new();
            if terminal {
                effects.push(Effect::CloseStream { session });
            }
            effects.extend(diagnostic);
            effects
        }
        Msg::ConnectionLost { session, reason } => {
            if state.open_connection() != Some(session) {
                return (state, Vec::new());
            }
            state.apply_connection_lost(CONNECTION_LOST_MESSAGE);
            vec![
                Effect::CloseStream { session },
                Effect::ReportDiagnostic {
                    session,
                    message: reason,
                    trace: None,
                },
            ]
        }
        Msg::StepSelected(step) => {
            state.select_step(step);
            Vec::new()
        }
        Msg::Shutdown => {
            let effects = state
                .open_connection()
                .map(|session| Effect::CloseStream { session })
                .into_iter()
                .collect();
            state.tear_down();
            effects
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn restart(state: &mut AppState, query: String) -> Vec<Effect> {
    let mut effects = Vec::with_capacity(2);
    if let Some(previous) = state.open_connection() {
        effects.push(Effect::CloseStream { session: previous });
    }
    let session = state.begin_session(query.clone());
    effects.push(Effect::OpenStream { session, query });
    effects
}
