use serde_json::json;
use studio_core::{
    update, AppState, Effect, Msg, PipelineEvent, SessionId, StepId, StepPhase, StepStatus,
    CONNECTION_LOST_MESSAGE,
};

fn init_logging() {
    engine_logging::initialize_for_tests();
}

fn submit(state: AppState, query: &str) -> (AppState, Vec<Effect>) {
    update(state, Msg::QuerySubmitted(query.to_string()))
}

fn opened_session(effects: &[Effect]) -> SessionId {
    effects
        .iter()
        .find_map(|effect| match effect {
            Effect::OpenStream { session, .. } => Some(*session),
            _ => None,
        })
        .expect("open effect")
}

fn step(state: AppState, session: SessionId, step: StepId, phase: StepPhase) -> AppState {
    let data = match phase {
        StepPhase::Processing => None,
        StepPhase::Completed => Some(json!(["payload"])),
    };
    let (state, _) = update(
        state,
        Msg::FrameReceived {
            session,
            event: PipelineEvent::Step { step, phase, data },
        },
    );
    state
}

#[test]
fn empty_query_is_noop() {
    init_logging();
    let (mut state, effects) = submit(AppState::new(), "   \t ");
    assert!(effects.is_empty());
    assert_eq!(state.view().session, None);
    assert!(!state.consume_dirty());
}

#[test]
fn query_is_trimmed_and_opens_one_stream() {
    init_logging();
    let (mut state, effects) = submit(AppState::new(), "  rust newsletters  ");
    assert_eq!(
        effects,
        vec![Effect::OpenStream {
            session: 1,
            query: "rust newsletters".to_string(),
        }]
    );
    let view = state.view();
    assert_eq!(view.query.as_deref(), Some("rust newsletters"));
    assert!(view.loading);
    assert!(view.can_retry);
    assert_eq!(view.current_step, 0);
    assert!(state.consume_dirty());
}

#[test]
fn new_query_closes_previous_connection_before_opening() {
    init_logging();
    let (state, effects) = submit(AppState::new(), "first");
    let first = opened_session(&effects);
    let state = step(state, first, StepId::Search, StepPhase::Processing);

    let (state, effects) = submit(state, "second");
    let second = opened_session(&effects);
    assert_ne!(first, second);
    assert_eq!(
        effects,
        vec![
            Effect::CloseStream { session: first },
            Effect::OpenStream {
                session: second,
                query: "second".to_string(),
            },
        ]
    );

    let view = state.view();
    assert_eq!(view.query.as_deref(), Some("second"));
    assert_eq!(view.current_step, 0);
    assert_eq!(view.status(StepId::Search), StepStatus::Wait);
}

#[test]
fn late_frames_from_superseded_session_are_dropped() {
    init_logging();
    let (state, effects) = submit(AppState::new(), "first");
    let first = opened_session(&effects);
    let (state, _) = submit(state, "second");
    let before = state.view();

    let state = step(state, first, StepId::Search, StepPhase::Completed);
    let (state, effects) = update(
        state,
        Msg::FrameReceived {
            session: first,
            event: PipelineEvent::Complete,
        },
    );
    assert!(effects.is_empty());
    let (state, effects) = update(
        state,
        Msg::ConnectionLost {
            session: first,
            reason: "dropped".to_string(),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.view(), before);
}

#[test]
fn terminated_session_does_not_close_twice_on_new_query() {
    init_logging();
    let (state, effects) = submit(AppState::new(), "first");
    let first = opened_session(&effects);
    let (state, _) = update(
        state,
        Msg::FrameReceived {
            session: first,
            event: PipelineEvent::Complete,
        },
    );

    let (_state, effects) = submit(state, "second");
    assert!(!effects.contains(&Effect::CloseStream { session: first }));
    assert_eq!(effects.len(), 1);
}

#[test]
fn retry_resets_state_and_opens_exactly_one_connection() {
    init_logging();
    let (state, effects) = submit(AppState::new(), "rust");
    let first = opened_session(&effects);
    let state = step(state, first, StepId::Search, StepPhase::Processing);
    let state = step(state, first, StepId::Search, StepPhase::Completed);
    let (state, _) = update(
        state,
        Msg::FrameReceived {
            session: first,
            event: PipelineEvent::Error {
                message: "LLM timeout".to_string(),
                trace: None,
            },
        },
    );
    assert_eq!(state.view().error.as_deref(), Some("LLM timeout"));

    let (state, effects) = update(state, Msg::RetryClicked);
    let opens: Vec<_> = effects
        .iter()
        .filter(|effect| matches!(effect, Effect::OpenStream { .. }))
        .collect();
    assert_eq!(opens.len(), 1);
    assert!(!effects.iter().any(|e| matches!(e, Effect::CloseStream { .. })));

    let view = state.view();
    assert_eq!(view.query.as_deref(), Some("rust"));
    assert_eq!(view.current_step, 0);
    assert_eq!(view.error, None);
    assert!(view.loading);
    assert!(!view.completed);
    for step in StepId::ALL {
        assert_eq!(view.status(step), StepStatus::Wait);
        assert_eq!(view.payload(step), None);
    }
}

#[test]
fn retry_while_loading_closes_the_live_connection() {
    init_logging();
    let (state, effects) = submit(AppState::new(), "rust");
    let first = opened_session(&effects);

    let (_state, effects) = update(state, Msg::RetryClicked);
    let second = opened_session(&effects);
    assert_eq!(
        effects,
        vec![
            Effect::CloseStream { session: first },
            Effect::OpenStream {
                session: second,
                query: "rust".to_string(),
            },
        ]
    );
}

#[test]
fn retry_without_session_is_noop() {
    init_logging();
    let (state, effects) = update(AppState::new(), Msg::RetryClicked);
    assert!(effects.is_empty());
    assert_eq!(state.view().session, None);
}

#[test]
fn connection_loss_sets_generic_error_and_keeps_progress() {
    init_logging();
    let (state, effects) = submit(AppState::new(), "rust");
    let session = opened_session(&effects);
    let state = step(state, session, StepId::Search, StepPhase::Processing);
    let state = step(state, session, StepId::Search, StepPhase::Completed);

    let (state, effects) = update(
        state,
        Msg::ConnectionLost {
            session,
            reason: "stream ended".to_string(),
        },
    );
    assert_eq!(
        effects,
        vec![
            Effect::CloseStream { session },
            Effect::ReportDiagnostic {
                session,
                message: "stream ended".to_string(),
                trace: None,
            },
        ]
    );
    let view = state.view();
    assert_eq!(view.error.as_deref(), Some(CONNECTION_LOST_MESSAGE));
    assert!(!view.loading);
    assert_eq!(view.status(StepId::Search), StepStatus::Finish);
    assert_eq!(view.payload(StepId::Search), Some(&json!(["payload"])));
}

#[test]
fn connection_loss_does_not_overwrite_structured_error() {
    init_logging();
    let (state, effects) = submit(AppState::new(), "rust");
    let session = opened_session(&effects);
    let (state, _) = update(
        state,
        Msg::FrameReceived {
            session,
            event: PipelineEvent::Error {
                message: "Serper quota exceeded".to_string(),
                trace: None,
            },
        },
    );
    let (state, effects) = update(
        state,
        Msg::ConnectionLost {
            session,
            reason: "eof".to_string(),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.view().error.as_deref(), Some("Serper quota exceeded"));
}

#[test]
fn shutdown_closes_connection_and_freezes_state() {
    init_logging();
    let (state, effects) = submit(AppState::new(), "rust");
    let session = opened_session(&effects);

    let (state, effects) = update(state, Msg::Shutdown);
    assert_eq!(effects, vec![Effect::CloseStream { session }]);
    assert!(state.is_torn_down());

    let before = state.view();
    let state = step(state, session, StepId::Search, StepPhase::Processing);
    let (state, effects) = submit(state, "another");
    assert!(effects.is_empty());
    assert_eq!(state.view(), before);

    let (_state, effects) = update(state, Msg::Shutdown);
    assert!(effects.is_empty());
}

#[test]
fn selection_follows_progress_and_rejects_waiting_steps() {
    init_logging();
    let (state, effects) = submit(AppState::new(), "rust");
    let session = opened_session(&effects);
    assert_eq!(state.view().selected_step, StepId::Search);

    let state = step(state, session, StepId::Search, StepPhase::Processing);
    let state = step(state, session, StepId::Search, StepPhase::Completed);
    let state = step(state, session, StepId::Selection, StepPhase::Processing);
    assert_eq!(state.view().selected_step, StepId::Selection);

    let (state, _) = update(state, Msg::StepSelected(StepId::Newsletter));
    assert_eq!(state.view().selected_step, StepId::Selection);

    let (state, _) = update(state, Msg::StepSelected(StepId::Search));
    assert_eq!(state.view().selected_step, StepId::Search);

    let state = step(state, session, StepId::Summary, StepPhase::Processing);
    assert_eq!(state.view().selected_step, StepId::Summary);
}
