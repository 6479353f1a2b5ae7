use std::sync::Once;

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use studio_core::{
    update, AppState, Effect, Msg, PipelineEvent, SessionId, StepId, StepPhase, StepStatus,
    GENERIC_ERROR_MESSAGE,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

fn start(query: &str) -> (AppState, SessionId) {
    let (state, effects) = update(AppState::new(), Msg::QuerySubmitted(query.to_string()));
    let session = match effects.as_slice() {
        [Effect::OpenStream { session, .. }] => *session,
        other => panic!("expected a single OpenStream, got {other:?}"),
    };
    (state, session)
}

fn frame(state: AppState, session: SessionId, event: PipelineEvent) -> (AppState, Vec<Effect>) {
    update(state, Msg::FrameReceived { session, event })
}

fn processing(step: StepId) -> PipelineEvent {
    PipelineEvent::Step {
        step,
        phase: StepPhase::Processing,
        data: None,
    }
}

fn completed(step: StepId, data: Value) -> PipelineEvent {
    PipelineEvent::Step {
        step,
        phase: StepPhase::Completed,
        data: Some(data),
    }
}

#[test]
fn step_events_fold_in_arrival_order() {
    init_logging();
    let (state, session) = start("rust async");

    let (state, effects) = frame(state, session, processing(StepId::Search));
    assert!(effects.is_empty());
    let view = state.view();
    assert_eq!(view.current_step, 1);
    assert_eq!(view.status(StepId::Search), StepStatus::Process);
    assert_eq!(view.payload(StepId::Search), None);

    let (state, _) = frame(state, session, completed(StepId::Search, json!([{"title": "r1"}])));
    let view = state.view();
    assert_eq!(view.current_step, 1);
    assert_eq!(view.status(StepId::Search), StepStatus::Finish);
    assert_eq!(view.payload(StepId::Search), Some(&json!([{"title": "r1"}])));

    let (state, _) = frame(state, session, processing(StepId::Selection));
    let view = state.view();
    assert_eq!(view.current_step, 2);
    assert_eq!(view.status(StepId::Selection), StepStatus::Process);
    assert_eq!(view.status(StepId::Summary), StepStatus::Wait);
    assert!(view.loading);
}

#[test]
fn error_after_partial_progress_preserves_steps() {
    init_logging();
    let (state, session) = start("rust async");
    let results = json!([{"title": "r1"}, {"title": "r2"}]);

    let (state, _) = frame(state, session, processing(StepId::Search));
    let (state, _) = frame(state, session, completed(StepId::Search, results.clone()));
    let (state, _) = frame(state, session, processing(StepId::Selection));
    let (state, effects) = frame(
        state,
        session,
        PipelineEvent::Error {
            message: "LLM timeout".to_string(),
            trace: Some("tb".to_string()),
        },
    );

    assert_eq!(
        effects,
        vec![
            Effect::CloseStream { session },
            Effect::ReportDiagnostic {
                session,
                message: "LLM timeout".to_string(),
                trace: Some("tb".to_string()),
            },
        ]
    );

    let view = state.view();
    let statuses: Vec<_> = StepId::ALL.iter().map(|step| view.status(*step)).collect();
    assert_eq!(
        statuses,
        vec![
            StepStatus::Finish,
            StepStatus::Process,
            StepStatus::Wait,
            StepStatus::Wait
        ]
    );
    assert_eq!(view.payload(StepId::Search), Some(&results));
    assert_eq!(view.payload(StepId::Selection), None);
    assert_eq!(view.error.as_deref(), Some("LLM timeout"));
    assert!(!view.loading);
    assert!(!view.completed);

    // Frozen: later frames are ignored and produce no effects.
    let before = state.view();
    let (state, effects) = frame(state, session, completed(StepId::Selection, json!(["u"])));
    assert!(effects.is_empty());
    assert_eq!(state.view(), before);
}

#[test]
fn full_run_completes_with_all_payloads() {
    init_logging();
    let (mut state, session) = start("rust async");
    let payloads = [
        json!({"organic": [{"title": "p1"}]}),
        json!(["https://a.example.com"]),
        json!("summary p3"),
        json!("newsletter p4"),
    ];

    for (step, payload) in StepId::ALL.into_iter().zip(payloads.iter()) {
        let (next, _) = frame(state, session, processing(step));
        let (next, _) = frame(next, session, completed(step, payload.clone()));
        state = next;
    }
    let (state, effects) = frame(state, session, PipelineEvent::Complete);
    assert_eq!(effects, vec![Effect::CloseStream { session }]);

    let view = state.view();
    for (step, payload) in StepId::ALL.into_iter().zip(payloads.iter()) {
        assert_eq!(view.status(step), StepStatus::Finish);
        assert_eq!(view.payload(step), Some(payload));
    }
    assert_eq!(view.current_step, 4);
    assert!(view.completed);
    assert!(!view.loading);
    assert_eq!(view.error, None);

    let before = state.view();
    let (state, effects) = frame(state, session, processing(StepId::Search));
    let (state, _) = frame(
        state,
        session,
        PipelineEvent::Error {
            message: "late".to_string(),
            trace: None,
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.view(), before);
}

#[test]
fn complete_after_partial_progress_freezes_state() {
    init_logging();
    let (state, session) = start("q");
    let (state, _) = frame(state, session, processing(StepId::Search));
    let (state, _) = frame(state, session, PipelineEvent::Complete);

    let view = state.view();
    assert!(view.completed);
    assert!(!view.loading);
    assert_eq!(view.status(StepId::Search), StepStatus::Process);

    let (state, effects) = frame(state, session, completed(StepId::Search, json!([])));
    assert!(effects.is_empty());
    assert_eq!(state.view(), view);
}

#[test]
fn completed_step_without_data_still_has_payload() {
    init_logging();
    let (state, session) = start("q");
    let (state, _) = frame(
        state,
        session,
        PipelineEvent::Step {
            step: StepId::Summary,
            phase: StepPhase::Completed,
            data: None,
        },
    );
    let view = state.view();
    assert_eq!(view.status(StepId::Summary), StepStatus::Finish);
    assert_eq!(view.payload(StepId::Summary), Some(&Value::Null));
}

#[test]
fn status_never_regresses_within_a_session() {
    init_logging();
    let (state, session) = start("q");
    let (state, _) = frame(state, session, completed(StepId::Search, json!([])));
    let (state, _) = frame(state, session, processing(StepId::Search));

    let view = state.view();
    assert_eq!(view.status(StepId::Search), StepStatus::Finish);
    assert_eq!(view.current_step, 1);
}

#[test]
fn malformed_error_frame_sets_generic_message() {
    init_logging();
    let (state, session) = start("q");
    let event = studio_core::decode_frame("error", "<<garbage>>").expect("error frame");
    let (state, effects) = frame(state, session, event);

    let view = state.view();
    assert_eq!(view.error.as_deref(), Some(GENERIC_ERROR_MESSAGE));
    assert!(!view.loading);
    assert!(effects.contains(&Effect::CloseStream { session }));
}

#[test]
fn out_of_order_steps_fold_as_they_arrive() {
    init_logging();
    let (state, session) = start("q");
    let (state, _) = frame(state, session, processing(StepId::Summary));
    let (state, _) = frame(state, session, processing(StepId::Selection));

    let view = state.view();
    assert_eq!(view.current_step, 2);
    assert_eq!(view.status(StepId::Summary), StepStatus::Process);
    assert_eq!(view.status(StepId::Selection), StepStatus::Process);
}
