use serde_json::Value;

use crate::{ConnectionState, PipelineEvent, PipelineSession, StepPhase, StepStatus};

/// Pure fold of one event into a session.
///
/// Only a loading session accepts events; once `Completed` or `Errored` the
/// session is frozen and every further event is ignored.
pub fn fold(mut session: PipelineSession, event: PipelineEvent) -> PipelineSession {
    if session.connection_state != ConnectionState::Loading {
        return session;
    }

    match event {
        PipelineEvent::Step {
            step,
            phase: StepPhase::Processing,
            ..
        } => {
            session.current_step = step.ordinal();
            advance(&mut session.status_by_step[step], StepStatus::Process);
        }
        PipelineEvent::Step {
            step,
            phase: StepPhase::Completed,
            data,
        } => {
            // `finish` always carries a payload, even if the server sent none.
            session.payload_by_step[step] = Some(data.unwrap_or(Value::Null));
            advance(&mut session.status_by_step[step], StepStatus::Finish);
        }
        PipelineEvent::Complete => {
            session.connection_state = ConnectionState::Completed;
        }
        PipelineEvent::Error { message, trace } => {
            session.fail(message, trace);
        }
    }

    session
}

fn advance(slot: &mut StepStatus, next: StepStatus) {
    if next > *slot {
        *slot = next;
    }
}
