use serde_json::Value;

use crate::{ConnectionState, PipelineSession, SessionId, StepId, StepStatus, StepTable};

/// Read-only view handed to the presentation layer after every transition.
///
/// Retrying is requested by sending [`crate::Msg::RetryClicked`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PipelineSnapshot {
    pub session: Option<SessionId>,
    pub query: Option<String>,
    pub current_step: u8,
    pub status_by_step: StepTable<StepStatus>,
    pub payload_by_step: StepTable<Option<Value>>,
    pub loading: bool,
    pub error: Option<String>,
    pub completed: bool,
    pub selected_step: StepId,
    pub can_retry: bool,
}

impl PipelineSnapshot {
    pub(crate) fn from_state(session: Option<&PipelineSession>, selected_step: StepId) -> Self {
        let Some(session) = session else {
            return Self {
                selected_step,
                ..Self::default()
            };
        };
        Self {
            session: Some(session.id),
            query: Some(session.query.clone()),
            current_step: session.current_step,
            status_by_step: session.status_by_step.clone(),
            payload_by_step: session.payload_by_step.clone(),
            loading: session.is_loading(),
            error: session.error_message.clone(),
            completed: session.connection_state == ConnectionState::Completed,
            selected_step,
            can_retry: true,
        }
    }

    pub fn status(&self, step: StepId) -> StepStatus {
        self.status_by_step[step]
    }

    pub fn payload(&self, step: StepId) -> Option<&Value> {
        self.payload_by_step[step].as_ref()
    }
}
