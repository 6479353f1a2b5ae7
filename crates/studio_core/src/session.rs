use serde_json::Value;

use crate::{StepId, StepStatus, StepTable};

/// Generation number identifying one session and the connection it opened.
pub type SessionId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Idle,
    Loading,
    Completed,
    Errored,
}

impl ConnectionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, ConnectionState::Completed | ConnectionState::Errored)
    }
}

/// All state for one query's pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSession {
    pub(crate) id: SessionId,
    pub(crate) query: String,
    pub(crate) current_step: u8,
    pub(crate) status_by_step: StepTable<StepStatus>,
    pub(crate) payload_by_step: StepTable<Option<Value>>,
    pub(crate) connection_state: ConnectionState,
    pub(crate) error_message: Option<String>,
    pub(crate) error_trace: Option<String>,
}

impl PipelineSession {
    /// Fresh session for `query`, already loading: it exists only once its connection is requested.
    pub fn start(id: SessionId, query: impl Into<String>) -> Self {
        Self {
            id,
            query: query.into(),
            current_step: 0,
            status_by_step: StepTable::default(),
            payload_by_step: StepTable::default(),
            connection_state: ConnectionState::Loading,
            error_message: None,
            error_trace: None,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn current_step(&self) -> u8 {
        self.current_step
    }

    pub fn status(&self, step: StepId) -> StepStatus {
        self.status_by_step[step]
    }

    pub fn payload(&self, step: StepId) -> Option<&Value> {
        self.payload_by_step[step].as_ref()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection_state
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.connection_state == ConnectionState::Loading
    }

    pub(crate) fn fail(&mut self, message: String, trace: Option<String>) {
        self.connection_state = ConnectionState::Errored;
        self.error_message = Some(message);
        self.error_trace = trace;
    }
}
