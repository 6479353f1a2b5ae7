use crate::view_model::PipelineSnapshot;
use crate::{fold, PipelineEvent, PipelineSession, SessionId, StepId};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    session: Option<PipelineSession>,
    last_session_id: SessionId,
    selected_step: Option<StepId>,
    torn_down: bool,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> PipelineSnapshot {
        PipelineSnapshot::from_state(self.session.as_ref(), self.selected_step())
    }

    pub fn session(&self) -> Option<&PipelineSession> {
        self.session.as_ref()
    }

    /// Step shown in detail; follows the pipeline unless the user picked one.
    pub fn selected_step(&self) -> StepId {
        self.selected_step.unwrap_or_default()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Returns whether anything changed since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Session id whose connection is still expected to be open.
    pub(crate) fn open_connection(&self) -> Option<SessionId> {
        self.session
            .as_ref()
            .filter(|session| session.is_loading())
            .map(PipelineSession::id)
    }

    pub(crate) fn live_session_id(&self) -> Option<SessionId> {
        self.session.as_ref().map(PipelineSession::id)
    }

    /// Replaces any previous session with a brand-new one for `query`.
    pub(crate) fn begin_session(&mut self, query: String) -> SessionId {
        self.last_session_id += 1;
        let id = self.last_session_id;
        self.session = Some(PipelineSession::start(id, query));
        self.selected_step = None;
        self.dirty = true;
        id
    }

    pub(crate) fn apply_event(&mut self, event: PipelineEvent) {
        let Some(session) = self.session.take() else {
            return;
        };
        let before = session.clone();
        let next = fold(session, event);
        if next.current_step != before.current_step {
            if let Ok(step) = StepId::try_from(next.current_step) {
                self.selected_step = Some(step);
            }
        }
        if next != before {
            self.dirty = true;
        }
        self.session = Some(next);
    }

    /// Transport failure: keeps a structured error message if one was already recorded.
    pub(crate) fn apply_connection_lost(&mut self, message: &str) {
        if let Some(session) = self.session.as_mut() {
            // Terminal sessions are frozen; a structured error is never overwritten.
            if session.connection_state().is_terminal() {
                return;
            }
            let message = session
                .error_message()
                .map_or_else(|| message.to_string(), str::to_string);
            session.fail(message, None);
            self.dirty = true;
        }
    }

    pub(crate) fn select_step(&mut self, step: StepId) -> bool {
        let selectable = self
            .session
            .as_ref()
            .is_some_and(|session| session.status(step).has_started());
        if selectable && self.selected_step() != step {
            self.selected_step = Some(step);
            self.dirty = true;
        }
        selectable
    }

    pub(crate) fn tear_down(&mut self) {
        self.torn_down = true;
    }
}
