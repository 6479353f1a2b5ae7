use crate::{PipelineEvent, SessionId, StepId};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// User submitted a search query.
    QuerySubmitted(String),
    /// User asked to re-run the current query from scratch.
    RetryClicked,
    /// A decoded frame arrived on the connection opened for `session`.
    FrameReceived {
        session: SessionId,
        event: PipelineEvent,
    },
    /// The connection opened for `session` dropped without a terminal frame.
    ConnectionLost { session: SessionId, reason: String },
    /// User picked a step to display.
    StepSelected(StepId),
    /// Consumer is going away; release the connection.
    Shutdown,
    /// UI/render tick to coalesce rendering.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
