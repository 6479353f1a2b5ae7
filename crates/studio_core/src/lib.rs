//! Newsletter studio core: pure pipeline-session state machine and snapshot helpers.
mod effect;
mod event;
mod fold;
mod msg;
mod session;
mod state;
mod step;
mod update;
mod view_model;

pub use effect::Effect;
pub use event::{
    decode_frame, PipelineEvent, StepPhase, COMPLETE_EVENT, CONNECTION_LOST_MESSAGE, ERROR_EVENT,
    GENERIC_ERROR_MESSAGE, STEP_EVENT,
};
pub use fold::fold;
pub use msg::Msg;
pub use session::{ConnectionState, PipelineSession, SessionId};
pub use state::AppState;
pub use step::{InvalidStepId, StepId, StepStatus, StepTable};
pub use update::update;
pub use view_model::PipelineSnapshot;
