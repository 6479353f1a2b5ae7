//! Decoding of named stream frames into pipeline events.
//!
//! Decoding never fails outward: a frame that cannot be understood becomes an
//! [`PipelineEvent::Error`] carrying [`GENERIC_ERROR_MESSAGE`], so a bad frame
//! terminates the session instead of escaping as a fault.

use serde::Deserialize;
use serde_json::Value;

use crate::StepId;

/// Message used when an error frame carries no usable message, or a frame is malformed.
pub const GENERIC_ERROR_MESSAGE: &str = "An error occurred during processing";

/// Message used when the transport drops without a structured error frame.
pub const CONNECTION_LOST_MESSAGE: &str =
    "Connection to server lost. Please check if the backend is running and try again.";

pub const STEP_EVENT: &str = "step";
pub const COMPLETE_EVENT: &str = "complete";
pub const ERROR_EVENT: &str = "error";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepPhase {
    Processing,
    Completed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    Step {
        step: StepId,
        phase: StepPhase,
        data: Option<Value>,
    },
    Complete,
    Error {
        message: String,
        trace: Option<String>,
    },
}

impl PipelineEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineEvent::Complete | PipelineEvent::Error { .. })
    }

    fn malformed() -> Self {
        PipelineEvent::Error {
            message: GENERIC_ERROR_MESSAGE.to_string(),
            trace: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct StepFrame {
    step: u64,
    status: String,
    #[serde(default)]
    data: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ErrorFrame {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    trace: Option<String>,
}

/// Decode one frame. Returns `None` for event names this client does not consume.
pub fn decode_frame(event: &str, data: &str) -> Option<PipelineEvent> {
    match event {
        STEP_EVENT => Some(decode_step(data)),
        COMPLETE_EVENT => Some(PipelineEvent::Complete),
        ERROR_EVENT => Some(decode_error(data)),
        _ => None,
    }
}

fn decode_step(data: &str) -> PipelineEvent {
    let Ok(frame) = serde_json::from_str::<StepFrame>(data) else {
        return PipelineEvent::malformed();
    };
    let Ok(step) = StepId::try_from(frame.step) else {
        return PipelineEvent::malformed();
    };
    let phase = match frame.status.as_str() {
        "processing" => StepPhase::Processing,
        "completed" => StepPhase::Completed,
        _ => return PipelineEvent::malformed(),
    };
    PipelineEvent::Step {
        step,
        phase,
        data: frame.data,
    }
}

fn decode_error(data: &str) -> PipelineEvent {
    let frame = serde_json::from_str::<ErrorFrame>(data).ok();
    let trace = frame.as_ref().and_then(|f| f.trace.clone());
    let message = frame
        .and_then(|f| f.message)
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_string());
    PipelineEvent::Error { message, trace }
}
