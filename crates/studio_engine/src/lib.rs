//! Newsletter studio engine: stream connections and effect execution.
mod connection;
mod engine;
mod health;
mod persist;
mod sse;
mod stream;
mod types;

pub use connection::ConnectionManager;
pub use engine::EngineHandle;
pub use health::{check_health, check_health_blocking, HealthStatus};
pub use persist::{ensure_output_dir, newsletter_filename, NewsletterWriter, PersistError};
pub use sse::SseDecoder;
pub use stream::{EventStreamer, FrameSink, ReqwestStreamer, StreamEnd, StreamSettings};
pub use types::{EngineEvent, FailureKind, SessionId, SseFrame, StreamError};
