use std::path::PathBuf;
use std::time::Duration;

use chrono::Local;
use engine_logging::{engine_debug, engine_error, engine_info, engine_warn};
use studio_core::{decode_frame, Effect, Msg};
use studio_engine::{newsletter_filename, EngineEvent, EngineHandle, NewsletterWriter};

/// Executes core effects against the engine and turns engine events back into messages.
pub struct EffectRunner {
    engine: EngineHandle,
    writer: Option<NewsletterWriter>,
    timestamped: bool,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle, output_dir: Option<PathBuf>, timestamped: bool) -> Self {
        Self {
            engine,
            writer: output_dir.map(NewsletterWriter::new),
            timestamped,
        }
    }

    pub fn run(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::OpenStream { session, query } => {
                    engine_info!("OpenStream session={} query_len={}", session, query.len());
                    self.engine.open(session, query);
                }
                Effect::CloseStream { session } => {
                    engine_debug!("CloseStream session={}", session);
                    self.engine.close(session);
                }
                Effect::ReportDiagnostic {
                    session,
                    message,
                    trace,
                } => {
                    engine_error!("Pipeline session {} failed: {}", session, message);
                    if let Some(trace) = trace {
                        engine_error!("Error trace:\n{}", trace);
                    }
                }
            }
        }
    }

    /// Waits up to `timeout` for the next engine event that maps to a message.
    pub fn next_msg(&self, timeout: Duration) -> Option<Msg> {
        self.engine.recv_timeout(timeout).and_then(map_engine_event)
    }

    /// Writes the newsletter if an output directory is configured.
    pub fn save_newsletter(&self, text: &str) -> Option<PathBuf> {
        let writer = self.writer.as_ref()?;
        let stamp = self
            .timestamped
            .then(|| Local::now().format("%Y-%m-%dT%H:%M:%S").to_string());
        match writer.write(&newsletter_filename(stamp.as_deref()), text) {
            Ok(path) => {
                engine_info!("Newsletter written to {:?}", path);
                Some(path)
            }
            Err(err) => {
                engine_error!("Failed to write newsletter: {}", err);
                None
            }
        }
    }
}

pub fn map_engine_event(event: EngineEvent) -> Option<Msg> {
    match event {
        EngineEvent::Frame { session, frame } => match decode_frame(&frame.event, &frame.data) {
            Some(event) => Some(Msg::FrameReceived { session, event }),
            None => {
                engine_debug!("Ignoring '{}' frame on session {}", frame.event, session);
                None
            }
        },
        EngineEvent::ConnectionLost { session, error } => {
            engine_warn!("Connection for session {} lost: {}", session, error);
            Some(Msg::ConnectionLost {
                session,
                reason: error.to_string(),
            })
        }
    }
}
