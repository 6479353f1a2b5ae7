use std::io;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use engine_logging::engine_debug;

use crate::connection::ConnectionManager;
use crate::stream::{EventStreamer, ReqwestStreamer, StreamSettings};
use crate::{EngineEvent, SessionId};

enum EngineCommand {
    Open { session: SessionId, query: String },
    Close { session: SessionId },
}

/// Handle to the background thread that runs stream connections.
///
/// Dropping the handle stops the thread and releases any live connection.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(settings: StreamSettings) -> io::Result<Self> {
        let streamer = Arc::new(ReqwestStreamer::new(settings.clone()));
        Self::with_streamer(settings, streamer)
    }

    pub fn with_streamer(
        settings: StreamSettings,
        streamer: Arc<dyn EventStreamer>,
    ) -> io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()?;
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::Builder::new()
            .name("studio-engine".to_string())
            .spawn(move || {
                let mut connections =
                    ConnectionManager::new(runtime.handle().clone(), streamer, settings, event_tx);
                while let Ok(command) = cmd_rx.recv() {
                    match command {
                        EngineCommand::Open { session, query } => connections.open(session, &query),
                        EngineCommand::Close { session } => connections.close_session(session),
                    }
                }
                engine_debug!("Engine command channel closed; shutting down");
                connections.close();
                drop(connections);
                runtime.shutdown_timeout(Duration::from_secs(1));
            })?;

        Ok(Self { cmd_tx, event_rx })
    }

    pub fn open(&self, session: SessionId, query: impl Into<String>) {
        let _ = self.cmd_tx.send(EngineCommand::Open {
            session,
            query: query.into(),
        });
    }

    pub fn close(&self, session: SessionId) {
        let _ = self.cmd_tx.send(EngineCommand::Close { session });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}
