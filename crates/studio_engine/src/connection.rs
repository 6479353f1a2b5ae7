use std::sync::{mpsc, Arc, Mutex, PoisonError};

use engine_logging::{engine_debug, engine_info, engine_warn};
use tokio::runtime::Handle;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::stream::{EventStreamer, FrameSink, StreamEnd, StreamSettings};
use crate::{EngineEvent, SessionId, SseFrame};

/// Owns the single live stream connection.
///
/// Opening always releases the previous connection first. Once a connection
/// is released its sink is detached under a lock, so no event from it can be
/// delivered after `close` returns, even if its task is still unwinding.
pub struct ConnectionManager {
    runtime: Handle,
    streamer: Arc<dyn EventStreamer>,
    settings: StreamSettings,
    events: mpsc::Sender<EngineEvent>,
    active: Option<ActiveConnection>,
}

struct ActiveConnection {
    session: SessionId,
    outlet: Arc<Outlet>,
    _cancel_on_drop: DropGuard,
}

impl Drop for ActiveConnection {
    fn drop(&mut self) {
        self.outlet.detach();
    }
}

impl ConnectionManager {
    pub fn new(
        runtime: Handle,
        streamer: Arc<dyn EventStreamer>,
        settings: StreamSettings,
        events: mpsc::Sender<EngineEvent>,
    ) -> Self {
        Self {
            runtime,
            streamer,
            settings,
            events,
            active: None,
        }
    }

    /// Opens the stream for `query` on behalf of `session`. An empty query is a no-op.
    pub fn open(&mut self, session: SessionId, query: &str) {
        let query = query.trim();
        if query.is_empty() {
            engine_debug!("Ignoring open for session {} with empty query", session);
            return;
        }

        self.close();

        let outlet = Arc::new(Outlet::new(session, self.events.clone()));
        let url = match self.settings.endpoint_for(query) {
            Ok(url) => url,
            Err(error) => {
                engine_warn!("Cannot build stream url for session {}: {}", session, error);
                outlet.lost(error);
                return;
            }
        };

        let cancel = CancellationToken::new();
        engine_info!("Opening stream session={} url={}", session, url);
        self.runtime.spawn(run_connection(
            self.streamer.clone(),
            url,
            outlet.clone(),
            cancel.clone(),
        ));
        self.active = Some(ActiveConnection {
            session,
            outlet,
            _cancel_on_drop: cancel.drop_guard(),
        });
    }

    /// Releases the live connection, if any. Safe to call repeatedly.
    pub fn close(&mut self) {
        if let Some(active) = self.active.take() {
            engine_info!("Closing stream session={}", active.session);
        }
    }

    /// Releases the live connection only if it belongs to `session`.
    pub fn close_session(&mut self, session: SessionId) {
        if self.active_session() == Some(session) {
            self.close();
        } else {
            engine_debug!("Close for session {} ignored; not the live connection", session);
        }
    }

    pub fn active_session(&self) -> Option<SessionId> {
        self.active.as_ref().map(|active| active.session)
    }
}

async fn run_connection(
    streamer: Arc<dyn EventStreamer>,
    url: url::Url,
    outlet: Arc<Outlet>,
    cancel: CancellationToken,
) {
    let session = outlet.session;
    match streamer.stream(url, outlet.as_ref(), &cancel).await {
        Ok(StreamEnd::Terminal) => {
            engine_debug!("Stream session={} reached its terminal event", session);
        }
        Ok(StreamEnd::Cancelled) => {
            engine_debug!("Stream session={} cancelled", session);
        }
        Err(error) => {
            if cancel.is_cancelled() {
                return;
            }
            engine_warn!("Stream session={} lost: {}", session, error);
            outlet.lost(error);
        }
    }
}

/// Gated path from one connection to the engine's event channel.
struct Outlet {
    session: SessionId,
    tx: Mutex<Option<mpsc::Sender<EngineEvent>>>,
}

impl Outlet {
    fn new(session: SessionId, tx: mpsc::Sender<EngineEvent>) -> Self {
        Self {
            session,
            tx: Mutex::new(Some(tx)),
        }
    }

    fn send(&self, event: EngineEvent) -> bool {
        let guard = self.tx.lock().unwrap_or_else(PoisonError::into_inner);
        match guard.as_ref() {
            Some(tx) => tx.send(event).is_ok(),
            None => false,
        }
    }

    fn lost(&self, error: crate::StreamError) {
        self.send(EngineEvent::ConnectionLost {
            session: self.session,
            error,
        });
    }

    fn detach(&self) {
        self.tx.lock().unwrap_or_else(PoisonError::into_inner).take();
    }
}

impl FrameSink for Outlet {
    fn emit(&self, frame: SseFrame) -> bool {
        self.send(EngineEvent::Frame {
            session: self.session,
            frame,
        })
    }
}
