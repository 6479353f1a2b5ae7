use std::time::Duration;

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use reqwest::header::{ACCEPT, CACHE_CONTROL, CONTENT_TYPE};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::sse::SseDecoder;
use crate::{FailureKind, SseFrame, StreamError};

const EVENT_STREAM: &str = "text/event-stream";
const SEARCH_PATH: &str = "/api/search";
const HEALTH_PATH: &str = "/api/health";

#[derive(Debug, Clone)]
pub struct StreamSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    /// Give up when no bytes arrive for this long. `None` waits indefinitely.
    pub idle_timeout: Option<Duration>,
    /// Event names after which the server sends nothing further.
    pub terminal_events: Vec<String>,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            connect_timeout: Duration::from_secs(10),
            idle_timeout: None,
            terminal_events: vec!["complete".to_string(), "error".to_string()],
        }
    }
}

impl StreamSettings {
    /// Stream endpoint for `query`, with the query form-urlencoded.
    pub fn endpoint_for(&self, query: &str) -> Result<Url, StreamError> {
        let mut url = self.join(SEARCH_PATH)?;
        url.query_pairs_mut().clear().append_pair("query", query);
        Ok(url)
    }

    pub fn health_url(&self) -> Result<Url, StreamError> {
        self.join(HEALTH_PATH)
    }

    pub fn is_terminal(&self, event: &str) -> bool {
        self.terminal_events.iter().any(|name| name == event)
    }

    fn join(&self, path: &str) -> Result<Url, StreamError> {
        let base = Url::parse(self.base_url.trim_end_matches('/'))
            .map_err(|err| StreamError::new(FailureKind::InvalidUrl, err.to_string()))?;
        base.join(path)
            .map_err(|err| StreamError::new(FailureKind::InvalidUrl, err.to_string()))
    }
}

/// Receives decoded frames. Returns `false` once the receiver is gone, which
/// ends the stream.
pub trait FrameSink: Send + Sync {
    fn emit(&self, frame: SseFrame) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    /// A terminal event was forwarded.
    Terminal,
    /// The caller cancelled or the sink detached.
    Cancelled,
}

#[async_trait::async_trait]
pub trait EventStreamer: Send + Sync {
    async fn stream(
        &self,
        url: Url,
        sink: &dyn FrameSink,
        cancel: &CancellationToken,
    ) -> Result<StreamEnd, StreamError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestStreamer {
    settings: StreamSettings,
}

impl ReqwestStreamer {
    pub fn new(settings: StreamSettings) -> Self {
        Self { settings }
    }

    fn build_client(&self) -> Result<reqwest::Client, StreamError> {
        // No overall request timeout: the response body is the long-lived stream.
        reqwest::Client::builder()
            .connect_timeout(self.settings.connect_timeout)
            .build()
            .map_err(|err| StreamError::new(FailureKind::Network, err.to_string()))
    }

    async fn pump(
        &self,
        mut body: impl Stream<Item = reqwest::Result<Bytes>> + Unpin,
        sink: &dyn FrameSink,
        cancel: &CancellationToken,
    ) -> Result<StreamEnd, StreamError> {
        let mut decoder = SseDecoder::new();
        loop {
            let chunk = tokio::select! {
                _ = cancel.cancelled() => return Ok(StreamEnd::Cancelled),
                chunk = next_chunk(&mut body, self.settings.idle_timeout) => chunk?,
            };
            let Some(chunk) = chunk else {
                let detail = if decoder.has_partial_frame() {
                    "connection closed mid-frame"
                } else {
                    "connection closed"
                };
                return Err(StreamError::new(FailureKind::EndOfStream, detail));
            };

            for frame in decoder.feed(&chunk) {
                let terminal = self.settings.is_terminal(&frame.event);
                if !sink.emit(frame) {
                    return Ok(StreamEnd::Cancelled);
                }
                if terminal {
                    return Ok(StreamEnd::Terminal);
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl EventStreamer for ReqwestStreamer {
    async fn stream(
        &self,
        url: Url,
        sink: &dyn FrameSink,
        cancel: &CancellationToken,
    ) -> Result<StreamEnd, StreamError> {
        let client = self.build_client()?;
        let request = client
            .get(url)
            .header(ACCEPT, EVENT_STREAM)
            .header(CACHE_CONTROL, "no-cache")
            .send();

        let response = tokio::select! {
            _ = cancel.cancelled() => return Ok(StreamEnd::Cancelled),
            response = request => response.map_err(map_reqwest_error)?,
        };

        let status = response.status();
        if !status.is_success() {
            return Err(StreamError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !is_event_stream(&content_type) {
            return Err(StreamError::new(
                FailureKind::UnsupportedContentType { content_type },
                "expected an event stream",
            ));
        }

        self.pump(Box::pin(response.bytes_stream()), sink, cancel).await
    }
}

async fn next_chunk(
    body: &mut (impl Stream<Item = reqwest::Result<Bytes>> + Unpin),
    idle_timeout: Option<Duration>,
) -> Result<Option<Bytes>, StreamError> {
    let next = match idle_timeout {
        Some(after) => tokio::time::timeout(after, body.next())
            .await
            .map_err(|_| StreamError::new(FailureKind::IdleTimeout { after }, "stream stalled"))?,
        None => body.next().await,
    };
    next.transpose().map_err(map_reqwest_error)
}

fn is_event_stream(content_type: &str) -> bool {
    let mime = content_type.split(';').next().unwrap_or(content_type).trim();
    mime.eq_ignore_ascii_case(EVENT_STREAM)
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> StreamError {
    if err.is_timeout() && err.is_connect() {
        return StreamError::new(FailureKind::ConnectTimeout, err.to_string());
    }
    if err.is_decode() {
        return StreamError::new(FailureKind::InvalidResponse, err.to_string());
    }
    StreamError::new(FailureKind::Network, err.to_string())
}
