use serde::Deserialize;

use crate::stream::{map_reqwest_error, StreamSettings};
use crate::{FailureKind, StreamError};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl HealthStatus {
    pub fn is_ok(&self) -> bool {
        self.status.eq_ignore_ascii_case("ok")
    }
}

/// Queries the backend's health endpoint.
pub async fn check_health(settings: &StreamSettings) -> Result<HealthStatus, StreamError> {
    let url = settings.health_url()?;
    let client = reqwest::Client::builder()
        .connect_timeout(settings.connect_timeout)
        .timeout(settings.connect_timeout.saturating_mul(2))
        .build()
        .map_err(|err| StreamError::new(FailureKind::Network, err.to_string()))?;

    let response = client.get(url).send().await.map_err(map_reqwest_error)?;
    let status = response.status();
    if !status.is_success() {
        return Err(StreamError::new(
            FailureKind::HttpStatus(status.as_u16()),
            status.to_string(),
        ));
    }
    let body = response.bytes().await.map_err(map_reqwest_error)?;
    serde_json::from_slice(&body)
        .map_err(|err| StreamError::new(FailureKind::InvalidResponse, err.to_string()))
}

/// Blocking variant for callers without a runtime.
pub fn check_health_blocking(settings: &StreamSettings) -> Result<HealthStatus, StreamError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| StreamError::new(FailureKind::Network, err.to_string()))?;
    runtime.block_on(check_health(settings))
}
