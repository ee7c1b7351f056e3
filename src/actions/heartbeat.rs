//! The periodic health heartbeat.

use std::{env, sync::Arc};

use chrono::{DateTime, Utc};
use reqwest_middleware::ClientWithMiddleware;
use serde::Serialize;
use url::Url;

use super::error::ActionError;

/// JSON body posted to the heartbeat endpoint.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HeartbeatPayload {
    /// Time the heartbeat was produced.
    pub timestamp: DateTime<Utc>,
    /// Always `"healthy"`: a heartbeat is only sent when the gate allows it.
    pub status: &'static str,
    /// Whether the monitored process was confirmed running this cycle.
    pub process_running: bool,
    /// Lifetime count of recordings processed since monitor start.
    pub audio_files_processed: u64,
    /// The user the watchdog runs as.
    pub username: String,
}

/// Resolves the current username from the environment.
pub fn current_username() -> String {
    env::var("USER")
        .or_else(|_| env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string())
}

/// Sends heartbeats to the configured endpoint.
///
/// A failed send is logged by the caller and never raises an alert: the
/// receiving end observes the absence of heartbeats instead.
#[derive(Debug, Clone)]
pub struct HeartbeatSender {
    url: Url,
    client: Arc<ClientWithMiddleware>,
}

impl HeartbeatSender {
    /// Creates a sender posting to `url`.
    pub fn new(url: Url, client: Arc<ClientWithMiddleware>) -> Self {
        Self { url, client }
    }

    /// Posts one heartbeat. Success is any non-error HTTP status.
    pub async fn send(&self, payload: &HeartbeatPayload) -> Result<(), ActionError> {
        let response = self
            .client
            .post(self.url.clone())
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(ActionError::HeartbeatRejected(status));
        }

        tracing::info!(status = %status, "Heartbeat sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_client::{HttpRetryConfig, create_retryable_http_client};

    fn sender(url: &str) -> HeartbeatSender {
        let client = create_retryable_http_client(&HttpRetryConfig {
            max_retries: 0,
            ..HttpRetryConfig::default()
        })
        .unwrap();
        HeartbeatSender::new(Url::parse(url).unwrap(), Arc::new(client))
    }

    fn payload() -> HeartbeatPayload {
        HeartbeatPayload {
            timestamp: Utc::now(),
            status: "healthy",
            process_running: true,
            audio_files_processed: 3,
            username: "radio".to_string(),
        }
    }

    #[tokio::test]
    async fn test_send_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/heartbeat")
            .match_header("content-type", "application/json")
            .with_status(200)
            .create_async()
            .await;

        let result = sender(&format!("{}/heartbeat", server.url()))
            .send(&payload())
            .await;

        assert!(result.is_ok());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_status_is_rejected() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/heartbeat")
            .with_status(500)
            .create_async()
            .await;

        let result = sender(&format!("{}/heartbeat", server.url()))
            .send(&payload())
            .await;

        assert!(matches!(result, Err(ActionError::HeartbeatRejected(_))));
    }

    #[test]
    fn test_payload_serializes_expected_fields() {
        let value = serde_json::to_value(payload()).unwrap();
        assert_eq!(value["status"], "healthy");
        assert_eq!(value["process_running"], true);
        assert_eq!(value["audio_files_processed"], 3);
        assert_eq!(value["username"], "radio");
        assert!(value.get("timestamp").is_some());
    }
}
