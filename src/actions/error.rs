//! Errors produced by outbound notification calls.

use thiserror::Error;

/// Errors that can occur while dispatching a heartbeat or alert.
///
/// All of these are transient at the cycle level: the orchestrator logs them
/// and moves on, and the next cycle decides whether to alert again.
#[derive(Debug, Error)]
pub enum ActionError {
    /// The request failed in the client or retry middleware.
    #[error("Request failed: {0}")]
    Request(#[from] reqwest_middleware::Error),

    /// The request failed at the transport layer.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The heartbeat endpoint answered with an error status.
    #[error("Heartbeat rejected with status {0}")]
    HeartbeatRejected(reqwest::StatusCode),

    /// The Telegram Bot API answered with an error status.
    #[error("Telegram sendMessage rejected with status {status}: {body}")]
    TelegramRejected {
        /// HTTP status returned by the Bot API.
        status: reqwest::StatusCode,
        /// Response body, which carries Telegram's error description.
        body: String,
    },

    /// An endpoint URL could not be constructed.
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
}
