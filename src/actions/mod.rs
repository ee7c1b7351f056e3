//! Outbound actions: the heartbeat and the Telegram alert channel.

pub mod error;
pub mod heartbeat;
pub mod telegram;

use std::sync::Arc;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use reqwest_middleware::ClientWithMiddleware;

pub use error::ActionError;
pub use heartbeat::{HeartbeatPayload, HeartbeatSender, current_username};
pub use telegram::{TELEGRAM_API_BASE, TelegramNotifier};

use crate::{config::MonitorConfig, models::Condition};

/// The orchestrator's outlet for everything that leaves the process.
///
/// Sits behind a trait so cycle tests can record dispatches instead of
/// performing network calls.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ActionDispatcher: Send + Sync {
    /// Sends the healthy heartbeat.
    async fn send_heartbeat(&self, payload: &HeartbeatPayload) -> Result<(), ActionError>;

    /// Sends one out-of-band alert for a newly activated condition.
    async fn send_alert(&self, condition: &Condition) -> Result<(), ActionError>;
}

/// Dispatcher backed by real HTTP: heartbeat POST plus optional Telegram.
pub struct HttpActionDispatcher {
    heartbeat: HeartbeatSender,
    telegram: Option<TelegramNotifier>,
}

impl HttpActionDispatcher {
    /// Wires the dispatcher from the loaded configuration.
    ///
    /// When `telegram.enabled` is false no notifier is constructed at all:
    /// the deduplicator upstream still tracks condition state, but alerts
    /// stop here without a network call.
    pub fn from_config(
        config: &MonitorConfig,
        client: Arc<ClientWithMiddleware>,
    ) -> Result<Self, ActionError> {
        let heartbeat = HeartbeatSender::new(config.heartbeat_url.clone(), client.clone());
        let telegram = if config.telegram.enabled {
            Some(TelegramNotifier::from_config(&config.telegram, client)?)
        } else {
            None
        };
        Ok(Self { heartbeat, telegram })
    }

    /// Replaces the Telegram notifier, used by tests to aim at a local server.
    pub fn with_telegram(mut self, telegram: Option<TelegramNotifier>) -> Self {
        self.telegram = telegram;
        self
    }
}

#[async_trait]
impl ActionDispatcher for HttpActionDispatcher {
    async fn send_heartbeat(&self, payload: &HeartbeatPayload) -> Result<(), ActionError> {
        self.heartbeat.send(payload).await
    }

    async fn send_alert(&self, condition: &Condition) -> Result<(), ActionError> {
        match &self.telegram {
            Some(notifier) => notifier.send(&condition.description).await,
            None => {
                tracing::debug!(condition = %condition.id, "Telegram disabled, alert not delivered");
                Ok(())
            }
        }
    }
}
