//! Telegram alert delivery via the Bot API.

use std::sync::Arc;

use reqwest_middleware::ClientWithMiddleware;
use serde_json::json;
use url::Url;

use super::error::ActionError;
use crate::config::TelegramConfig;

/// Default Bot API host. Tests point this at a local server.
pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org/";

/// Sends alert messages to a Telegram channel.
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    endpoint: Url,
    chat_id: String,
    computer_name: String,
    client: Arc<ClientWithMiddleware>,
}

impl TelegramNotifier {
    /// Creates a notifier from the Telegram section of the config.
    pub fn from_config(
        config: &TelegramConfig,
        client: Arc<ClientWithMiddleware>,
    ) -> Result<Self, ActionError> {
        let api_base = Url::parse(TELEGRAM_API_BASE)?;
        Self::with_api_base(&api_base, config, client)
    }

    /// Creates a notifier against an explicit API base URL.
    pub fn with_api_base(
        api_base: &Url,
        config: &TelegramConfig,
        client: Arc<ClientWithMiddleware>,
    ) -> Result<Self, ActionError> {
        // Full-string parse rather than Url::join: a bot token contains a
        // colon, which join would misread as a scheme separator.
        let endpoint = Url::parse(&format!(
            "{}/bot{}/sendMessage",
            api_base.as_str().trim_end_matches('/'),
            config.bot_token
        ))?;
        Ok(Self {
            endpoint,
            chat_id: config.channel_id.clone(),
            computer_name: config.computer_name.clone(),
            client,
        })
    }

    /// Builds the sendMessage body for an alert description.
    ///
    /// The computer name is prefixed so several installations can share one
    /// channel and still be told apart.
    fn build_payload(&self, description: &str) -> serde_json::Value {
        let text = format!("🚨 *{}*\n\n{}", self.computer_name, description);
        json!({
            "chat_id": self.chat_id,
            "text": text,
            "parse_mode": "Markdown",
        })
    }

    /// Posts one alert message.
    pub async fn send(&self, description: &str) -> Result<(), ActionError> {
        let payload = self.build_payload(description);
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ActionError::TelegramRejected { status, body });
        }

        tracing::info!("Telegram alert sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_client::{HttpRetryConfig, create_retryable_http_client};

    fn notifier(api_base: &str) -> TelegramNotifier {
        let client = create_retryable_http_client(&HttpRetryConfig {
            max_retries: 0,
            ..HttpRetryConfig::default()
        })
        .unwrap();
        let config = TelegramConfig {
            enabled: true,
            bot_token: "123:abc".to_string(),
            channel_id: "-1000".to_string(),
            computer_name: "rack-1".to_string(),
        };
        TelegramNotifier::with_api_base(&Url::parse(api_base).unwrap(), &config, Arc::new(client))
            .unwrap()
    }

    #[test]
    fn test_payload_includes_computer_name_and_markdown() {
        let payload = notifier("https://api.telegram.org/").build_payload("decoder is down");
        assert_eq!(payload["chat_id"], "-1000");
        assert_eq!(payload["parse_mode"], "Markdown");
        let text = payload["text"].as_str().unwrap();
        assert!(text.contains("rack-1"));
        assert!(text.contains("decoder is down"));
    }

    #[test]
    fn test_endpoint_embeds_bot_token() {
        let notifier = notifier("https://api.telegram.org/");
        assert_eq!(
            notifier.endpoint.as_str(),
            "https://api.telegram.org/bot123:abc/sendMessage"
        );
    }

    #[tokio::test]
    async fn test_send_posts_to_bot_endpoint() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/bot123:abc/sendMessage")
            .match_header("content-type", "application/json")
            .with_status(200)
            .create_async()
            .await;

        let base = format!("{}/", server.url());
        let result = notifier(&base).send("tuner lost").await;

        assert!(result.is_ok());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_rejection_carries_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/bot123:abc/sendMessage")
            .with_status(400)
            .with_body(r#"{"ok":false,"description":"Bad Request: chat not found"}"#)
            .create_async()
            .await;

        let base = format!("{}/", server.url());
        let result = notifier(&base).send("tuner lost").await;

        match result {
            Err(ActionError::TelegramRejected { status, body }) => {
                assert_eq!(status.as_u16(), 400);
                assert!(body.contains("chat not found"));
            }
            other => panic!("expected TelegramRejected, got {other:?}"),
        }
    }
}
