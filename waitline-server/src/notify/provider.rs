//! Messaging provider abstraction
//!
//! One trait, two implementations: the HTTP gateway used in production and
//! an in-memory mock for tests. Both return the provider's message id so
//! delivery callbacks can be correlated later.

use async_trait::async_trait;
use serde::Deserialize;
use shared::models::Channel;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Gateway request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Gateway rejected message: {status} {body}")]
    Rejected { status: u16, body: String },
}

/// Successful hand-off to the provider. Says nothing about delivery to the
/// handset; that arrives later via webhook, if at all.
#[derive(Debug, Clone)]
pub struct ProviderReceipt {
    pub message_id: String,
}

#[async_trait]
pub trait NotificationProvider: Send + Sync {
    async fn send(
        &self,
        channel: Channel,
        to: &str,
        body: &str,
    ) -> Result<ProviderReceipt, ProviderError>;
}

/// Messaging gateway over plain HTTP: `POST {base_url}/messages` with a JSON
/// payload, message id in the JSON response
pub struct HttpGatewayProvider {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct GatewayResponse {
    message_id: String,
}

impl HttpGatewayProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl NotificationProvider for HttpGatewayProvider {
    async fn send(
        &self,
        channel: Channel,
        to: &str,
        body: &str,
    ) -> Result<ProviderReceipt, ProviderError> {
        let resp = self
            .client
            .post(format!("{}/messages", self.base_url))
            .json(&serde_json::json!({
                "channel": channel,
                "to": to,
                "body": body,
            }))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ProviderError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GatewayResponse = resp.json().await?;
        Ok(ProviderReceipt {
            message_id: parsed.message_id,
        })
    }
}

/// Stand-in when no gateway is configured: every send fails with a clear
/// message, which surfaces on the channel for the operator to see
pub struct DisabledProvider;

#[async_trait]
impl NotificationProvider for DisabledProvider {
    async fn send(
        &self,
        _channel: Channel,
        _to: &str,
        _body: &str,
    ) -> Result<ProviderReceipt, ProviderError> {
        Err(ProviderError::Rejected {
            status: 0,
            body: "messaging gateway not configured".to_string(),
        })
    }
}
