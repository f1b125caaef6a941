use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, header::CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    application::services::delivery::{DeliveryChannel, DeliveryReceipt, DeliveryRequest},
    domain::errors::DeliveryError,
};

const AUTH_HEADER: &str = "x-ins-auth-key";
/// Delivery id reported for `202 Accepted`, which carries no body.
pub const ACCEPTED_DELIVERY_ID: &str = "accepted";

#[derive(Debug, Clone)]
pub struct WebhookConfig {
    pub url: String,
    pub auth_key: String,
    pub timeout: Duration,
}

pub struct WebhookClient {
    http: Client,
    config: WebhookConfig,
}

impl WebhookClient {
    pub fn new(config: WebhookConfig) -> anyhow::Result<Arc<Self>> {
        let http = Client::builder()
            .user_agent("auto-messaging/webhook")
            .timeout(config.timeout)
            .build()?;
        Ok(Arc::new(Self { http, config }))
    }
}

#[derive(Debug, Serialize)]
struct WebhookRequest<'a> {
    to: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct WebhookResponse {
    #[serde(default)]
    message: String,
    #[serde(rename = "messageId", alias = "message_id")]
    message_id: String,
}

#[async_trait]
impl DeliveryChannel for WebhookClient {
    async fn deliver(&self, request: &DeliveryRequest) -> Result<DeliveryReceipt, DeliveryError> {
        let payload = WebhookRequest {
            to: &request.destination,
            content: &request.content,
        };

        debug!(url = %self.config.url, to = %request.destination, "sending webhook request");
        let response = self
            .http
            .post(&self.config.url)
            .header(CONTENT_TYPE, "application/json")
            .header(AUTH_HEADER, &self.config.auth_key)
            .json(&payload)
            .send()
            .await
            .map_err(|err| DeliveryError::Transport(err.to_string()))?;

        let status = response.status();
        debug!(%status, "webhook responded");

        if !status.is_success() {
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
                reason: status
                    .canonical_reason()
                    .unwrap_or("unknown status")
                    .to_string(),
            });
        }

        if status == StatusCode::ACCEPTED {
            return Ok(DeliveryReceipt {
                delivery_id: ACCEPTED_DELIVERY_ID.to_string(),
                message: "Message accepted".to_string(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| DeliveryError::Transport(err.to_string()))?;
        let parsed: WebhookResponse = serde_json::from_slice(&body)
            .map_err(|err| DeliveryError::MalformedResponse(err.to_string()))?;

        if parsed.message_id.trim().is_empty() {
            return Err(DeliveryError::MalformedResponse(
                "response carries an empty message id".to_string(),
            ));
        }

        Ok(DeliveryReceipt {
            delivery_id: parsed.message_id,
            message: parsed.message,
        })
    }
}
