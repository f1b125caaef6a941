use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::errors::DeliveryError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryRequest {
    pub destination: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    pub delivery_id: String,
    pub message: String,
}

/// Outbound side of the dispatcher. Implementations bound their own latency.
#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    async fn deliver(&self, request: &DeliveryRequest) -> Result<DeliveryReceipt, DeliveryError>;
}
