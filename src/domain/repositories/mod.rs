use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::models::{Message, MessageStatus, NewMessage};

/// Durable store of message records and the only source of truth for `status`.
///
/// Every mutating call is conditional on the stored record still being
/// `pending` and reports whether a row was changed.
#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn create(&self, message: NewMessage) -> anyhow::Result<Message>;

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Message>>;

    async fn list(&self) -> anyhow::Result<Vec<Message>>;

    async fn find_by_status(&self, status: MessageStatus) -> anyhow::Result<Vec<Message>>;

    /// Pending records with `scheduled_at <= before`, oldest first, at most `limit`.
    async fn find_pending(
        &self,
        before: DateTime<Utc>,
        limit: u32,
    ) -> anyhow::Result<Vec<Message>>;

    /// Moves a pending record into `status`.
    async fn update_status(&self, id: Uuid, status: MessageStatus) -> anyhow::Result<bool>;

    /// Records a successful delivery: `status`, `delivery_id` and `sent_at` in one write.
    async fn mark_sent(
        &self,
        id: Uuid,
        delivery_id: &str,
        sent_at: DateTime<Utc>,
    ) -> anyhow::Result<bool>;

    async fn update_content(&self, id: Uuid, content: String) -> anyhow::Result<bool>;
}
