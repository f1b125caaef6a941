use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, Pool, Postgres};
use uuid::Uuid;

use crate::domain::{
    models::{Message, MessageStatus, NewMessage},
    repositories::MessageRepository,
};

pub type PgPool = Pool<Postgres>;

const MESSAGE_COLUMNS: &str = "id, destination, content, status, delivery_id, scheduled_at, sent_at, created_at, updated_at";

#[derive(Clone)]
pub struct PostgresMessageRepository {
    pool: PgPool,
}

impl PostgresMessageRepository {
    pub fn new(pool: PgPool) -> Arc<Self> {
        Arc::new(Self { pool })
    }
}

#[async_trait]
impl MessageRepository for PostgresMessageRepository {
    async fn create(&self, message: NewMessage) -> anyhow::Result<Message> {
        let now = Utc::now();
        let record = sqlx::query_as::<_, MessageRecord>(&format!(
            r#"
            INSERT INTO messages (
                id, destination, content, status, scheduled_at, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING {MESSAGE_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&message.destination)
        .bind(&message.content)
        .bind(MessageStatus::Pending.as_str())
        .bind(message.scheduled_at)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        record.try_into()
    }

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Message>> {
        let record = sqlx::query_as::<_, MessageRecord>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        record.map(|record| record.try_into()).transpose()
    }

    async fn list(&self) -> anyhow::Result<Vec<Message>> {
        let rows = sqlx::query_as::<_, MessageRecord>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(|record| record.try_into()).collect()
    }

    async fn find_by_status(&self, status: MessageStatus) -> anyhow::Result<Vec<Message>> {
        let rows = sqlx::query_as::<_, MessageRecord>(&format!(
            r#"
            SELECT {MESSAGE_COLUMNS}
            FROM messages
            WHERE status = $1
            ORDER BY scheduled_at ASC, created_at ASC
            "#
        ))
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(|record| record.try_into()).collect()
    }

    async fn find_pending(
        &self,
        before: DateTime<Utc>,
        limit: u32,
    ) -> anyhow::Result<Vec<Message>> {
        let rows = sqlx::query_as::<_, MessageRecord>(&format!(
            r#"
            SELECT {MESSAGE_COLUMNS}
            FROM messages
            WHERE status = 'pending'
              AND scheduled_at <= $1
            ORDER BY scheduled_at ASC, created_at ASC
            LIMIT $2
            "#
        ))
        .bind(before)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(|record| record.try_into()).collect()
    }

    async fn update_status(&self, id: Uuid, status: MessageStatus) -> anyhow::Result<bool> {
        if !MessageStatus::Pending.can_transition_to(status) {
            return Ok(false);
        }
        let result = sqlx::query(
            r#"
            UPDATE messages
            SET status = $2,
                updated_at = $3
            WHERE id = $1
              AND status = 'pending'
            "#,
        )
        .bind(id)
        .bind(status.as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn mark_sent(
        &self,
        id: Uuid,
        delivery_id: &str,
        sent_at: DateTime<Utc>,
    ) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE messages
            SET status = 'sent',
                delivery_id = $2,
                sent_at = $3,
                updated_at = $4
            WHERE id = $1
              AND status = 'pending'
            "#,
        )
        .bind(id)
        .bind(delivery_id)
        .bind(sent_at)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn update_content(&self, id: Uuid, content: String) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE messages
            SET content = $2,
                updated_at = $3
            WHERE id = $1
              AND status = 'pending'
            "#,
        )
        .bind(id)
        .bind(content)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}

#[derive(FromRow)]
struct MessageRecord {
    id: Uuid,
    destination: String,
    content: String,
    status: String,
    delivery_id: Option<String>,
    scheduled_at: DateTime<Utc>,
    sent_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<MessageRecord> for Message {
    type Error = anyhow::Error;

    fn try_from(value: MessageRecord) -> Result<Self, Self::Error> {
        let status: MessageStatus = value.status.parse()?;
        Ok(Self {
            id: value.id,
            destination: value.destination,
            content: value.content,
            status,
            delivery_id: value.delivery_id,
            scheduled_at: value.scheduled_at,
            sent_at: value.sent_at,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(status: &str) -> MessageRecord {
        let now = Utc::now();
        MessageRecord {
            id: Uuid::new_v4(),
            destination: "a@b.com".to_string(),
            content: "hi".to_string(),
            status: status.to_string(),
            delivery_id: None,
            scheduled_at: now,
            sent_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn records_map_to_messages() {
        let message = Message::try_from(record("failed")).unwrap();
        assert_eq!(message.status, MessageStatus::Failed);
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!(Message::try_from(record("scheduled")).is_err());
    }
}
