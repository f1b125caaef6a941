use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{
    models::{Message, MessageStatus, NewMessage},
    repositories::MessageRepository,
};

#[derive(Default)]
pub struct InMemoryMessageRepository {
    messages: Arc<RwLock<HashMap<Uuid, Message>>>,
}

impl InMemoryMessageRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn oldest_first(messages: &mut [Message]) {
    messages.sort_by(|a, b| {
        a.scheduled_at
            .cmp(&b.scheduled_at)
            .then(a.created_at.cmp(&b.created_at))
    });
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn create(&self, message: NewMessage) -> anyhow::Result<Message> {
        let now = Utc::now();
        let entry = Message {
            id: Uuid::new_v4(),
            destination: message.destination,
            content: message.content,
            status: MessageStatus::Pending,
            delivery_id: None,
            scheduled_at: message.scheduled_at,
            sent_at: None,
            created_at: now,
            updated_at: now,
        };
        let mut messages = self.messages.write().await;
        messages.insert(entry.id, entry.clone());
        Ok(entry)
    }

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Message>> {
        let messages = self.messages.read().await;
        Ok(messages.get(&id).cloned())
    }

    async fn list(&self) -> anyhow::Result<Vec<Message>> {
        let messages = self.messages.read().await;
        let mut all: Vec<Message> = messages.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn find_by_status(&self, status: MessageStatus) -> anyhow::Result<Vec<Message>> {
        let messages = self.messages.read().await;
        let mut found: Vec<Message> = messages
            .values()
            .filter(|m| m.status == status)
            .cloned()
            .collect();
        oldest_first(&mut found);
        Ok(found)
    }

    async fn find_pending(
        &self,
        before: DateTime<Utc>,
        limit: u32,
    ) -> anyhow::Result<Vec<Message>> {
        let messages = self.messages.read().await;
        let mut due: Vec<Message> = messages
            .values()
            .filter(|m| m.is_due(before))
            .cloned()
            .collect();
        oldest_first(&mut due);
        due.truncate(limit as usize);
        Ok(due)
    }

    async fn update_status(&self, id: Uuid, status: MessageStatus) -> anyhow::Result<bool> {
        let mut messages = self.messages.write().await;
        match messages.get_mut(&id) {
            Some(entry) if entry.status.can_transition_to(status) => {
                entry.status = status;
                entry.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_sent(
        &self,
        id: Uuid,
        delivery_id: &str,
        sent_at: DateTime<Utc>,
    ) -> anyhow::Result<bool> {
        let mut messages = self.messages.write().await;
        match messages.get_mut(&id) {
            Some(entry) if entry.status == MessageStatus::Pending => {
                entry.status = MessageStatus::Sent;
                entry.delivery_id = Some(delivery_id.to_string());
                entry.sent_at = Some(sent_at);
                entry.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn update_content(&self, id: Uuid, content: String) -> anyhow::Result<bool> {
        let mut messages = self.messages.write().await;
        match messages.get_mut(&id) {
            Some(entry) if entry.status == MessageStatus::Pending => {
                entry.content = content;
                entry.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn scheduled(offset: Duration) -> NewMessage {
        NewMessage {
            destination: "a@b.com".to_string(),
            content: "hi".to_string(),
            scheduled_at: Utc::now() + offset,
        }
    }

    #[tokio::test]
    async fn find_pending_is_ordered_bounded_and_skips_future() {
        let repo = InMemoryMessageRepository::new();
        let later = repo.create(scheduled(Duration::hours(-1))).await.unwrap();
        let oldest = repo.create(scheduled(Duration::hours(-3))).await.unwrap();
        let middle = repo.create(scheduled(Duration::hours(-2))).await.unwrap();
        repo.create(scheduled(Duration::hours(1))).await.unwrap();

        let due = repo.find_pending(Utc::now(), 10).await.unwrap();
        let ids: Vec<Uuid> = due.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![oldest.id, middle.id, later.id]);

        let bounded = repo.find_pending(Utc::now(), 2).await.unwrap();
        assert_eq!(bounded.len(), 2);
        assert_eq!(bounded[0].id, oldest.id);
    }

    #[tokio::test]
    async fn mark_sent_sets_all_delivery_fields_once() {
        let repo = InMemoryMessageRepository::new();
        let message = repo.create(scheduled(Duration::hours(-1))).await.unwrap();
        let sent_at = Utc::now();

        assert!(repo.mark_sent(message.id, "m-1", sent_at).await.unwrap());
        assert!(!repo.mark_sent(message.id, "m-2", Utc::now()).await.unwrap());

        let stored = repo.get(message.id).await.unwrap().unwrap();
        assert_eq!(stored.status, MessageStatus::Sent);
        assert_eq!(stored.delivery_id.as_deref(), Some("m-1"));
        assert_eq!(stored.sent_at, Some(sent_at));
    }

    #[tokio::test]
    async fn terminal_records_do_not_move() {
        let repo = InMemoryMessageRepository::new();
        let message = repo.create(scheduled(Duration::hours(-1))).await.unwrap();

        assert!(repo
            .update_status(message.id, MessageStatus::Cancelled)
            .await
            .unwrap());
        assert!(!repo
            .update_status(message.id, MessageStatus::Pending)
            .await
            .unwrap());
        assert!(!repo
            .update_status(message.id, MessageStatus::Failed)
            .await
            .unwrap());
        assert!(!repo.mark_sent(message.id, "m-1", Utc::now()).await.unwrap());
        assert!(!repo
            .update_content(message.id, "edited".to_string())
            .await
            .unwrap());

        let stored = repo.get(message.id).await.unwrap().unwrap();
        assert_eq!(stored.status, MessageStatus::Cancelled);
        assert_eq!(stored.content, "hi");
        assert!(repo.find_pending(Utc::now(), 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_ids_are_reported_as_unchanged() {
        let repo = InMemoryMessageRepository::new();
        let id = Uuid::new_v4();
        assert!(repo.get(id).await.unwrap().is_none());
        assert!(!repo.update_status(id, MessageStatus::Failed).await.unwrap());
    }
}
