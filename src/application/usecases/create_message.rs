use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::domain::{
    errors::DomainError,
    models::{Message, NewMessage},
    repositories::MessageRepository,
};

pub struct CreateMessageUseCase {
    repo: Arc<dyn MessageRepository>,
}

pub struct CreateMessageRequest {
    pub destination: String,
    pub content: String,
    pub scheduled_at: DateTime<Utc>,
}

impl CreateMessageUseCase {
    pub fn new(repo: Arc<dyn MessageRepository>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, request: CreateMessageRequest) -> Result<Message, DomainError> {
        let message = NewMessage {
            destination: request.destination,
            content: request.content,
            scheduled_at: request.scheduled_at,
        };
        message.validate()?;

        let created = self.repo.create(message).await?;
        info!(message_id = %created.id, scheduled_at = %created.scheduled_at, "message scheduled");
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::models::{MAX_CONTENT_LENGTH, MessageStatus},
        infrastructure::repositories::in_memory::InMemoryMessageRepository,
    };

    fn request(content: String) -> CreateMessageRequest {
        CreateMessageRequest {
            destination: "a@b.com".to_string(),
            content,
            scheduled_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn creates_pending_message() {
        let repo = Arc::new(InMemoryMessageRepository::new());
        let usecase = CreateMessageUseCase::new(repo.clone());

        let message = usecase.execute(request("hi".to_string())).await.unwrap();

        assert_eq!(message.status, MessageStatus::Pending);
        assert!(message.delivery_id.is_none());
        assert!(message.sent_at.is_none());
        assert!(repo.get(message.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn too_long_content_is_rejected_and_not_persisted() {
        let repo = Arc::new(InMemoryMessageRepository::new());
        let usecase = CreateMessageUseCase::new(repo.clone());

        let err = usecase
            .execute(request("x".repeat(MAX_CONTENT_LENGTH + 1)))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Validation(_)));
        assert!(repo.list().await.unwrap().is_empty());
    }
}
