use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::domain::{
    errors::DomainError,
    models::{Message, MessageStatus},
    repositories::MessageRepository,
};

pub struct CancelMessageUseCase {
    repo: Arc<dyn MessageRepository>,
}

impl CancelMessageUseCase {
    pub fn new(repo: Arc<dyn MessageRepository>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, message_id: Uuid) -> Result<Message, DomainError> {
        let cancelled = self
            .repo
            .update_status(message_id, MessageStatus::Cancelled)
            .await?;

        let message = self
            .repo
            .get(message_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("message {message_id}")))?;

        if !cancelled {
            return Err(DomainError::Conflict(format!(
                "message {message_id} is already {}",
                message.status.as_str()
            )));
        }

        info!(%message_id, "message cancelled");
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::{
        domain::models::NewMessage,
        infrastructure::repositories::in_memory::InMemoryMessageRepository,
    };

    #[tokio::test]
    async fn cancelled_message_is_never_selected() {
        let repo = Arc::new(InMemoryMessageRepository::new());
        let message = repo
            .create(NewMessage {
                destination: "a@b.com".to_string(),
                content: "hi".to_string(),
                scheduled_at: Utc::now() - Duration::hours(1),
            })
            .await
            .unwrap();
        let usecase = CancelMessageUseCase::new(repo.clone());

        let cancelled = usecase.execute(message.id).await.unwrap();

        assert_eq!(cancelled.status, MessageStatus::Cancelled);
        assert!(repo.find_pending(Utc::now(), 10).await.unwrap().is_empty());
        assert!(matches!(
            usecase.execute(message.id).await,
            Err(DomainError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn unknown_message_is_not_found() {
        let usecase = CancelMessageUseCase::new(Arc::new(InMemoryMessageRepository::new()));
        assert!(matches!(
            usecase.execute(Uuid::new_v4()).await,
            Err(DomainError::NotFound(_))
        ));
    }
}
