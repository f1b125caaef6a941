use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{
    errors::DomainError,
    models::{Message, validate_content},
    repositories::MessageRepository,
};

/// Replaces the body of a message that has not been dispatched yet.
pub struct UpdateMessageContentUseCase {
    repo: Arc<dyn MessageRepository>,
}

pub struct UpdateMessageContentRequest {
    pub message_id: Uuid,
    pub content: String,
}

impl UpdateMessageContentUseCase {
    pub fn new(repo: Arc<dyn MessageRepository>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, request: UpdateMessageContentRequest) -> Result<Message, DomainError> {
        validate_content(&request.content)?;

        let updated = self
            .repo
            .update_content(request.message_id, request.content)
            .await?;

        let message = self
            .repo
            .get(request.message_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("message {}", request.message_id)))?;

        if !updated {
            return Err(DomainError::Conflict(format!(
                "message {} is already {}",
                message.id,
                message.status.as_str()
            )));
        }
        Ok(message)
    }
}
