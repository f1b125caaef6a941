use std::sync::Arc;

use crate::domain::{
    errors::DomainError,
    models::{Message, MessageStatus},
    repositories::MessageRepository,
};

pub struct ListMessagesUseCase {
    repo: Arc<dyn MessageRepository>,
}

impl ListMessagesUseCase {
    pub fn new(repo: Arc<dyn MessageRepository>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, status: Option<MessageStatus>) -> Result<Vec<Message>, DomainError> {
        let messages = match status {
            Some(status) => self.repo.find_by_status(status).await?,
            None => self.repo.list().await?,
        };
        Ok(messages)
    }
}
