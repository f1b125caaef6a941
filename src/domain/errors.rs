use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Entity not found: {0}")]
    NotFound(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Operation not allowed: {0}")]
    Conflict(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Why a delivery channel refused or could not complete a send.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("unexpected response status {status}: {reason}")]
    Rejected { status: u16, reason: String },
    #[error("malformed response body: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("failed to select due messages")]
    Selection(#[source] anyhow::Error),
    #[error("delivery of message {message_id} failed")]
    Delivery {
        message_id: Uuid,
        #[source]
        source: DeliveryError,
    },
    #[error("failed to persist outcome of message {message_id}")]
    Persistence {
        message_id: Uuid,
        #[source]
        source: anyhow::Error,
    },
}
