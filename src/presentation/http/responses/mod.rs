use poem_openapi::{ApiResponse, Object, payload::Json};
use uuid::Uuid;

use crate::presentation::models::MessageStatusDto;

#[derive(Object)]
#[oai(rename_all = "snake_case")]
pub struct MessageDto {
    pub id: Uuid,
    pub destination: String,
    pub content: String,
    pub status: MessageStatusDto,
    pub delivery_id: Option<String>,
    pub scheduled_at: String,
    pub sent_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(ApiResponse)]
pub enum CreateMessageResponse {
    #[oai(status = 201)]
    Created(Json<MessageDto>),
}

#[derive(Object)]
#[oai(rename_all = "snake_case")]
pub struct ControlResponseDto {
    pub message: String,
    /// Whether the call changed the state of the dispatch loop.
    pub changed: bool,
}

#[derive(Object)]
#[oai(rename_all = "snake_case")]
pub struct MessagingStatusDto {
    pub running: bool,
    pub interval_seconds: u64,
    pub batch_size: u32,
    pub cycles: u64,
    pub sent: u64,
    /// Delivered after the message was cancelled.
    pub superseded: u64,
    pub failed: u64,
    pub errors: u64,
}

#[derive(Object)]
#[oai(rename_all = "snake_case")]
pub struct DeliveryDto {
    pub delivery_id: String,
    pub sent_at: String,
}
