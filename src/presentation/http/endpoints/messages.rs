use std::sync::Arc;

use poem::Result as PoemResult;
use poem_openapi::{
    OpenApi,
    param::{Path, Query},
    payload::Json,
};
use uuid::Uuid;

use crate::{
    application::usecases::{
        create_message::CreateMessageRequest, update_message::UpdateMessageContentRequest,
    },
    presentation::{
        http::{
            domain_error,
            endpoints::root::{ApiState, EndpointsTags},
            mappers::map_message,
            requests::{CreateMessageRequestDto, UpdateMessageContentRequestDto},
            responses::{CreateMessageResponse, MessageDto},
        },
        models::MessageStatusDto,
    },
};

#[derive(Clone)]
pub struct MessagesEndpoints {
    state: Arc<ApiState>,
}

impl MessagesEndpoints {
    pub fn new(state: Arc<ApiState>) -> Self {
        Self { state }
    }
}

#[OpenApi]
impl MessagesEndpoints {
    /// Schedule a message for delivery
    #[oai(path = "/messages", method = "post", tag = EndpointsTags::Messages)]
    pub async fn create_message(
        &self,
        request: Json<CreateMessageRequestDto>,
    ) -> PoemResult<CreateMessageResponse> {
        let request = request.0;
        let message = self
            .state
            .create_message_usecase
            .execute(CreateMessageRequest {
                destination: request.destination,
                content: request.content,
                scheduled_at: request.scheduled_at,
            })
            .await
            .map_err(domain_error)?;

        Ok(CreateMessageResponse::Created(Json(map_message(&message))))
    }

    /// List messages, optionally filtered by status
    #[oai(path = "/messages", method = "get", tag = EndpointsTags::Messages)]
    pub async fn list_messages(
        &self,
        status: Query<Option<MessageStatusDto>>,
    ) -> PoemResult<Json<Vec<MessageDto>>> {
        let messages = self
            .state
            .list_messages_usecase
            .execute(status.0.map(Into::into))
            .await
            .map_err(domain_error)?;

        Ok(Json(messages.iter().map(map_message).collect()))
    }

    #[oai(path = "/messages/:message_id", method = "get", tag = EndpointsTags::Messages)]
    pub async fn get_message(&self, message_id: Path<Uuid>) -> PoemResult<Json<MessageDto>> {
        let message = self
            .state
            .get_message_usecase
            .execute(message_id.0)
            .await
            .map_err(domain_error)?;

        Ok(Json(map_message(&message)))
    }

    /// Replace the content of a pending message
    #[oai(
        path = "/messages/:message_id/content",
        method = "put",
        tag = EndpointsTags::Messages,
    )]
    pub async fn update_content(
        &self,
        message_id: Path<Uuid>,
        request: Json<UpdateMessageContentRequestDto>,
    ) -> PoemResult<Json<MessageDto>> {
        let message = self
            .state
            .update_message_usecase
            .execute(UpdateMessageContentRequest {
                message_id: message_id.0,
                content: request.0.content,
            })
            .await
            .map_err(domain_error)?;

        Ok(Json(map_message(&message)))
    }

    /// Cancel a pending message
    #[oai(
        path = "/messages/:message_id/cancel",
        method = "post",
        tag = EndpointsTags::Messages,
    )]
    pub async fn cancel_message(&self, message_id: Path<Uuid>) -> PoemResult<Json<MessageDto>> {
        let message = self
            .state
            .cancel_message_usecase
            .execute(message_id.0)
            .await
            .map_err(domain_error)?;

        Ok(Json(map_message(&message)))
    }
}
