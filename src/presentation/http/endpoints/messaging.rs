use std::sync::Arc;

use poem::Result as PoemResult;
use poem_openapi::{OpenApi, param::Path, payload::Json};

use crate::{
    domain::models::MessageStatus,
    presentation::http::{
        domain_error,
        endpoints::root::{ApiState, EndpointsTags},
        mappers::{map_delivery, map_message, map_status},
        responses::{ControlResponseDto, DeliveryDto, MessageDto, MessagingStatusDto},
    },
};

#[derive(Clone)]
pub struct MessagingEndpoints {
    state: Arc<ApiState>,
}

impl MessagingEndpoints {
    pub fn new(state: Arc<ApiState>) -> Self {
        Self { state }
    }
}

#[OpenApi]
impl MessagingEndpoints {
    /// Start automatic message sending
    #[oai(path = "/messaging/start", method = "post", tag = EndpointsTags::Messaging)]
    pub async fn start(&self) -> Json<ControlResponseDto> {
        let changed = self.state.scheduler.start();
        Json(ControlResponseDto {
            message: if changed {
                "Messaging started"
            } else {
                "Messaging already running"
            }
            .to_string(),
            changed,
        })
    }

    /// Stop automatic message sending
    #[oai(path = "/messaging/stop", method = "post", tag = EndpointsTags::Messaging)]
    pub async fn stop(&self) -> Json<ControlResponseDto> {
        let changed = self.state.scheduler.stop();
        Json(ControlResponseDto {
            message: if changed {
                "Messaging stopped"
            } else {
                "Messaging not running"
            }
            .to_string(),
            changed,
        })
    }

    #[oai(path = "/messaging/status", method = "get", tag = EndpointsTags::Messaging)]
    pub async fn status(&self) -> Json<MessagingStatusDto> {
        Json(map_status(&self.state.scheduler))
    }

    /// List sent messages
    #[oai(path = "/messaging/sent", method = "get", tag = EndpointsTags::Messaging)]
    pub async fn sent(&self) -> PoemResult<Json<Vec<MessageDto>>> {
        let messages = self
            .state
            .list_messages_usecase
            .execute(Some(MessageStatus::Sent))
            .await
            .map_err(domain_error)?;

        Ok(Json(messages.iter().map(map_message).collect()))
    }

    /// Look up when a delivery id was sent
    #[oai(
        path = "/messaging/deliveries/:delivery_id",
        method = "get",
        tag = EndpointsTags::Messaging,
    )]
    pub async fn delivery(&self, delivery_id: Path<String>) -> PoemResult<Json<DeliveryDto>> {
        let sent_at = self
            .state
            .lookup_delivery_usecase
            .execute(&delivery_id.0)
            .await
            .map_err(domain_error)?;

        Ok(Json(map_delivery(delivery_id.0, sent_at)))
    }
}
