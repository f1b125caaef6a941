use std::sync::Arc;

use poem_openapi::Tags;

use crate::{
    application::{
        handlers::dispatch_scheduler::DispatchScheduler,
        services::cache::MessageCache,
        usecases::{
            cancel_message::CancelMessageUseCase, create_message::CreateMessageUseCase,
            get_message::GetMessageUseCase, list_messages::ListMessagesUseCase,
            lookup_delivery::LookupDeliveryUseCase, update_message::UpdateMessageContentUseCase,
        },
    },
    domain::repositories::MessageRepository,
    presentation::http::endpoints::{messages::MessagesEndpoints, messaging::MessagingEndpoints},
};

#[derive(Clone)]
pub struct ApiState {
    pub create_message_usecase: Arc<CreateMessageUseCase>,
    pub get_message_usecase: Arc<GetMessageUseCase>,
    pub list_messages_usecase: Arc<ListMessagesUseCase>,
    pub update_message_usecase: Arc<UpdateMessageContentUseCase>,
    pub cancel_message_usecase: Arc<CancelMessageUseCase>,
    pub lookup_delivery_usecase: Arc<LookupDeliveryUseCase>,
    pub scheduler: Arc<DispatchScheduler>,
}

impl ApiState {
    pub fn new(
        repo: Arc<dyn MessageRepository>,
        cache: Option<Arc<dyn MessageCache>>,
        scheduler: Arc<DispatchScheduler>,
    ) -> Self {
        Self {
            create_message_usecase: Arc::new(CreateMessageUseCase::new(repo.clone())),
            get_message_usecase: Arc::new(GetMessageUseCase::new(repo.clone())),
            list_messages_usecase: Arc::new(ListMessagesUseCase::new(repo.clone())),
            update_message_usecase: Arc::new(UpdateMessageContentUseCase::new(repo.clone())),
            cancel_message_usecase: Arc::new(CancelMessageUseCase::new(repo)),
            lookup_delivery_usecase: Arc::new(LookupDeliveryUseCase::new(cache)),
            scheduler,
        }
    }
}

/// Enum of API sections (tags)
#[derive(Tags)]
pub enum EndpointsTags {
    Health,
    Messages,
    Messaging,
}

pub struct Endpoints;

pub fn endpoints(state: Arc<ApiState>) -> (Endpoints, MessagesEndpoints, MessagingEndpoints) {
    (
        Endpoints,
        MessagesEndpoints::new(state.clone()),
        MessagingEndpoints::new(state),
    )
}
