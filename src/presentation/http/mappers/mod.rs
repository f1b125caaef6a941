use chrono::{DateTime, Utc};

use crate::{
    application::handlers::dispatch_scheduler::DispatchScheduler,
    domain::models::Message,
    presentation::http::responses::{DeliveryDto, MessageDto, MessagingStatusDto},
};

pub fn map_message(message: &Message) -> MessageDto {
    MessageDto {
        id: message.id,
        destination: message.destination.clone(),
        content: message.content.clone(),
        status: message.status.into(),
        delivery_id: message.delivery_id.clone(),
        scheduled_at: message.scheduled_at.to_rfc3339(),
        sent_at: message.sent_at.map(|sent_at| sent_at.to_rfc3339()),
        created_at: message.created_at.to_rfc3339(),
        updated_at: message.updated_at.to_rfc3339(),
    }
}

pub fn map_status(scheduler: &DispatchScheduler) -> MessagingStatusDto {
    let dispatcher = scheduler.dispatcher();
    let stats = dispatcher.stats();
    MessagingStatusDto {
        running: scheduler.is_running(),
        interval_seconds: dispatcher.config().interval.as_secs(),
        batch_size: dispatcher.config().batch_size,
        cycles: stats.cycles,
        sent: stats.sent,
        superseded: stats.superseded,
        failed: stats.failed,
        errors: stats.errors,
    }
}

pub fn map_delivery(delivery_id: String, sent_at: DateTime<Utc>) -> DeliveryDto {
    DeliveryDto {
        delivery_id,
        sent_at: sent_at.to_rfc3339(),
    }
}
