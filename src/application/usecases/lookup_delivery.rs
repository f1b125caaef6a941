use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::{application::services::cache::MessageCache, domain::errors::DomainError};

/// Reads the delivery time of a delivery id from the metadata cache.
pub struct LookupDeliveryUseCase {
    cache: Option<Arc<dyn MessageCache>>,
}

impl LookupDeliveryUseCase {
    pub fn new(cache: Option<Arc<dyn MessageCache>>) -> Self {
        Self { cache }
    }

    pub async fn execute(&self, delivery_id: &str) -> Result<DateTime<Utc>, DomainError> {
        let Some(cache) = &self.cache else {
            return Err(DomainError::NotFound(format!("delivery {delivery_id}")));
        };
        cache
            .delivery_time(delivery_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("delivery {delivery_id}")))
    }
}
