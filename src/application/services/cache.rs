use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// How long a delivery stays visible in the cache.
pub const DELIVERY_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Best-effort lookup from delivery id to delivery time.
///
/// Never consulted for `status`; the repository stays authoritative.
#[async_trait]
pub trait MessageCache: Send + Sync {
    async fn store_delivery(&self, delivery_id: &str, sent_at: DateTime<Utc>)
    -> anyhow::Result<()>;

    async fn delivery_time(&self, delivery_id: &str) -> anyhow::Result<Option<DateTime<Utc>>>;
}
