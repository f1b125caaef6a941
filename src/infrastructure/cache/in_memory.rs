use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::application::services::cache::{DELIVERY_TTL, MessageCache};

struct Entry {
    sent_at: DateTime<Utc>,
    expires_at: Instant,
}

/// Process-local stand-in for Redis, used when no cache server is configured.
pub struct InMemoryMessageCache {
    entries: RwLock<HashMap<String, Entry>>,
    ttl: Duration,
}

impl Default for InMemoryMessageCache {
    fn default() -> Self {
        Self::with_ttl(DELIVERY_TTL)
    }
}

impl InMemoryMessageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }
}

#[async_trait]
impl MessageCache for InMemoryMessageCache {
    async fn store_delivery(
        &self,
        delivery_id: &str,
        sent_at: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            delivery_id.to_string(),
            Entry {
                sent_at,
                expires_at: now + self.ttl,
            },
        );
        Ok(())
    }

    async fn delivery_time(&self, delivery_id: &str) -> anyhow::Result<Option<DateTime<Utc>>> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(delivery_id)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.sent_at))
    }
}
