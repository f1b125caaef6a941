use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::{AsyncCommands, aio::MultiplexedConnection};

use crate::application::services::cache::{DELIVERY_TTL, MessageCache};

pub struct RedisMessageCache {
    connection: MultiplexedConnection,
}

impl RedisMessageCache {
    pub async fn connect(url: &str) -> anyhow::Result<Arc<Self>> {
        let client = redis::Client::open(url).context("invalid redis url")?;
        let connection = client
            .get_multiplexed_tokio_connection()
            .await
            .context("failed to connect to redis")?;
        Ok(Arc::new(Self { connection }))
    }
}

fn delivery_key(delivery_id: &str) -> String {
    format!("message:{delivery_id}")
}

fn ttl_seconds() -> anyhow::Result<usize> {
    usize::try_from(DELIVERY_TTL.as_secs()).context("delivery ttl does not fit in usize")
}

#[async_trait]
impl MessageCache for RedisMessageCache {
    async fn store_delivery(
        &self,
        delivery_id: &str,
        sent_at: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        let mut connection = self.connection.clone();
        connection
            .set_ex::<_, _, ()>(
                delivery_key(delivery_id),
                sent_at.timestamp(),
                ttl_seconds()?,
            )
            .await?;
        Ok(())
    }

    async fn delivery_time(&self, delivery_id: &str) -> anyhow::Result<Option<DateTime<Utc>>> {
        let mut connection = self.connection.clone();
        let seconds: Option<i64> = connection.get(delivery_key(delivery_id)).await?;
        seconds
            .map(|seconds| {
                DateTime::from_timestamp(seconds, 0)
                    .ok_or_else(|| anyhow::anyhow!("invalid cached timestamp {seconds}"))
            })
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_namespaced_by_delivery_id() {
        assert_eq!(delivery_key("m-1"), "message:m-1");
    }

    #[test]
    fn ttl_is_a_full_day_in_seconds() {
        assert_eq!(ttl_seconds().unwrap(), 24 * 60 * 60);
    }
}
