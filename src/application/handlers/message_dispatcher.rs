use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
    application::services::{
        cache::MessageCache,
        delivery::{DeliveryChannel, DeliveryRequest},
    },
    domain::{
        errors::DispatchError,
        models::{Message, MessageStatus},
        repositories::MessageRepository,
    },
};

pub const DEFAULT_BATCH_SIZE: u32 = 2;
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(120);

#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Upper bound on records handled per cycle.
    pub batch_size: u32,
    pub interval: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            interval: DEFAULT_INTERVAL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Sent { delivery_id: String },
    /// Delivered, but the record had already left `pending` (e.g. cancelled meanwhile).
    Superseded { delivery_id: String },
    Skipped,
}

/// What a single cycle did.
#[derive(Debug, Default)]
pub struct CycleReport {
    pub selected: usize,
    pub sent: usize,
    /// Delivered, but the record had already left `pending`.
    pub superseded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub errors: Vec<DispatchError>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatcherStats {
    pub cycles: u64,
    pub sent: u64,
    pub superseded: u64,
    pub failed: u64,
    pub errors: u64,
}

#[derive(Default)]
struct StatsCounters {
    cycles: AtomicU64,
    sent: AtomicU64,
    superseded: AtomicU64,
    failed: AtomicU64,
    errors: AtomicU64,
}

/// Selects due messages and hands them to the delivery channel, one cycle at a time.
pub struct MessageDispatcher {
    repo: Arc<dyn MessageRepository>,
    channel: Arc<dyn DeliveryChannel>,
    cache: Option<Arc<dyn MessageCache>>,
    config: DispatcherConfig,
    counters: StatsCounters,
}

impl MessageDispatcher {
    pub fn new(
        repo: Arc<dyn MessageRepository>,
        channel: Arc<dyn DeliveryChannel>,
        config: DispatcherConfig,
    ) -> Self {
        Self {
            repo,
            channel,
            cache: None,
            config,
            counters: StatsCounters::default(),
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn MessageCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    pub fn stats(&self) -> DispatcherStats {
        DispatcherStats {
            cycles: self.counters.cycles.load(Ordering::Relaxed),
            sent: self.counters.sent.load(Ordering::Relaxed),
            superseded: self.counters.superseded.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
            errors: self.counters.errors.load(Ordering::Relaxed),
        }
    }

    /// Runs one dispatch cycle.
    ///
    /// Only a failed selection query aborts the cycle; per-record failures are
    /// collected in the report and never stop the rest of the batch.
    pub async fn run_cycle(&self) -> Result<CycleReport, DispatchError> {
        self.counters.cycles.fetch_add(1, Ordering::Relaxed);

        let mut batch = match self
            .repo
            .find_pending(Utc::now(), self.config.batch_size)
            .await
        {
            Ok(batch) => batch,
            Err(err) => {
                self.counters.errors.fetch_add(1, Ordering::Relaxed);
                return Err(DispatchError::Selection(err));
            }
        };

        let mut report = CycleReport {
            selected: batch.len(),
            ..Default::default()
        };
        let mut seen = HashSet::with_capacity(batch.len());

        for message in batch.iter_mut() {
            if !seen.insert(message.id) {
                report.skipped += 1;
                continue;
            }

            match self.dispatch(message).await {
                Ok(DispatchOutcome::Sent { .. }) => {
                    report.sent += 1;
                    self.counters.sent.fetch_add(1, Ordering::Relaxed);
                }
                Ok(DispatchOutcome::Superseded { .. }) => {
                    report.superseded += 1;
                    self.counters.superseded.fetch_add(1, Ordering::Relaxed);
                }
                Ok(DispatchOutcome::Skipped) => report.skipped += 1,
                Err(err) => {
                    if matches!(err, DispatchError::Delivery { .. }) {
                        report.failed += 1;
                        self.counters.failed.fetch_add(1, Ordering::Relaxed);
                    } else {
                        self.counters.errors.fetch_add(1, Ordering::Relaxed);
                    }
                    report.errors.push(err);
                }
            }
        }

        Ok(report)
    }

    /// Delivers a single message and records the outcome.
    ///
    /// `message.status` is updated in place so a repeated entry in the same
    /// batch is skipped.
    pub async fn dispatch(&self, message: &mut Message) -> Result<DispatchOutcome, DispatchError> {
        if message.status != MessageStatus::Pending {
            debug!(message_id = %message.id, status = message.status.as_str(), "skipping message that is no longer pending");
            return Ok(DispatchOutcome::Skipped);
        }

        let request = DeliveryRequest {
            destination: message.destination.clone(),
            content: message.content.clone(),
        };

        let receipt = match self.channel.deliver(&request).await {
            Ok(receipt) => receipt,
            Err(source) => {
                warn!(message_id = %message.id, error = %source, "delivery failed");
                message.status = MessageStatus::Failed;
                self.record_failure(message.id).await?;
                return Err(DispatchError::Delivery {
                    message_id: message.id,
                    source,
                });
            }
        };

        let sent_at = Utc::now();
        message.status = MessageStatus::Sent;

        let recorded = self
            .repo
            .mark_sent(message.id, &receipt.delivery_id, sent_at)
            .await
            .map_err(|source| {
                error!(
                    message_id = %message.id,
                    delivery_id = %receipt.delivery_id,
                    error = ?source,
                    "message was delivered but its status could not be saved"
                );
                DispatchError::Persistence {
                    message_id: message.id,
                    source,
                }
            })?;

        message.delivery_id = Some(receipt.delivery_id.clone());
        message.sent_at = Some(sent_at);

        if let Some(cache) = &self.cache {
            if let Err(err) = cache.store_delivery(&receipt.delivery_id, sent_at).await {
                warn!(delivery_id = %receipt.delivery_id, error = ?err, "failed to cache delivery");
            }
        }

        if !recorded {
            warn!(
                message_id = %message.id,
                delivery_id = %receipt.delivery_id,
                "message was delivered after it left pending"
            );
            return Ok(DispatchOutcome::Superseded {
                delivery_id: receipt.delivery_id,
            });
        }

        info!(message_id = %message.id, delivery_id = %receipt.delivery_id, "message sent");
        Ok(DispatchOutcome::Sent {
            delivery_id: receipt.delivery_id,
        })
    }

    async fn record_failure(&self, message_id: Uuid) -> Result<(), DispatchError> {
        match self
            .repo
            .update_status(message_id, MessageStatus::Failed)
            .await
        {
            Ok(true) => Ok(()),
            Ok(false) => {
                debug!(%message_id, "message left pending before its failure was recorded");
                Ok(())
            }
            Err(source) => {
                error!(%message_id, error = ?source, "failed to mark message as failed");
                Err(DispatchError::Persistence { message_id, source })
            }
        }
    }
}
