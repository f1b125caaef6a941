use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::application::handlers::message_dispatcher::MessageDispatcher;

struct Worker {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct Slots {
    running: Option<Worker>,
    /// A stopped worker that may still be finishing its last cycle.
    stopping: Option<JoinHandle<()>>,
}

/// Owns the single background task that drives [`MessageDispatcher`].
///
/// `start` and `stop` never block and are safe to call in any state.
pub struct DispatchScheduler {
    dispatcher: Arc<MessageDispatcher>,
    interval: Duration,
    slots: Mutex<Slots>,
}

impl DispatchScheduler {
    pub fn new(dispatcher: Arc<MessageDispatcher>) -> Self {
        let interval = dispatcher.config().interval;
        Self {
            dispatcher,
            interval,
            slots: Mutex::new(Slots::default()),
        }
    }

    pub fn dispatcher(&self) -> &Arc<MessageDispatcher> {
        &self.dispatcher
    }

    fn slots(&self) -> MutexGuard<'_, Slots> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Spawns the dispatch loop. Returns `false` if it was already running.
    pub fn start(&self) -> bool {
        let mut slots = self.slots();
        if let Some(worker) = &slots.running {
            if !worker.handle.is_finished() {
                debug!("dispatch loop already running");
                return false;
            }
        }

        let token = CancellationToken::new();
        let previous = slots.stopping.take();
        let handle = tokio::spawn(run_loop(
            self.dispatcher.clone(),
            self.interval,
            token.clone(),
            previous,
        ));
        slots.running = Some(Worker { token, handle });

        info!(interval_secs = self.interval.as_secs(), "dispatch loop started");
        true
    }

    /// Signals the dispatch loop to exit after its current cycle.
    /// Returns `false` if nothing was running.
    pub fn stop(&self) -> bool {
        let mut slots = self.slots();
        let Some(worker) = slots.running.take() else {
            debug!("stop requested while dispatch loop is not running");
            return false;
        };

        worker.token.cancel();
        let was_running = !worker.handle.is_finished();
        slots.stopping = Some(worker.handle);

        if was_running {
            info!("dispatch loop stopping");
        }
        was_running
    }

    pub fn is_running(&self) -> bool {
        self.slots()
            .running
            .as_ref()
            .is_some_and(|worker| !worker.handle.is_finished())
    }

    /// Stops the loop and waits for its last cycle to finish.
    pub async fn shutdown(&self) {
        self.stop();
        let handle = self.slots().stopping.take();
        join_previous(handle).await;
        info!("dispatch loop shut down");
    }
}

async fn join_previous(handle: Option<JoinHandle<()>>) {
    if let Some(handle) = handle {
        if let Err(err) = handle.await {
            error!(error = ?err, "dispatch loop terminated abnormally");
        }
    }
}

async fn run_loop(
    dispatcher: Arc<MessageDispatcher>,
    interval: Duration,
    token: CancellationToken,
    previous: Option<JoinHandle<()>>,
) {
    join_previous(previous).await;

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = ticker.tick() => {}
        }

        match dispatcher.run_cycle().await {
            Ok(report) if report.selected > 0 => info!(
                selected = report.selected,
                sent = report.sent,
                superseded = report.superseded,
                failed = report.failed,
                skipped = report.skipped,
                errors = report.errors.len(),
                "dispatch cycle finished"
            ),
            Ok(_) => debug!("no due messages"),
            Err(err) => error!(error = ?err, "dispatch cycle aborted"),
        }
    }

    debug!("dispatch loop exited");
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::Duration as ChronoDuration;

    use super::*;
    use crate::{
        application::{
            handlers::message_dispatcher::{
                DispatcherConfig,
                tests::{ScriptedChannel, message_due_in, receipt},
            },
            services::delivery::{DeliveryChannel, DeliveryReceipt, DeliveryRequest},
        },
        domain::{errors::DeliveryError, models::MessageStatus, repositories::MessageRepository},
        infrastructure::repositories::in_memory::InMemoryMessageRepository,
    };

    struct SlowChannel(Duration);

    #[async_trait]
    impl DeliveryChannel for SlowChannel {
        async fn deliver(
            &self,
            _request: &DeliveryRequest,
        ) -> Result<DeliveryReceipt, DeliveryError> {
            tokio::time::sleep(self.0).await;
            Ok(receipt("m-slow"))
        }
    }

    const INTERVAL: Duration = Duration::from_secs(120);

    fn scheduler(repo: Arc<InMemoryMessageRepository>) -> DispatchScheduler {
        let dispatcher = MessageDispatcher::new(
            repo,
            Arc::new(ScriptedChannel::new()),
            DispatcherConfig {
                batch_size: 2,
                interval: INTERVAL,
            },
        );
        DispatchScheduler::new(Arc::new(dispatcher))
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn first_cycle_runs_immediately() {
        let repo = Arc::new(InMemoryMessageRepository::new());
        let message = repo
            .create(message_due_in(ChronoDuration::hours(-1), "hi"))
            .await
            .unwrap();
        let scheduler = scheduler(repo.clone());

        assert!(scheduler.start());
        settle().await;

        assert_eq!(scheduler.dispatcher().stats().cycles, 1);
        assert_eq!(
            repo.get(message.id).await.unwrap().unwrap().status,
            MessageStatus::Sent
        );
        scheduler.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn cycles_follow_the_interval() {
        let scheduler = scheduler(Arc::new(InMemoryMessageRepository::new()));

        scheduler.start();
        tokio::time::sleep(INTERVAL * 3 + Duration::from_millis(1)).await;

        assert_eq!(scheduler.dispatcher().stats().cycles, 4);
        scheduler.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_start_keeps_a_single_loop() {
        let scheduler = scheduler(Arc::new(InMemoryMessageRepository::new()));

        assert!(scheduler.start());
        assert!(!scheduler.start());
        assert!(!scheduler.start());
        tokio::time::sleep(INTERVAL + Duration::from_millis(1)).await;

        assert_eq!(scheduler.dispatcher().stats().cycles, 2);
        assert!(scheduler.is_running());
        scheduler.shutdown().await;
    }

    #[tokio::test]
    async fn stop_without_a_running_loop_returns_immediately() {
        let scheduler = scheduler(Arc::new(InMemoryMessageRepository::new()));

        assert!(!scheduler.stop());
        assert!(!scheduler.stop());
        assert!(!scheduler.is_running());
        scheduler.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn no_cycles_after_stop() {
        let scheduler = scheduler(Arc::new(InMemoryMessageRepository::new()));

        scheduler.start();
        settle().await;
        assert!(scheduler.stop());
        assert!(!scheduler.is_running());
        tokio::time::sleep(INTERVAL * 3).await;

        assert_eq!(scheduler.dispatcher().stats().cycles, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_after_stop_runs_one_loop() {
        let scheduler = scheduler(Arc::new(InMemoryMessageRepository::new()));

        scheduler.start();
        settle().await;
        scheduler.stop();
        assert!(scheduler.start());
        tokio::time::sleep(INTERVAL + Duration::from_millis(1)).await;

        assert_eq!(scheduler.dispatcher().stats().cycles, 3);
        scheduler.shutdown().await;
        assert!(!scheduler.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_lets_an_in_flight_delivery_finish() {
        let repo = Arc::new(InMemoryMessageRepository::new());
        let message = repo
            .create(message_due_in(ChronoDuration::hours(-1), "hi"))
            .await
            .unwrap();
        let dispatcher = MessageDispatcher::new(
            repo.clone(),
            Arc::new(SlowChannel(Duration::from_secs(5))),
            DispatcherConfig {
                batch_size: 2,
                interval: INTERVAL,
            },
        );
        let scheduler = DispatchScheduler::new(Arc::new(dispatcher));

        scheduler.start();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(scheduler.stop());
        scheduler.shutdown().await;

        let stored = repo.get(message.id).await.unwrap().unwrap();
        assert_eq!(stored.status, MessageStatus::Sent);
        assert_eq!(stored.delivery_id.as_deref(), Some("m-slow"));
        assert_eq!(scheduler.dispatcher().stats().cycles, 1);
    }

    #[tokio::test]
    async fn crashed_previous_loop_does_not_block_the_next_one() {
        let crashed: JoinHandle<()> = tokio::spawn(async { panic!("dispatch loop crashed") });

        join_previous(Some(crashed)).await;
        join_previous(None).await;
    }
}
