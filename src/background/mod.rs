//! Background scheduler: owns the five independently-cancellable periodic
//! tasks — rule cache reload, beneficiary graph rebuild, review-queue
//! auto-accept sweep, auto-tuner, silence detector — as plain
//! `tokio::spawn` sleep loops (`loop { sleep(interval).await;
//! run_cycle().await }`) selecting against a [`CancellationToken`] for
//! graceful shutdown. Each task here is its own loop rather than one
//! generic loop over hooks, since the five
//! jobs share no per-tick state beyond the store and run on independent
//! cadences.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::graph::BeneficiaryGraph;
use crate::notification::NotificationDispatcher;
use crate::queue::ReviewQueue;
use crate::rules::RuleRegistry;
use crate::silence::SilenceDetector;
use crate::store::Store;
use crate::tuner;

/// Handles for the five spawned tasks, plus the shared cancellation token
/// that stops all of them together. Dropping this without calling
/// [`Scheduler::shutdown`] leaves the tasks running detached.
pub struct Scheduler {
    cancel: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl Scheduler {
    /// Spawns all five tasks against a shared store and returns a handle
    /// to stop them. `notifier` is only consulted by the silence detector.
    pub fn spawn<S: Store + 'static>(
        store: Arc<S>,
        rules: Arc<RuleRegistry<S>>,
        graph: Arc<BeneficiaryGraph<S>>,
        queue: Arc<ReviewQueue<S>>,
        notifier: NotificationDispatcher,
    ) -> Self {
        let cancel = CancellationToken::new();
        let config = crate::config::get();

        let mut handles = Vec::with_capacity(5);

        handles.push(spawn_loop(
            "rule cache reload",
            Duration::from_secs(config.rules.rule_cache_refresh_seconds),
            cancel.clone(),
            {
                let rules = rules.clone();
                move || {
                    let rules = rules.clone();
                    async move { rules.reload().await.map_err(|e| e.to_string()) }
                }
            },
        ));

        handles.push(spawn_loop(
            "beneficiary graph rebuild",
            Duration::from_millis(config.mule_network.graph_refresh_ms),
            cancel.clone(),
            {
                let graph = graph.clone();
                move || {
                    let graph = graph.clone();
                    async move { graph.rebuild().await.map_err(|e| e.to_string()) }
                }
            },
        ));

        handles.push(spawn_loop(
            "review queue auto-accept sweep",
            Duration::from_secs(config.feedback.auto_accept_check_interval_seconds),
            cancel.clone(),
            {
                let queue = queue.clone();
                move || {
                    let queue = queue.clone();
                    async move {
                        let now = chrono::Utc::now().timestamp_millis();
                        queue.auto_accept_sweep(now).await.map(|_| ()).map_err(|e| e.to_string())
                    }
                }
            },
        ));

        handles.push(spawn_delayed_loop(
            "auto-tuner",
            Duration::from_secs(config.feedback.tuning_initial_delay_hours * 3600),
            Duration::from_secs(config.feedback.tuning_interval_hours * 3600),
            cancel.clone(),
            {
                let store = store.clone();
                let rules = rules.clone();
                move || {
                    let store = store.clone();
                    let rules = rules.clone();
                    async move { tuner::run_tuning_pass(&store, &rules).await.map(|_| ()).map_err(|e| e.to_string()) }
                }
            },
        ));

        handles.push({
            let interval = Duration::from_secs(config.silence.check_interval_minutes * 60);
            let store = store.clone();
            let token = cancel.clone();
            tokio::spawn(async move {
                let mut detector = SilenceDetector::new();
                loop {
                    tokio::select! {
                        _ = token.cancelled() => {
                            info!(task = "silence detector", "background task cancelled");
                            break;
                        }
                        _ = tokio::time::sleep(interval) => {
                            let now = chrono::Utc::now().timestamp_millis();
                            if let Err(e) = detector.tick(&store, &notifier, now).await {
                                warn!(task = "silence detector", error = %e, "background task cycle failed");
                            }
                        }
                    }
                }
            })
        });

        Self { cancel, handles }
    }

    /// Signals every task to stop and waits for each to exit. Each task
    /// completes its in-flight store operation (up to its own deadline)
    /// before observing cancellation.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        for handle in self.handles {
            if let Err(e) = handle.await {
                error!(error = %e, "background task panicked during shutdown");
            }
        }
    }
}

/// Spawns a `sleep(interval) -> run -> repeat` loop, cancellable via
/// `token`. `run` is a factory so each tick gets a fresh future without the
/// loop itself needing to be generic over a trait object.
fn spawn_loop<F, Fut>(name: &'static str, interval: Duration, token: CancellationToken, run: F) -> JoinHandle<()>
where
    F: Fn() -> Fut + Send + 'static,
    Fut: std::future::Future<Output = Result<(), String>> + Send,
{
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    info!(task = name, "background task cancelled");
                    break;
                }
                _ = tokio::time::sleep(interval) => {
                    if let Err(e) = run().await {
                        warn!(task = name, error = %e, "background task cycle failed");
                    }
                }
            }
        }
    })
}

/// Like [`spawn_loop`] but waits `initial_delay` before the first run.
fn spawn_delayed_loop<F, Fut>(
    name: &'static str,
    initial_delay: Duration,
    interval: Duration,
    token: CancellationToken,
    run: F,
) -> JoinHandle<()>
where
    F: Fn() -> Fut + Send + 'static,
    Fut: std::future::Future<Output = Result<(), String>> + Send,
{
    tokio::spawn(async move {
        tokio::select! {
            _ = token.cancelled() => {
                info!(task = name, "background task cancelled before first run");
                return;
            }
            _ = tokio::time::sleep(initial_delay) => {}
        }
        loop {
            if let Err(e) = run().await {
                warn!(task = name, error = %e, "background task cycle failed");
            }
            tokio::select! {
                _ = token.cancelled() => {
                    info!(task = name, "background task cancelled");
                    break;
                }
                _ = tokio::time::sleep(interval) => {}
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config;
    use crate::notification::LoggingNotificationSink;
    use crate::store::MemoryStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn spawn_loop_runs_at_least_once_before_shutdown() {
        let count = Arc::new(AtomicUsize::new(0));
        let token = CancellationToken::new();
        let handle = spawn_loop("test task", Duration::from_millis(5), token.clone(), {
            let count = count.clone();
            move || {
                let count = count.clone();
                async move {
                    count.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            }
        });

        tokio::time::sleep(Duration::from_millis(30)).await;
        token.cancel();
        handle.await.unwrap();
        assert!(count.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn scheduler_shuts_down_cleanly() {
        let _ = config::init_with(config::EngineConfig::default());
        let store = Arc::new(MemoryStore::new());
        let rules = Arc::new(RuleRegistry::new(store.clone()));
        let graph = Arc::new(BeneficiaryGraph::new(store.clone()));
        let queue = Arc::new(ReviewQueue::new(store.clone()));
        let notifier = NotificationDispatcher::spawn(Arc::new(LoggingNotificationSink), 16);

        let scheduler = Scheduler::spawn(store, rules, graph, queue, notifier);
        tokio::time::sleep(Duration::from_millis(10)).await;
        scheduler.shutdown().await;
    }
}
