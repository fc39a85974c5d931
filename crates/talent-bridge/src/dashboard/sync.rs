use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::aggregator::{DashboardAggregator, RefreshOutcome, RefreshTrigger};
use crate::remote::ChangeSubscription;

/// Background loop that keeps the dashboard snapshot fresh.
///
/// One task owns the poll timer and the change subscription. Refreshes are
/// spawned rather than awaited inline, so a change that arrives while a poll
/// is still reading sees the in-flight flag and is skipped.
pub struct DashboardSync {
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl DashboardSync {
    pub fn start(
        aggregator: Arc<DashboardAggregator>,
        changes: ChangeSubscription,
        poll_interval: Duration,
    ) -> Self {
        let (shutdown, stop) = oneshot::channel();
        let handle = tokio::spawn(run(aggregator, changes, poll_interval, stop));
        info!(poll_secs = poll_interval.as_secs(), "dashboard sync started");
        Self { shutdown, handle }
    }

    /// Stop the loop and wait for any refresh it started.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(());
        if let Err(err) = self.handle.await {
            warn!(error = %err, "dashboard sync task ended abnormally");
        }
        info!("dashboard sync stopped");
    }
}

async fn run(
    aggregator: Arc<DashboardAggregator>,
    mut changes: ChangeSubscription,
    poll_interval: Duration,
    mut stop: oneshot::Receiver<()>,
) {
    let mut ticker = time::interval_at(Instant::now() + poll_interval, poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut refreshes = JoinSet::new();
    spawn_refresh(&mut refreshes, &aggregator, RefreshTrigger::Startup);

    let mut feed_open = true;
    loop {
        tokio::select! {
            _ = &mut stop => break,
            _ = ticker.tick() => {
                if aggregator.auto_refresh() {
                    spawn_refresh(&mut refreshes, &aggregator, RefreshTrigger::Poll);
                }
            }
            change = changes.recv(), if feed_open => match change {
                Some(change) => {
                    debug!(
                        table = change.table.name(),
                        kind = change.kind.label(),
                        "realtime change received"
                    );
                    aggregator.record_change(change);
                    spawn_refresh(&mut refreshes, &aggregator, RefreshTrigger::Push);
                }
                None => {
                    warn!("change feed closed; continuing with polling only");
                    feed_open = false;
                }
            },
            Some(joined) = refreshes.join_next(), if !refreshes.is_empty() => {
                if let Err(err) = joined {
                    warn!(error = %err, "dashboard refresh task failed");
                }
            }
        }
    }

    while let Some(joined) = refreshes.join_next().await {
        if let Err(err) = joined {
            warn!(error = %err, "dashboard refresh task failed");
        }
    }
}

fn spawn_refresh(
    refreshes: &mut JoinSet<RefreshOutcome>,
    aggregator: &Arc<DashboardAggregator>,
    trigger: RefreshTrigger,
) {
    let aggregator = Arc::clone(aggregator);
    refreshes.spawn(async move { aggregator.refresh(trigger).await });
}
