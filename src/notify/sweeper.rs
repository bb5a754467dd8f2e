//! Inactivity sweeper
//!
//! Periodic scan for servers that went silent past the activity window
//! and have not been notified yet. Marking happens strictly after the
//! jobs are handed to the dispatcher queue, so a crash mid-tick leaves
//! the affected servers unmarked and they are retried on the next tick.

use std::time::Duration;

use metrics::gauge;
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::liveness::LivenessStore;

use super::Notification;

pub async fn run_sweeper(
    store: LivenessStore,
    notify_tx: mpsc::Sender<Notification>,
    window: Duration,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(
        window_secs = window.as_secs(),
        interval_secs = interval.as_secs(),
        "Inactivity sweeper started"
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                sweep_once(&store, &notify_tx, window).await;
            }
            _ = shutdown.changed() => {
                break;
            }
        }
    }

    info!("Inactivity sweeper stopped");
}

/// One sweep: find → enqueue → mark.
async fn sweep_once(
    store: &LivenessStore,
    notify_tx: &mpsc::Sender<Notification>,
    window: Duration,
) {
    gauge!("serverpulse_known_servers", store.len().await as f64);

    let candidates = store.find_inactive_unnotified(window).await;
    if candidates.is_empty() {
        return;
    }

    info!(count = candidates.len(), "Servers went inactive");

    for identity in &candidates {
        let job = Notification::Inactive {
            identity: identity.clone(),
        };
        if notify_tx.send(job).await.is_err() {
            // Dispatcher is gone; leave everything unmarked so a
            // restarted dispatcher picks the candidates up next tick.
            warn!("Notification queue closed, aborting sweep");
            return;
        }
    }

    store.mark_notified_inactive(&candidates, window).await;
}
