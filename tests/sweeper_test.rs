//! Sweeper integration: find → enqueue → mark, driven by the interval
//! tick on the paused clock.

use std::time::Duration;

use tokio::sync::{mpsc, watch};

use serverpulse_backend::liveness::{LivenessStore, TransitionKind};
use serverpulse_backend::notify::{run_sweeper, Notification};

const WINDOW: Duration = Duration::from_secs(10);
const INTERVAL: Duration = Duration::from_secs(1);

#[tokio::test(start_paused = true)]
async fn test_sweeper_notifies_each_streak_once() {
    let store = LivenessStore::new();
    let (notify_tx, mut notify_rx) = mpsc::channel(16);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let sweeper = tokio::spawn(run_sweeper(
        store.clone(),
        notify_tx,
        WINDOW,
        INTERVAL,
        shutdown_rx,
    ));

    store.record_heartbeat("10.0.0.1").await;

    // Past the window: the next tick notifies exactly once.
    tokio::time::advance(Duration::from_secs(15)).await;
    let job = notify_rx.recv().await.unwrap();
    assert_eq!(
        job,
        Notification::Inactive {
            identity: "10.0.0.1".into()
        }
    );
    tokio::task::yield_now().await;
    assert!(store.find_inactive_unnotified(WINDOW).await.is_empty());

    // Further ticks stay quiet for the same streak.
    tokio::time::advance(Duration::from_secs(5)).await;
    assert!(notify_rx.try_recv().is_err());

    // Comeback reads as reactivation, then the cycle can repeat.
    assert_eq!(
        store.record_heartbeat("10.0.0.1").await,
        TransitionKind::Reactivated
    );
    tokio::time::advance(Duration::from_secs(15)).await;
    let job = notify_rx.recv().await.unwrap();
    assert_eq!(
        job,
        Notification::Inactive {
            identity: "10.0.0.1".into()
        }
    );

    shutdown_tx.send(true).unwrap();
    sweeper.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_sweeper_handles_multiple_servers_in_order() {
    let store = LivenessStore::new();
    let (notify_tx, mut notify_rx) = mpsc::channel(16);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let sweeper = tokio::spawn(run_sweeper(
        store.clone(),
        notify_tx,
        WINDOW,
        INTERVAL,
        shutdown_rx,
    ));

    store.record_heartbeat("10.0.0.2").await;
    store.record_heartbeat("10.0.0.1").await;

    tokio::time::advance(Duration::from_secs(15)).await;

    // Candidates arrive in first-seen order.
    assert_eq!(
        notify_rx.recv().await.unwrap().identity(),
        "10.0.0.2".to_string()
    );
    assert_eq!(
        notify_rx.recv().await.unwrap().identity(),
        "10.0.0.1".to_string()
    );

    shutdown_tx.send(true).unwrap();
    sweeper.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_sweeper_stops_on_shutdown() {
    let store = LivenessStore::new();
    let (notify_tx, _notify_rx) = mpsc::channel(16);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let sweeper = tokio::spawn(run_sweeper(
        store,
        notify_tx,
        WINDOW,
        INTERVAL,
        shutdown_rx,
    ));

    shutdown_tx.send(true).unwrap();
    sweeper.await.unwrap();
}
