//! The liveness store
//!
//! One coarse `RwLock` guards the whole map: fleets are tens to low
//! hundreds of servers and every operation is a few map touches, so
//! per-identity locking buys nothing. Nothing here performs I/O and no
//! lock is ever held across an await point outside the store.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use super::{ServerRecord, ServerStatus, TransitionKind};

#[derive(Debug, Default)]
struct StoreInner {
    records: HashMap<String, ServerRecord>,
    /// First-seen insertion order, so status listings and sweep results
    /// are stable across calls.
    order: Vec<String>,
}

/// Shared map of server identity → liveness record.
///
/// Cloning is cheap and shares the underlying state; every component
/// (heartbeat handlers, sweeper, bot, status API) holds a clone.
#[derive(Debug, Clone, Default)]
pub struct LivenessStore {
    inner: Arc<RwLock<StoreInner>>,
}

impl LivenessStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a heartbeat for `identity` and classify it.
    ///
    /// Unknown identities are created, never rejected. A fresh
    /// heartbeat unconditionally clears the notified-inactive flag;
    /// whether that flag was set beforehand decides `Reactivated` vs
    /// `Unchanged`.
    pub async fn record_heartbeat(&self, identity: &str) -> TransitionKind {
        let mut inner = self.inner.write().await;

        if let Some(record) = inner.records.get_mut(identity) {
            let was_notified = record.notified_inactive;
            record.last_heartbeat = tokio::time::Instant::now();
            record.last_heartbeat_at = chrono::Utc::now();
            record.notified_inactive = false;

            return if was_notified {
                TransitionKind::Reactivated
            } else {
                TransitionKind::Unchanged
            };
        }

        inner.order.push(identity.to_owned());
        inner
            .records
            .insert(identity.to_owned(), ServerRecord::new(identity));
        TransitionKind::New
    }

    /// Activity status of every known server under `window`, in
    /// first-seen order, from a single consistent point in time.
    pub async fn snapshot(&self, window: Duration) -> Vec<ServerStatus> {
        let inner = self.inner.read().await;
        inner
            .order
            .iter()
            .filter_map(|identity| inner.records.get(identity))
            .map(|record| ServerStatus {
                identity: record.identity.clone(),
                active: record.is_active(window),
                last_heartbeat_at: record.last_heartbeat_at,
            })
            .collect()
    }

    /// Identities that are derived-inactive and not yet notified, in
    /// first-seen order.
    pub async fn find_inactive_unnotified(&self, window: Duration) -> Vec<String> {
        let inner = self.inner.read().await;
        inner
            .order
            .iter()
            .filter_map(|identity| inner.records.get(identity))
            .filter(|record| !record.is_active(window) && !record.notified_inactive)
            .map(|record| record.identity.clone())
            .collect()
    }

    /// Mark the listed identities as notified-inactive.
    ///
    /// The flag is only set if the record is still derived-inactive at
    /// mark time: a heartbeat that landed between the sweep's find and
    /// this mark wins, and the flag stays false. Unknown identities are
    /// ignored.
    pub async fn mark_notified_inactive(&self, identities: &[String], window: Duration) {
        let mut inner = self.inner.write().await;
        for identity in identities {
            if let Some(record) = inner.records.get_mut(identity) {
                if !record.is_active(window) {
                    record.notified_inactive = true;
                }
            }
        }
    }

    /// Number of servers ever seen.
    pub async fn len(&self) -> usize {
        self.inner.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(10);

    #[tokio::test]
    async fn test_first_heartbeat_is_new() {
        let store = LivenessStore::new();
        assert_eq!(
            store.record_heartbeat("10.0.0.1").await,
            TransitionKind::New
        );
        assert_eq!(
            store.record_heartbeat("10.0.0.1").await,
            TransitionKind::Unchanged
        );
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mark_is_conditioned_on_still_inactive() {
        let store = LivenessStore::new();
        store.record_heartbeat("10.0.0.1").await;
        tokio::time::advance(Duration::from_secs(15)).await;

        let candidates = store.find_inactive_unnotified(WINDOW).await;
        assert_eq!(candidates, vec!["10.0.0.1".to_string()]);

        // Heartbeat lands between find and mark: reactivation wins.
        store.record_heartbeat("10.0.0.1").await;
        store.mark_notified_inactive(&candidates, WINDOW).await;

        assert_eq!(
            store.record_heartbeat("10.0.0.1").await,
            TransitionKind::Unchanged
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_preserves_insertion_order() {
        let store = LivenessStore::new();
        for identity in ["10.0.0.3", "10.0.0.1", "10.0.0.2"] {
            store.record_heartbeat(identity).await;
        }

        let snapshot = store.snapshot(WINDOW).await;
        let identities: Vec<_> = snapshot.iter().map(|s| s.identity.as_str()).collect();
        assert_eq!(identities, ["10.0.0.3", "10.0.0.1", "10.0.0.2"]);
        assert!(snapshot.iter().all(|s| s.active));
    }
}
