//! Server liveness tracking
//!
//! The authoritative record of which servers have reported a heartbeat
//! and how a fresh heartbeat relates to what was already known. All
//! liveness math runs on the monotonic tokio clock; wall-clock
//! timestamps are carried alongside for display only.

pub mod store;

pub use store::LivenessStore;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use strum::Display;
use tokio::time::Instant;
use utoipa::ToSchema;

/// Classification of a heartbeat's effect on the store.
///
/// Exactly one kind is returned per recorded heartbeat. `Reactivated`
/// is decided solely by the notified-inactive flag at the instant the
/// heartbeat lands, never by the activity window: a server that went
/// silent but was never swept comes back as `Unchanged`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TransitionKind {
    /// First heartbeat ever seen for this identity.
    New,
    /// Known server, no notification owed.
    Unchanged,
    /// Known server that had been notified as inactive.
    Reactivated,
}

/// One tracked server. Created on first heartbeat, never removed.
#[derive(Debug, Clone)]
pub struct ServerRecord {
    pub identity: String,
    /// Monotonic instant of the most recent accepted heartbeat.
    pub last_heartbeat: Instant,
    /// Wall-clock counterpart, for status surfaces.
    pub last_heartbeat_at: DateTime<Utc>,
    /// True once an inactivity notification went out for the current
    /// silent streak; any fresh heartbeat clears it.
    pub notified_inactive: bool,
}

impl ServerRecord {
    fn new(identity: &str) -> Self {
        Self {
            identity: identity.to_owned(),
            last_heartbeat: Instant::now(),
            last_heartbeat_at: Utc::now(),
            notified_inactive: false,
        }
    }

    /// Derived state: active while the last heartbeat is younger than
    /// the activity window.
    pub fn is_active(&self, window: Duration) -> bool {
        self.last_heartbeat.elapsed() < window
    }
}

/// Point-in-time view of one server, as exposed by status surfaces.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ServerStatus {
    pub identity: String,
    pub active: bool,
    pub last_heartbeat_at: DateTime<Utc>,
}
