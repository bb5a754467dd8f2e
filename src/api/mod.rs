pub mod health;
pub mod heartbeat;
pub mod metrics;
pub mod openapi;
pub mod response;
pub mod servers;

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use tokio::sync::mpsc;

use crate::config::Config;
use crate::liveness::LivenessStore;
use crate::notify::Notification;
use crate::users::UserRegistry;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: LivenessStore,
    pub config: Config,
    pub users: UserRegistry,
    /// The shared secret gating heartbeats and registration.
    pub secret: Arc<String>,
    /// Hand-off queue to the notification dispatcher.
    pub notify_tx: mpsc::Sender<Notification>,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(
        config: Config,
        store: LivenessStore,
        users: UserRegistry,
        secret: String,
        notify_tx: mpsc::Sender<Notification>,
    ) -> Self {
        Self {
            store,
            config,
            users,
            secret: Arc::new(secret),
            notify_tx,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}
