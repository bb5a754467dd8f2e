use anyhow::Result;
use std::net::SocketAddr;
use tokio::sync::{mpsc, watch};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use serverpulse_backend::{
    api::AppState,
    bot::{self, TelegramClient},
    config::Config,
    create_router,
    liveness::LivenessStore,
    notify, secret,
    users::UserRegistry,
};

/// Capacity of the notification hand-off queue. Producers drop jobs
/// (with a warning) instead of blocking when the dispatcher lags.
const NOTIFY_QUEUE_CAPACITY: usize = 256;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting ServerPulse Backend");

    // Load configuration
    let config = Config::load()?;
    tracing::info!("Configuration loaded");

    // Shared secret for heartbeat reporting and bot registration
    let secret_key = secret::load_or_generate(&config.data_dir())?;

    // Registered notification recipients
    let users = UserRegistry::load(&config.data_dir());

    // The liveness store shared by every component
    let store = LivenessStore::new();

    // Prometheus recorder backing /metrics
    let metrics_handle = match metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
    {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to install metrics recorder, /metrics will be empty");
            None
        }
    };

    let (notify_tx, notify_rx) = mpsc::channel(NOTIFY_QUEUE_CAPACITY);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Build application state
    let mut state = AppState::new(
        config.clone(),
        store.clone(),
        users.clone(),
        secret_key.clone(),
        notify_tx.clone(),
    );
    if let Some(handle) = metrics_handle {
        state = state.with_metrics(handle);
    }

    // Telegram bot client (optional)
    let bot_client = config.bot_token.as_deref().map(TelegramClient::new);
    if bot_client.is_none() {
        tracing::info!("No BOT_TOKEN configured, notifications will only be logged");
    }

    // Spawn the notification dispatcher
    tokio::spawn(notify::run_dispatcher(
        notify_rx,
        bot_client.clone(),
        users.clone(),
        config.notify_throttle(),
    ));

    // Spawn the inactivity sweeper
    tokio::spawn(notify::run_sweeper(
        store.clone(),
        notify_tx,
        config.activity_window(),
        config.sweep_interval(),
        shutdown_rx.clone(),
    ));

    // Spawn the bot command loop
    if let Some(client) = bot_client {
        tokio::spawn(bot::run_bot(
            client,
            store,
            users,
            state.secret.clone(),
            config.activity_window(),
            shutdown_rx,
        ));
    }

    // Build router
    let app = create_router(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(shutdown_tx))
    .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Wait for ctrl-c, then tell the background tasks to finish their
/// in-flight iteration and stop.
async fn shutdown_signal(shutdown_tx: watch::Sender<bool>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
    let _ = shutdown_tx.send(true);
}
