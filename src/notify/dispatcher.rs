//! Notification dispatcher
//!
//! Single worker draining the notification queue. Each job is fanned
//! out to every registered user with a throttle delay between sends.
//! Delivery is best-effort: a failed send is logged and dropped, never
//! retried, and never blocks the store or the producers.

use std::time::Duration;

use metrics::increment_counter;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::bot::TelegramClient;
use crate::users::UserRegistry;

use super::Notification;

/// Run until every producer handle has been dropped.
pub async fn run_dispatcher(
    mut rx: mpsc::Receiver<Notification>,
    bot: Option<TelegramClient>,
    users: UserRegistry,
    throttle: Duration,
) {
    if bot.is_some() {
        info!("Notification dispatcher started");
    } else {
        info!("Notification dispatcher started (no bot token, log-only mode)");
    }

    while let Some(job) = rx.recv().await {
        increment_counter!("serverpulse_notifications_total", "kind" => job.kind());

        let Some(client) = bot.as_ref() else {
            info!(
                kind = job.kind(),
                identity = job.identity(),
                "Notification (not delivered, no bot configured)"
            );
            continue;
        };

        let recipients = users.all().await;
        if recipients.is_empty() {
            debug!(
                kind = job.kind(),
                identity = job.identity(),
                "No registered users, dropping notification"
            );
            continue;
        }

        let text = job.render();
        for (i, chat_id) in recipients.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(throttle).await;
            }
            match client.send_message(*chat_id, &text).await {
                Ok(()) => {
                    increment_counter!("serverpulse_notifications_delivered_total");
                }
                Err(e) => {
                    warn!(chat_id, error = %e, "Failed to deliver notification");
                }
            }
        }
    }

    info!("Notification dispatcher stopped");
}
