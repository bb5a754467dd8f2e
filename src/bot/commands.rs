//! Bot command loop
//!
//! Long-polls `getUpdates` and serves three commands: `/start` (help),
//! `/register <secret-key>` (join the recipient list) and `/servers`
//! (the numbered status listing). Registration is gated by the same
//! shared secret the heartbeat endpoint uses.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::error::AppError;
use crate::liveness::{LivenessStore, ServerStatus};
use crate::users::UserRegistry;

use super::client::{IncomingMessage, TelegramClient};

const POLL_RETRY_SECS: u64 = 5;

const HELP_TEXT: &str = "This bot monitors the liveness of your servers.\n\
*Commands:*\n\
1. /start - show this message\n\
2. /register <secret-key> - register for notifications\n\
3. /servers - list known servers and their status\n\n\
_The secret key is generated once, on the first start of the monitor. \
After registering, delete the message containing the key._";

pub async fn run_bot(
    client: TelegramClient,
    store: LivenessStore,
    users: UserRegistry,
    secret: Arc<String>,
    window: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    info!("Telegram bot started, polling for commands");
    let mut offset: i64 = 0;

    loop {
        let batch = tokio::select! {
            result = client.get_updates(offset) => result,
            _ = shutdown.changed() => break,
        };

        match batch {
            Ok(updates) => {
                for update in updates {
                    offset = offset.max(update.update_id + 1);
                    if let Some(message) = update.message {
                        handle_message(&client, &store, &users, &secret, window, message).await;
                    }
                }
            }
            Err(AppError::Forbidden(description)) => {
                error!(%description, "Telegram rejected the bot token, stopping bot");
                break;
            }
            Err(e) => {
                warn!(error = %e, "Telegram poll failed, retrying");
                tokio::time::sleep(Duration::from_secs(POLL_RETRY_SECS)).await;
            }
        }
    }

    info!("Telegram bot stopped");
}

async fn handle_message(
    client: &TelegramClient,
    store: &LivenessStore,
    users: &UserRegistry,
    secret: &str,
    window: Duration,
    message: IncomingMessage,
) {
    let chat_id = message.chat.id;
    let Some(text) = message.text else {
        return;
    };

    let (command, argument) = match text.split_once(' ') {
        Some((head, tail)) => (head, Some(tail.trim())),
        None => (text.as_str(), None),
    };
    // Commands in groups arrive as /command@BotName.
    let command = command.split('@').next().unwrap_or(command);

    let reply = match command {
        "/start" => start_reply(users, chat_id).await,
        "/register" => register_reply(users, secret, chat_id, argument).await,
        "/servers" => servers_reply(store, users, chat_id, window).await,
        _ => return,
    };

    if let Err(e) = client.send_message(chat_id, &reply).await {
        warn!(chat_id, error = %e, "Failed to reply to command");
    }
}

async fn start_reply(users: &UserRegistry, chat_id: i64) -> String {
    let status = if users.contains(chat_id).await {
        "registered"
    } else {
        "not registered (use /register to sign up for notifications)"
    };
    format!("{HELP_TEXT}\n\nYour status: {status}")
}

async fn register_reply(
    users: &UserRegistry,
    secret: &str,
    chat_id: i64,
    argument: Option<&str>,
) -> String {
    let Some(key) = argument.filter(|key| !key.is_empty()) else {
        return "Invalid format. Usage: `/register your-secret-key`".to_string();
    };

    if key != secret {
        return "Invalid secret key. Try again or contact the administrator.".to_string();
    }

    match users.register(chat_id).await {
        Ok(true) => {
            info!(chat_id, "User registered");
            "Access granted. Use /servers to see the list of known servers.".to_string()
        }
        Ok(false) => "Already registered.".to_string(),
        Err(e) => {
            error!(chat_id, error = %e, "Failed to persist registered users");
            "Registration failed, try again later.".to_string()
        }
    }
}

async fn servers_reply(
    store: &LivenessStore,
    users: &UserRegistry,
    chat_id: i64,
    window: Duration,
) -> String {
    if !users.contains(chat_id).await {
        return "No access. Use /register to sign up first.".to_string();
    }

    let snapshot = store.snapshot(window).await;
    if snapshot.is_empty() {
        return "No servers have reported yet.".to_string();
    }

    render_server_list(&snapshot)
}

/// Numbered, aligned listing with an active/inactive marker per server.
fn render_server_list(snapshot: &[ServerStatus]) -> String {
    let index_width = snapshot.len().to_string().len();
    snapshot
        .iter()
        .enumerate()
        .map(|(i, status)| {
            let marker = if status.active { "🟢" } else { "🔴" };
            format!(
                "{:>width$}. `{:15}` {}",
                i + 1,
                status.identity,
                marker,
                width = index_width
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
