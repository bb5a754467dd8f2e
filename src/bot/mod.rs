//! Telegram bot integration
//!
//! A thin client over the Telegram Bot API plus the long-polling
//! command loop. The bot is optional: without a token the rest of the
//! service runs and notifications are logged instead of delivered.

pub mod client;
pub mod commands;

pub use client::TelegramClient;
pub use commands::run_bot;
