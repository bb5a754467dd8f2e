use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Seconds of heartbeat silence before a server is considered inactive.
    #[serde(default = "default_activity_window_secs")]
    pub activity_window_secs: u64,

    /// How often the inactivity sweeper checks for newly-silent servers.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// Delay between per-user Telegram sends, to respect bot rate limits.
    #[serde(default = "default_notify_throttle_ms")]
    pub notify_throttle_ms: u64,

    /// Telegram bot token. When unset the service runs without a bot:
    /// notifications are logged instead of delivered.
    #[serde(default)]
    pub bot_token: Option<String>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_activity_window_secs() -> u64 {
    10
}

fn default_sweep_interval_secs() -> u64 {
    1
}

fn default_notify_throttle_ms() -> u64 {
    200
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::Environment::default())
            .build()?;

        let settings: Config = config
            .try_deserialize()
            .unwrap_or_else(|_| Config::default());

        Ok(settings)
    }

    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }

    pub fn activity_window(&self) -> Duration {
        Duration::from_secs(self.activity_window_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn notify_throttle(&self) -> Duration {
        Duration::from_millis(self.notify_throttle_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            data_dir: default_data_dir(),
            activity_window_secs: default_activity_window_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            notify_throttle_ms: default_notify_throttle_ms(),
            bot_token: None,
        }
    }
}
