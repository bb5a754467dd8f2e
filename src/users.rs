//! Registered notification recipients
//!
//! Telegram chat ids that passed `/register`, persisted as a JSON array
//! under the data directory so registrations survive restarts.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::error::AppResult;

const USERS_FILE: &str = "registered_users.json";

#[derive(Debug, Clone)]
pub struct UserRegistry {
    path: PathBuf,
    users: Arc<RwLock<HashSet<i64>>>,
}

impl UserRegistry {
    /// Load the registry from the data directory. A missing file is a
    /// fresh install; an unreadable one degrades to an empty set.
    pub fn load(data_dir: &Path) -> Self {
        let path = data_dir.join(USERS_FILE);
        let users = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<HashSet<i64>>(&raw) {
                Ok(users) => {
                    info!(count = users.len(), "Loaded registered users");
                    users
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to parse registered users, starting empty");
                    HashSet::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No registered users file found, starting empty");
                HashSet::new()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read registered users, starting empty");
                HashSet::new()
            }
        };

        Self {
            path,
            users: Arc::new(RwLock::new(users)),
        }
    }

    pub async fn contains(&self, chat_id: i64) -> bool {
        self.users.read().await.contains(&chat_id)
    }

    /// All recipients, for notification fan-out.
    pub async fn all(&self) -> Vec<i64> {
        let mut users: Vec<i64> = self.users.read().await.iter().copied().collect();
        users.sort_unstable();
        users
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    /// Add a chat id and persist the set. Returns false if the id was
    /// already registered (nothing is rewritten in that case).
    pub async fn register(&self, chat_id: i64) -> AppResult<bool> {
        let mut users = self.users.write().await;
        if !users.insert(chat_id) {
            return Ok(false);
        }

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(&*users)?;
        std::fs::write(&self.path, raw)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("serverpulse-users-{}", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_register_and_reload() {
        let dir = temp_dir();

        let registry = UserRegistry::load(&dir);
        assert_eq!(registry.len().await, 0);
        assert!(registry.register(42).await.unwrap());
        assert!(!registry.register(42).await.unwrap());
        assert!(registry.contains(42).await);

        let reloaded = UserRegistry::load(&dir);
        assert!(reloaded.contains(42).await);
        assert_eq!(reloaded.all().await, vec![42]);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_corrupt_file_starts_empty() {
        let dir = temp_dir();
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(USERS_FILE), "not json").unwrap();

        let registry = UserRegistry::load(&dir);
        assert_eq!(registry.len().await, 0);

        std::fs::remove_dir_all(&dir).ok();
    }
}
