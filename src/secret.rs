//! Shared secret key
//!
//! One static credential gates both heartbeat reporting and bot
//! registration. Generated once on first start and persisted under the
//! data directory; operators read it from the log or the file.

use std::path::Path;

use tracing::{info, warn};

use crate::error::AppResult;

const SECRET_FILE: &str = "secret_key";

/// Load the secret key, generating and persisting a fresh UUID if none
/// exists yet.
pub fn load_or_generate(data_dir: &Path) -> AppResult<String> {
    let path = data_dir.join(SECRET_FILE);

    match std::fs::read_to_string(&path) {
        Ok(raw) => {
            let key = raw.trim().to_string();
            if !key.is_empty() {
                return Ok(key);
            }
            warn!(path = %path.display(), "Secret key file is empty, generating a new key");
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!("Secret key file not found, generating a new key");
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read secret key, generating a new key");
        }
    }

    let key = uuid::Uuid::new_v4().to_string();
    std::fs::create_dir_all(data_dir)?;
    std::fs::write(&path, &key)?;
    info!(path = %path.display(), "Generated new secret key: {key}");

    Ok(key)
}
