//! Shared configuration for Anitrack.
//!
//! Provides functions to locate the bot's state directory and data files,
//! plus the names and defaults of the environment settings the binary
//! reads.
//!
//! # Storage Structure
//!
//! All application data is stored under `~/.anitrack/`:
//!
//! ```text
//! ~/.anitrack/
//! ├── .env                  # Secrets (bot token)
//! └── state/
//!     ├── users.json        # Subscribers
//!     └── subscriptions.json
//! ```
//!
//! # Environment Variables
//!
//! - `ANITRACK_STATE_DIR`: Override the base state directory
//! - `TELEGRAM_BOT_TOKEN`: Bot token from @BotFather
//! - `ANITRACK_CATALOG_URL`: Catalog GraphQL endpoint
//! - `ANITRACK_POLL_INTERVAL_SECS`: Seconds between reconciliation ticks

use std::path::PathBuf;
use std::sync::OnceLock;

/// Environment variable for custom state directory.
pub const STATE_DIR_ENV: &str = "ANITRACK_STATE_DIR";

/// Environment variable holding the Telegram bot token.
pub const BOT_TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";

/// Environment variable for the catalog endpoint.
pub const CATALOG_URL_ENV: &str = "ANITRACK_CATALOG_URL";

/// Environment variable for the reconciliation interval.
pub const POLL_INTERVAL_ENV: &str = "ANITRACK_POLL_INTERVAL_SECS";

/// Default seconds between reconciliation ticks.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;

/// Default state directory name under home.
const DEFAULT_STATE_DIR: &str = ".anitrack";

const STATE_SUBDIR: &str = "state";

static STATE_DIR_CACHE: OnceLock<PathBuf> = OnceLock::new();

/// Get the Anitrack state directory.
///
/// The state directory is determined by:
/// 1. `ANITRACK_STATE_DIR` environment variable if set
/// 2. `~/.anitrack` if home directory is available
/// 3. `.anitrack` in current directory as fallback
pub fn state_dir() -> PathBuf {
    STATE_DIR_CACHE
        .get_or_init(|| {
            std::env::var(STATE_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    dirs::home_dir()
                        .map(|h| h.join(DEFAULT_STATE_DIR))
                        .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR))
                })
        })
        .clone()
}

/// Get the runtime state directory holding the data tables.
pub fn runtime_state_dir() -> PathBuf {
    state_dir().join(STATE_SUBDIR)
}

/// Get the subscriber table path.
pub fn users_file() -> PathBuf {
    runtime_state_dir().join("users.json")
}

/// Get the subscription table path.
pub fn subscriptions_file() -> PathBuf {
    runtime_state_dir().join("subscriptions.json")
}

/// Get the .env file path.
///
/// Environment file for secrets, loaded before the process environment
/// is read.
pub fn env_file() -> PathBuf {
    state_dir().join(".env")
}

/// Ensure the runtime state directory exists.
///
/// # Errors
/// Returns an error if the directory cannot be created.
pub fn ensure_runtime_state_dir() -> std::io::Result<()> {
    let dir = runtime_state_dir();
    if !dir.exists() {
        std::fs::create_dir_all(&dir)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // The state dir is cached process-wide, so these check names rather
    // than full paths.

    #[test]
    fn test_state_dir_shape() {
        let dir = state_dir();
        assert!(dir.is_absolute() || dir.ends_with(".anitrack") || std::env::var(STATE_DIR_ENV).is_ok());
    }

    #[test]
    fn test_runtime_state_dir_name() {
        assert!(runtime_state_dir().ends_with("state"));
    }

    #[test]
    fn test_table_file_names() {
        assert!(users_file().ends_with("state/users.json"));
        assert!(subscriptions_file().ends_with("state/subscriptions.json"));
    }

    #[test]
    fn test_env_file_name() {
        assert!(env_file().ends_with(".env"));
    }
}
