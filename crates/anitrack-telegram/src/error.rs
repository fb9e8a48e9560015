//! Error types for the Telegram bot.

use thiserror::Error;

/// Errors that can occur while starting or running the bot.
#[derive(Debug, Error)]
pub enum TelegramError {
    /// Bot token not provided or invalid.
    #[error("Telegram bot token not set. Set TELEGRAM_BOT_TOKEN environment variable.")]
    NoToken,

    /// Failed to start the bot.
    #[error("Failed to start bot: {0}")]
    BotStartFailed(String),

    /// Catalog client could not be built.
    #[error("Catalog error: {0}")]
    Catalog(#[from] anitrack_catalog::CatalogError),

    /// Store could not be opened.
    #[error("Persistence error: {0}")]
    Persistence(#[from] anitrack_persistence::PersistenceError),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for Telegram operations.
pub type Result<T> = std::result::Result<T, TelegramError>;

#[cfg(test)]
mod tests {
    use super::*;
    use anitrack_catalog::ShikimoriClient;
    use anitrack_persistence::PersistenceError;

    fn connect(url: &str) -> Result<ShikimoriClient> {
        Ok(ShikimoriClient::with_endpoint(url)?)
    }

    fn lookup() -> Result<()> {
        let missing: anitrack_persistence::Result<()> = Err(PersistenceError::NotFound {
            kind: "subscriber",
            id: "7".to_string(),
        });
        missing?;
        Ok(())
    }

    fn read_env(path: &str) -> Result<String> {
        Ok(std::fs::read_to_string(path)?)
    }

    #[test]
    fn test_setup_failures_keep_their_source() {
        assert!(matches!(connect("not a url"), Err(TelegramError::Catalog(_))));
        assert!(matches!(lookup(), Err(TelegramError::Persistence(_))));
        assert!(matches!(
            read_env("/nonexistent-anitrack/.env"),
            Err(TelegramError::IoError(_))
        ));
    }
}
