use async_trait::async_trait;
use midas_core::UserId;
use thiserror::Error;

/// Outbound delivery failures, split by whether a retry can help
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SendError {
    /// Network blip, rate limit - worth retrying with backoff
    #[error("transient send failure: {0}")]
    Transient(String),

    /// User blocked the bot, chat gone - retrying cannot succeed
    #[error("permanent send failure: {0}")]
    Permanent(String),
}

impl SendError {
    pub fn is_permanent(&self) -> bool {
        matches!(self, SendError::Permanent(_))
    }
}

/// Port for the chat transport, outbound side
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Deliver one text message to one user
    async fn send(&self, user: UserId, text: &str) -> Result<(), SendError>;
}
