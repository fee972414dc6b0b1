//! Midas Gateway
//!
//! The chat-transport boundary: a minimal Telegram Bot API client (outbound
//! `sendMessage`, inbound `getUpdates` long-polling), the `Messenger` port
//! implementation with its transient/permanent error split, and the inbound
//! router that turns parsed commands into subscription-manager calls.

mod error;
mod poll;
mod router;
mod telegram;

pub use error::GatewayError;
pub use poll::run_polling;
pub use router::InboundRouter;
pub use telegram::{wire, TelegramClient};
