//! Inbound command parsing
//!
//! A pure parser from inbound message text to a tagged command. Routing and
//! user-visible responses live in the gateway; nothing here touches I/O.

use serde::{Deserialize, Serialize};

/// Recognized inbound commands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// First contact / "start"
    Start,
    /// Redeem a subscription key
    Redeem { code: String },
    /// User asks for their own subscription state
    Status,
    /// Admin: create a key with the given duration in days
    CreateKey { days: i64 },
    /// Admin: list all keys
    ListKeys,
    /// Admin: active-subscriber count
    Stats,
    /// Anything unrecognized
    Help,
}

impl Command {
    /// Parse inbound text. The verb is case-insensitive and may carry a
    /// leading slash and a `@botname` suffix; arguments are whitespace-split.
    pub fn parse(text: &str) -> Command {
        let mut parts = text.split_whitespace();
        let Some(verb) = parts.next() else {
            return Command::Help;
        };
        let verb = verb
            .trim_start_matches('/')
            .split('@')
            .next()
            .unwrap_or("")
            .to_ascii_lowercase();

        match verb.as_str() {
            "start" => Command::Start,
            "redeem" => match parts.next() {
                Some(code) => Command::Redeem {
                    code: code.to_string(),
                },
                None => Command::Help,
            },
            "status" => Command::Status,
            "create-key" | "createkey" => match parts.next().and_then(|d| d.parse::<i64>().ok()) {
                Some(days) => Command::CreateKey { days },
                None => Command::Help,
            },
            "list-keys" | "listkeys" => Command::ListKeys,
            "stats" => Command::Stats,
            _ => Command::Help,
        }
    }
}
