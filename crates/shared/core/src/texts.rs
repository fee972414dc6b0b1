//! User-visible strings
//!
//! Every message the bot sends is rendered here, in one place, so wording
//! stays out of the business logic.

use chrono::{DateTime, Local};

use crate::entities::Key;
use crate::signal::Signal;
use crate::values::{EpochSeconds, Timestamp};

/// Local-timezone rendering used in every user-facing timestamp
pub const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Render an epoch-second instant in the local timezone
pub fn format_epoch(epoch: EpochSeconds) -> String {
    match DateTime::from_timestamp(epoch, 0) {
        Some(utc) => utc.with_timezone(&Local).format(TS_FORMAT).to_string(),
        None => epoch.to_string(),
    }
}

/// Render a UTC timestamp in the local timezone
pub fn format_timestamp(ts: Timestamp) -> String {
    ts.with_timezone(&Local).format(TS_FORMAT).to_string()
}

/// The outbound signal message, one field per line
pub fn signal_message(signal: &Signal) -> String {
    format!(
        "\u{1F4CA} Signal #{confidence}%\n\
         Symbol: {symbol}\n\
         Type: {direction}\n\
         Entry: {entry}\n\
         SL: {stop_loss}\n\
         TP: {take_profit}\n\
         Time: {time}",
        confidence = signal.confidence,
        symbol = signal.symbol,
        direction = signal.direction.as_str(),
        entry = signal.entry,
        stop_loss = signal.stop_loss,
        take_profit = signal.take_profit,
        time = format_timestamp(signal.timestamp),
    )
}

pub fn welcome() -> &'static str {
    "Welcome to Midas signals.\n\
     Redeem an access key with: redeem <code>\n\
     Check your subscription with: status"
}

pub fn help() -> &'static str {
    "Commands:\n\
     start - register\n\
     redeem <code> - activate a subscription key\n\
     status - show your subscription"
}

pub fn activated_until(expiry: EpochSeconds) -> String {
    format!("Subscription activated until {}", format_epoch(expiry))
}

pub fn key_already_used() -> &'static str {
    "This key was already used."
}

pub fn invalid_code() -> &'static str {
    "Invalid key code."
}

pub fn invalid_duration() -> &'static str {
    "Key duration must be a positive number of days."
}

pub fn key_created(code: &str, days: i64) -> String {
    format!("Created {days}-day key:\n{code}")
}

pub fn keys_list(keys: &[Key]) -> String {
    if keys.is_empty() {
        return "No keys created yet.".to_string();
    }
    let mut lines = Vec::with_capacity(keys.len());
    for key in keys {
        let state = match key.used_by {
            Some(user_id) => format!("redeemed by {user_id}"),
            None => "unused".to_string(),
        };
        lines.push(format!("{} ({}d, {})", key.code, key.duration_days, state));
    }
    lines.join("\n")
}

pub fn expiring_soon(hours: i64) -> String {
    format!(
        "Your subscription expires in about {hours}h. Redeem a new key to keep receiving signals."
    )
}

pub fn expired_notice() -> &'static str {
    "Your subscription has expired. Redeem a new key to reactivate."
}

pub fn status_active(expiry: EpochSeconds) -> String {
    format!("Subscription active until {}", format_epoch(expiry))
}

pub fn status_inactive() -> &'static str {
    "No active subscription. Redeem a key with: redeem <code>"
}

pub fn stats(active: usize) -> String {
    format!("Active subscribers: {active}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::Direction;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    #[test]
    fn signal_message_carries_every_field_in_order() {
        let signal = Signal::from_market("XAUUSD", Direction::Sell, dec!(2300.00), 84, Utc::now());
        let text = signal_message(&signal);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 7);
        assert!(lines[0].contains("Signal #84%"));
        assert_eq!(lines[1], "Symbol: XAUUSD");
        assert_eq!(lines[2], "Type: Sell");
        assert_eq!(lines[3], "Entry: 2300.00");
        assert_eq!(lines[4], "SL: 2288.50");
        assert_eq!(lines[5], "TP: 2311.50");
        assert!(lines[6].starts_with("Time: "));
    }

    #[test]
    fn keys_list_renders_usage_state() {
        let keys = vec![
            Key {
                code: "aaa".into(),
                duration_days: 7,
                created_at: 10,
                used_by: Some(42),
                consumed_at: Some(20),
                subscription_expiry: Some(700_000),
            },
            Key {
                code: "bbb".into(),
                duration_days: 30,
                created_at: 5,
                used_by: None,
                consumed_at: None,
                subscription_expiry: None,
            },
        ];
        let text = keys_list(&keys);
        assert!(text.contains("aaa (7d, redeemed by 42)"));
        assert!(text.contains("bbb (30d, unused)"));
        assert_eq!(keys_list(&[]), "No keys created yet.");
    }
}
