use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Telegram-assigned user identifier
pub type UserId = i64;

/// Seconds since the Unix epoch (subscription expiries, key timestamps)
pub type EpochSeconds = i64;

/// Price value - uses Decimal for precision
pub type Price = Decimal;

/// Timestamp in UTC
pub type Timestamp = DateTime<Utc>;

/// Symbol identifier for a tradeable instrument
pub type Symbol = String;

/// Seconds in one day; subscription durations are whole days
pub const SECONDS_PER_DAY: i64 = 86_400;
