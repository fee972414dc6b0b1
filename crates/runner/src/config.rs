use std::path::PathBuf;

use chrono::NaiveTime;
use thiserror::Error;

/// Administrator fallback when `ADMIN_ID` is unset
pub const DEFAULT_ADMIN_ID: i64 = 7_378_889_303;
/// Public XAUUSD chart endpoint; `{symbol}` is substituted per fetch
pub const DEFAULT_API_URL: &str = "https://api.gold-api.com/price/{symbol}";
const DEFAULT_DB_PATH: &str = "midas.db";
const DEFAULT_CHECK_EXPIRE_HOURS: i64 = 1;
const DEFAULT_NOTIFY_BEFORE_HOURS: i64 = 6;
const DEFAULT_FIRE_AT: &str = "09:00";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing bot credential: set TELEGRAM_BOT_TOKEN or BOT_TOKEN")]
    MissingToken,

    #[error("{var} must be an integer, got {value:?}")]
    InvalidInteger { var: &'static str, value: String },

    #[error("{var} must be positive, got {value}")]
    NonPositive { var: &'static str, value: i64 },

    #[error("{var} must be HH:MM, got {value:?}")]
    InvalidTime { var: &'static str, value: String },
}

/// Immutable process configuration, read once at startup
#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: String,
    pub admin_id: i64,
    pub api_url: String,
    pub db_path: PathBuf,
    pub check_expire_hours: i64,
    pub notify_before_hours: i64,
    /// Local time of the daily signal tick
    pub fire_at: NaiveTime,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any variable source; `from_env` wraps the real one
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bot_token = get("TELEGRAM_BOT_TOKEN")
            .or_else(|| get("BOT_TOKEN"))
            .filter(|token| !token.trim().is_empty())
            .ok_or(ConfigError::MissingToken)?;

        let admin_id = int_var(&get, "ADMIN_ID")?.unwrap_or(DEFAULT_ADMIN_ID);
        let check_expire_hours = positive_var(&get, "CHECK_EXPIRE_HOURS")?
            .unwrap_or(DEFAULT_CHECK_EXPIRE_HOURS);
        let notify_before_hours = positive_var(&get, "NOTIFY_BEFORE_HOURS")?
            .unwrap_or(DEFAULT_NOTIFY_BEFORE_HOURS);

        let fire_raw = get("SIGNAL_FIRE_AT").unwrap_or_else(|| DEFAULT_FIRE_AT.to_string());
        let fire_at = NaiveTime::parse_from_str(&fire_raw, "%H:%M").map_err(|_| {
            ConfigError::InvalidTime {
                var: "SIGNAL_FIRE_AT",
                value: fire_raw,
            }
        })?;

        Ok(Self {
            bot_token,
            admin_id,
            api_url: get("API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            db_path: get("DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH)),
            check_expire_hours,
            notify_before_hours,
            fire_at,
        })
    }
}

fn int_var(
    get: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<i64>, ConfigError> {
    match get(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidInteger { var, value }),
    }
}

fn positive_var(
    get: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<i64>, ConfigError> {
    match int_var(get, var)? {
        Some(value) if value <= 0 => Err(ConfigError::NonPositive { var, value }),
        other => Ok(other),
    }
}
