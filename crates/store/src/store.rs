use std::path::Path;

use midas_core::values::SECONDS_PER_DAY;
use midas_core::{EpochSeconds, Key, User, UserId};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::error::{Result, StoreError};

/// Result of the atomic key-redemption update.
///
/// These are user-visible outcomes, not errors: an invalid or spent code is
/// answered in chat, never propagated as a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedeemOutcome {
    /// The key was consumed; the user is active until `expiry`
    Granted { expiry: EpochSeconds },
    KeyNotFound,
    KeyAlreadyUsed,
}

#[derive(sqlx::FromRow)]
struct UserRow {
    telegram_id: i64,
    username: Option<String>,
    active: bool,
    expiry: i64,
    notified_expiry: i64,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            user_id: row.telegram_id,
            username: row.username,
            active: row.active,
            expiry: row.expiry,
            notified_expiry: row.notified_expiry,
        }
    }
}

#[derive(sqlx::FromRow)]
struct KeyRow {
    key_code: String,
    duration_days: i64,
    created_at: i64,
    used_by: Option<i64>,
    consumed_at: Option<i64>,
    expiry: Option<i64>,
}

impl From<KeyRow> for Key {
    fn from(row: KeyRow) -> Self {
        Key {
            code: row.key_code,
            duration_days: row.duration_days,
            created_at: row.created_at,
            used_by: row.used_by,
            consumed_at: row.consumed_at,
            subscription_expiry: row.expiry,
        }
    }
}

const SELECT_USER: &str =
    "SELECT telegram_id, username, active, expiry, notified_expiry FROM users";
const SELECT_KEY: &str =
    "SELECT key_code, duration_days, created_at, used_by, consumed_at, expiry FROM keys";

/// Single-writer store over the embedded SQLite file
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open (or create) the store at the given path and run migrations
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true);
        Self::with_options(options).await
    }

    /// Fresh in-memory store, used by tests
    pub async fn in_memory() -> Result<Self> {
        Self::with_options(SqliteConnectOptions::new().in_memory(true)).await
    }

    async fn with_options(options: SqliteConnectOptions) -> Result<Self> {
        // One connection, kept alive for the process lifetime: all reads and
        // writes serialize on it, which is the single-writer discipline the
        // redemption and expiry passes rely on.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    /// Insert the user if absent (inactive, no expiry), else refresh the handle
    pub async fn upsert_user(&self, user_id: UserId, username: Option<&str>) -> Result<User> {
        sqlx::query(
            "INSERT INTO users (telegram_id, username) VALUES (?1, ?2) \
             ON CONFLICT(telegram_id) DO UPDATE SET username = excluded.username",
        )
        .bind(user_id)
        .bind(username)
        .execute(&self.pool)
        .await?;

        let row: UserRow = sqlx::query_as(&format!("{SELECT_USER} WHERE telegram_id = ?1"))
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    pub async fn find_user(&self, user_id: UserId) -> Result<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(&format!("{SELECT_USER} WHERE telegram_id = ?1"))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    /// All users currently flagged active, in a stable order
    pub async fn active_users(&self) -> Result<Vec<User>> {
        let rows: Vec<UserRow> =
            sqlx::query_as(&format!("{SELECT_USER} WHERE active = 1 ORDER BY telegram_id"))
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Active users whose expiry falls inside the trailing window and who
    /// have not yet been notified for that expiry value
    pub async fn users_expiring_within(
        &self,
        now: EpochSeconds,
        window_seconds: i64,
    ) -> Result<Vec<User>> {
        let rows: Vec<UserRow> = sqlx::query_as(&format!(
            "{SELECT_USER} WHERE active = 1 \
             AND expiry > ?1 AND expiry - ?1 <= ?2 \
             AND notified_expiry != expiry \
             ORDER BY expiry"
        ))
        .bind(now)
        .bind(window_seconds)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn create_key(
        &self,
        code: &str,
        duration_days: i64,
        now: EpochSeconds,
    ) -> Result<Key> {
        if duration_days <= 0 {
            return Err(StoreError::InvalidDuration(duration_days));
        }

        let inserted = sqlx::query(
            "INSERT INTO keys (key_code, duration_days, created_at) VALUES (?1, ?2, ?3)",
        )
        .bind(code)
        .bind(duration_days)
        .bind(now)
        .execute(&self.pool)
        .await;

        match inserted {
            Ok(_) => Ok(Key {
                code: code.to_string(),
                duration_days,
                created_at: now,
                used_by: None,
                consumed_at: None,
                subscription_expiry: None,
            }),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(StoreError::DuplicateKey(code.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// All keys, newest first
    pub async fn list_keys(&self) -> Result<Vec<Key>> {
        let rows: Vec<KeyRow> =
            sqlx::query_as(&format!("{SELECT_KEY} ORDER BY created_at DESC, id DESC"))
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Atomic compound redemption.
    ///
    /// Consumes the key and grants the user `max(existing expiry, now) +
    /// duration` in one transaction. The key update is guarded by
    /// `used_by IS NULL`, so of any set of concurrent redemptions of one code
    /// exactly one observes the unused key and wins.
    pub async fn redeem_key(
        &self,
        code: &str,
        user_id: UserId,
        now: EpochSeconds,
    ) -> Result<RedeemOutcome> {
        let mut tx = self.pool.begin().await?;

        let key: Option<KeyRow> = sqlx::query_as(&format!("{SELECT_KEY} WHERE key_code = ?1"))
            .bind(code)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(key) = key else {
            return Ok(RedeemOutcome::KeyNotFound);
        };
        if key.used_by.is_some() {
            return Ok(RedeemOutcome::KeyAlreadyUsed);
        }

        let existing_expiry: Option<i64> =
            sqlx::query_scalar("SELECT expiry FROM users WHERE telegram_id = ?1")
                .bind(user_id)
                .fetch_optional(&mut *tx)
                .await?;

        // Unexpired time remaining extends from the old expiry, not from now
        let base = existing_expiry.unwrap_or(0).max(now);
        let expiry = base + key.duration_days * SECONDS_PER_DAY;

        let consumed = sqlx::query(
            "UPDATE keys SET used_by = ?1, consumed_at = ?2, expiry = ?3 \
             WHERE key_code = ?4 AND used_by IS NULL",
        )
        .bind(user_id)
        .bind(now)
        .bind(expiry)
        .bind(code)
        .execute(&mut *tx)
        .await?;
        if consumed.rows_affected() == 0 {
            return Ok(RedeemOutcome::KeyAlreadyUsed);
        }

        // The expiry moved, so any earlier pre-expiry notice no longer applies
        sqlx::query(
            "INSERT INTO users (telegram_id, active, expiry, notified_expiry) \
             VALUES (?1, 1, ?2, 0) \
             ON CONFLICT(telegram_id) DO UPDATE SET \
             active = 1, expiry = ?2, notified_expiry = 0",
        )
        .bind(user_id)
        .bind(expiry)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(RedeemOutcome::Granted { expiry })
    }

    /// Deactivate every active user whose expiry has passed; returns the
    /// deactivated users so the caller can send the one-shot expiry notice
    pub async fn deactivate_expired(&self, now: EpochSeconds) -> Result<Vec<User>> {
        let mut tx = self.pool.begin().await?;

        let rows: Vec<UserRow> =
            sqlx::query_as(&format!("{SELECT_USER} WHERE active = 1 AND expiry <= ?1"))
                .bind(now)
                .fetch_all(&mut *tx)
                .await?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query("UPDATE users SET active = 0 WHERE active = 1 AND expiry <= ?1")
            .bind(now)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let mut user: User = row.into();
                user.active = false;
                user
            })
            .collect())
    }

    pub async fn mark_pre_expiry_notified(
        &self,
        user_id: UserId,
        expiry: EpochSeconds,
    ) -> Result<()> {
        sqlx::query("UPDATE users SET notified_expiry = ?2 WHERE telegram_id = ?1")
            .bind(user_id)
            .bind(expiry)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
