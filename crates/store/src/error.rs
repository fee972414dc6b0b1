use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("key code already exists: {0}")]
    DuplicateKey(String),

    #[error("key duration must be positive, got {0}")]
    InvalidDuration(i64),
}

pub type Result<T> = std::result::Result<T, StoreError>;
