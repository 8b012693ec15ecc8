use std::path::Path;

use anyhow::{bail, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Pool, Sqlite};
use thiserror::Error;

use crate::secrets::SecretCipher;

mod identities;
mod trackers;
mod types;
mod users;

#[cfg(test)]
mod tests;

pub use types::{
    IdentityRecord, NewIdentity, NewTracker, NewUser, TrackerFilter, TrackerKind, TrackerRecord,
    TrackerUpdate, UnknownTrackerKind, UserRecord,
};

/// Persistence failures, classified so the HTTP layer can pick a status.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> Self {
        match &error {
            sqlx::Error::RowNotFound => Self::NotFound("row not found".to_string()),
            sqlx::Error::Database(db_error)
                if db_error.is_unique_violation()
                    || db_error.is_foreign_key_violation()
                    || db_error.is_check_violation() =>
            {
                Self::Conflict(db_error.message().to_string())
            }
            _ => Self::Unexpected(error.into()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DbClient {
    pool: Pool<Sqlite>,
    secrets: Option<SecretCipher>,
}

impl DbClient {
    /// Opens a pooled connection to the SQLite file at `database_url`.
    ///
    /// # Errors
    /// Returns an error if the pool cannot be created.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let connect_options = SqliteConnectOptions::new()
            .filename(database_url)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;

        Ok(Self {
            pool,
            secrets: None,
        })
    }

    /// Creates the parent directory, connects and applies migrations.
    ///
    /// # Errors
    /// Returns an error if the directory, connection or migrations fail.
    pub async fn initialize(database_path: &str) -> Result<Self> {
        if let Some(parent_dir) = Path::new(database_path).parent() {
            std::fs::create_dir_all(parent_dir)?;
        }

        let db = Self::connect(database_path).await?;
        db.run_migrations().await?;
        db.ensure_wal_mode().await?;

        tracing::info!(database_path, "database initialized");
        Ok(db)
    }

    /// # Errors
    /// Returns an error if a migration fails to apply.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// # Errors
    /// Returns an error if the journal mode cannot be switched to WAL.
    pub async fn ensure_wal_mode(&self) -> Result<()> {
        let journal_mode: String = sqlx::query_scalar("PRAGMA journal_mode=WAL;")
            .fetch_one(&self.pool)
            .await?;

        if journal_mode.to_uppercase() != "WAL" {
            bail!("SQLite WAL mode is not enabled");
        }

        Ok(())
    }

    /// Enables sealing of stored credentials.
    #[must_use]
    pub fn with_secret_cipher(mut self, cipher: SecretCipher) -> Self {
        self.secrets = Some(cipher);
        self
    }

    /// Encrypts a credential for storage. Empty values stay empty.
    fn seal_secret(&self, value: &str) -> StoreResult<String> {
        if value.is_empty() {
            return Ok(String::new());
        }

        let cipher = self.secrets.as_ref().ok_or_else(|| {
            StoreError::Unexpected(anyhow::anyhow!("secret key is not configured"))
        })?;
        Ok(cipher.encrypt(value)?)
    }

    #[must_use]
    pub fn pool(&self) -> Pool<Sqlite> {
        self.pool.clone()
    }
}
