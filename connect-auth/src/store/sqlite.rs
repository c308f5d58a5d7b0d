use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;

use super::TokenStore;
use crate::common::{OAuthToken, TokenGrant};
use crate::error::StorageError;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS oauth_tokens (
    user_id         TEXT NOT NULL,
    provider        TEXT NOT NULL,
    access_token    TEXT,
    refresh_token   TEXT,
    expires_at      TEXT,
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL,
    UNIQUE(user_id, provider)
)
"#;

#[derive(Debug, FromRow)]
struct TokenRow {
    user_id: String,
    provider: String,
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TokenRow> for OAuthToken {
    fn from(row: TokenRow) -> Self {
        Self {
            user_id: row.user_id,
            provider: row.provider,
            access_token: row.access_token,
            refresh_token: row.refresh_token,
            expires_at: row.expires_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// SQLite-backed token store
#[derive(Debug, Clone)]
pub struct SqliteTokenStore {
    pool: SqlitePool,
}

impl SqliteTokenStore {
    /// Open (creating if needed) the database at `database_url`
    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        tracing::info!("Token database opened: {}", database_url);
        Self::with_pool(pool).await
    }

    /// Open an in-memory database (for testing)
    pub async fn open_in_memory() -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;

        // In-memory must be a single, never-recycled connection to share state
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Self::with_pool(pool).await
    }

    pub async fn with_pool(pool: SqlitePool) -> Result<Self, StorageError> {
        sqlx::query(SCHEMA).execute(&pool).await?;
        tracing::debug!("Token schema ready");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl TokenStore for SqliteTokenStore {
    async fn get(
        &self,
        user_id: &str,
        provider: &str,
    ) -> Result<Option<OAuthToken>, StorageError> {
        let row = sqlx::query_as::<_, TokenRow>(
            r#"
            SELECT user_id, provider, access_token, refresh_token, expires_at, created_at, updated_at
            FROM oauth_tokens
            WHERE user_id = ?1 AND provider = ?2
            "#,
        )
        .bind(user_id)
        .bind(provider)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(OAuthToken::from))
    }

    async fn upsert(
        &self,
        user_id: &str,
        provider: &str,
        grant: &TokenGrant,
    ) -> Result<(), StorageError> {
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO oauth_tokens
                (user_id, provider, access_token, refresh_token, expires_at, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            ON CONFLICT (user_id, provider)
            DO UPDATE SET
                access_token = excluded.access_token,
                refresh_token = excluded.refresh_token,
                expires_at = excluded.expires_at,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(user_id)
        .bind(provider)
        .bind(&grant.access_token)
        .bind(&grant.refresh_token)
        .bind(grant.expires_at)
        .bind(now)
        .execute(&self.pool)
        .await?;

        tracing::debug!(
            user_id = %user_id,
            provider = %provider,
            expires_at = %grant.expires_at,
            "Token upserted"
        );
        Ok(())
    }

    async fn update(
        &self,
        user_id: &str,
        provider: &str,
        grant: &TokenGrant,
    ) -> Result<bool, StorageError> {
        let result = sqlx::query(
            r#"
            UPDATE oauth_tokens
            SET access_token = ?3, refresh_token = ?4, expires_at = ?5, updated_at = ?6
            WHERE user_id = ?1 AND provider = ?2
            "#,
        )
        .bind(user_id)
        .bind(provider)
        .bind(&grant.access_token)
        .bind(&grant.refresh_token)
        .bind(grant.expires_at)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let updated = result.rows_affected() > 0;
        tracing::debug!(
            user_id = %user_id,
            provider = %provider,
            updated,
            "Token update"
        );
        Ok(updated)
    }

    async fn delete(&self, user_id: &str, provider: &str) -> Result<(), StorageError> {
        let result = sqlx::query("DELETE FROM oauth_tokens WHERE user_id = ?1 AND provider = ?2")
            .bind(user_id)
            .bind(provider)
            .execute(&self.pool)
            .await?;

        tracing::debug!(
            user_id = %user_id,
            provider = %provider,
            removed = result.rows_affected(),
            "Token deleted"
        );
        Ok(())
    }
}
