//! Durable persistence of one [`OAuthToken`] per (user, provider).
//!
//! The store is the single writer for token records. Absence is a normal
//! `Ok(None)`; every `Err` is a real storage failure.

mod memory;
mod sqlite;

pub use memory::MemoryTokenStore;
pub use sqlite::SqliteTokenStore;

use async_trait::async_trait;

use crate::common::{OAuthToken, TokenGrant};
use crate::error::StorageError;

#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn get(
        &self,
        user_id: &str,
        provider: &str,
    ) -> Result<Option<OAuthToken>, StorageError>;

    /// Insert or overwrite the record for the key. `created_at` is kept on overwrite.
    async fn upsert(
        &self,
        user_id: &str,
        provider: &str,
        grant: &TokenGrant,
    ) -> Result<(), StorageError>;

    /// Overwrite an existing record only. Returns `false` when no record exists.
    async fn update(
        &self,
        user_id: &str,
        provider: &str,
        grant: &TokenGrant,
    ) -> Result<bool, StorageError>;

    /// Deleting a missing record succeeds
    async fn delete(&self, user_id: &str, provider: &str) -> Result<(), StorageError>;
}
