use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;

use super::TokenStore;
use crate::common::{OAuthToken, TokenGrant};
use crate::error::StorageError;

type TokenKey = (String, String);

/// Process-local token store, for tests and single-node development
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    tokens: Arc<DashMap<TokenKey, OAuthToken>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        tracing::info!("In-memory token store initialized");
        Self::default()
    }

    /// Insert a raw record, bypassing `upsert` (for seeding fixtures)
    pub fn insert_record(&self, token: OAuthToken) {
        let key = (token.user_id.clone(), token.provider.clone());
        self.tokens.insert(key, token);
    }

    /// Get record count (for monitoring)
    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn get(
        &self,
        user_id: &str,
        provider: &str,
    ) -> Result<Option<OAuthToken>, StorageError> {
        let key = (user_id.to_string(), provider.to_string());
        Ok(self.tokens.get(&key).map(|t| t.clone()))
    }

    async fn upsert(
        &self,
        user_id: &str,
        provider: &str,
        grant: &TokenGrant,
    ) -> Result<(), StorageError> {
        let now = Utc::now();
        let key = (user_id.to_string(), provider.to_string());

        // The entry guard holds the shard lock, so the overwrite is atomic per key
        self.tokens
            .entry(key)
            .and_modify(|t| {
                t.access_token = Some(grant.access_token.clone());
                t.refresh_token = grant.refresh_token.clone();
                t.expires_at = Some(grant.expires_at);
                t.updated_at = now;
            })
            .or_insert_with(|| OAuthToken {
                user_id: user_id.to_string(),
                provider: provider.to_string(),
                access_token: Some(grant.access_token.clone()),
                refresh_token: grant.refresh_token.clone(),
                expires_at: Some(grant.expires_at),
                created_at: now,
                updated_at: now,
            });

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
        let key = (user_id.to_string(), provider.to_string());
        let updated = self
            .tokens
            .get_mut(&key)
            .map(|mut t| {
                t.access_token = Some(grant.access_token.clone());
                t.refresh_token = grant.refresh_token.clone();
                t.expires_at = Some(grant.expires_at);
                t.updated_at = Utc::now();
            })
            .is_some();

        tracing::debug!(user_id = %user_id, provider = %provider, updated, "Token update");
        Ok(updated)
    }

    async fn delete(&self, user_id: &str, provider: &str) -> Result<(), StorageError> {
        let key = (user_id.to_string(), provider.to_string());
        self.tokens.remove(&key);
        tracing::debug!(user_id = %user_id, provider = %provider, "Token deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn upsert_get_delete() {
        let store = MemoryTokenStore::new();
        let grant = TokenGrant {
            access_token: "a1".to_string(),
            refresh_token: Some("r1".to_string()),
            expires_at: Utc::now() + Duration::hours(1),
        };

        assert!(store.get("u1", "microsoft").await.unwrap().is_none());

        store.upsert("u1", "microsoft", &grant).await.unwrap();
        let token = store.get("u1", "microsoft").await.unwrap().unwrap();
        assert_eq!(token.access_token.as_deref(), Some("a1"));
        assert_eq!(token.expires_at, Some(grant.expires_at));

        store.delete("u1", "microsoft").await.unwrap();
        store.delete("u1", "microsoft").await.unwrap();
        assert_eq!(store.token_count(), 0);
    }

    #[tokio::test]
    async fn update_only_touches_existing_records() {
        let store = MemoryTokenStore::new();
        let grant = TokenGrant {
            access_token: "a2".to_string(),
            refresh_token: Some("r1".to_string()),
            expires_at: Utc::now() + Duration::hours(1),
        };

        assert!(!store.update("u1", "microsoft", &grant).await.unwrap());
        assert_eq!(store.token_count(), 0);

        let first = TokenGrant {
            access_token: "a1".to_string(),
            ..grant.clone()
        };
        store.upsert("u1", "microsoft", &first).await.unwrap();
        assert!(store.update("u1", "microsoft", &grant).await.unwrap());

        let token = store.get("u1", "microsoft").await.unwrap().unwrap();
        assert_eq!(token.access_token.as_deref(), Some("a2"));
    }

    #[tokio::test]
    async fn concurrent_upserts_leave_one_whole_record() {
        let store = MemoryTokenStore::new();
        let expires_at = Utc::now() + Duration::hours(1);

        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let grant = TokenGrant {
                    access_token: format!("a{i}"),
                    refresh_token: Some(format!("r{i}")),
                    expires_at,
                };
                store.upsert("u1", "microsoft", &grant).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.token_count(), 1);
        let token = store.get("u1", "microsoft").await.unwrap().unwrap();
        let access = token.access_token.unwrap();
        let refresh = token.refresh_token.unwrap();
        // Access and refresh tokens come from the same writer
        assert_eq!(access[1..], refresh[1..]);
    }
}
