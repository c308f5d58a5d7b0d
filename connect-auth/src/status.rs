//! Connection status state machine for one provider.
//!
//! `get_status` and `test_access` are read-only. Only `ensure_fresh_token`
//! and `connect_with_client_credentials` write tokens, and only after the
//! token endpoint has returned a complete grant. A refresh only ever updates
//! an existing record, it never re-creates one.

use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::common::{ConnectionStatus, FreshToken, OAuthToken, ProviderCredentials};
use crate::error::{ConnectError, RefreshError};
use crate::probe::ConnectionProbe;
use crate::refresher::TokenRefresher;
use crate::store::TokenStore;

pub struct ConnectionStatusService {
    credentials: ProviderCredentials,
    store: Arc<dyn TokenStore>,
    refresher: Arc<dyn TokenRefresher>,
    probe: Arc<dyn ConnectionProbe>,
    refresh_leeway: Duration,
}

impl ConnectionStatusService {
    pub fn new(
        credentials: ProviderCredentials,
        store: Arc<dyn TokenStore>,
        refresher: Arc<dyn TokenRefresher>,
        probe: Arc<dyn ConnectionProbe>,
    ) -> Self {
        Self {
            credentials,
            store,
            refresher,
            probe,
            refresh_leeway: Duration::zero(),
        }
    }

    /// Refresh tokens that expire within `leeway`, not only expired ones
    pub fn with_refresh_leeway(mut self, leeway: Duration) -> Self {
        self.refresh_leeway = leeway;
        self
    }

    pub fn provider(&self) -> &str {
        &self.credentials.provider
    }

    async fn load(&self, user_id: &str) -> Result<Option<OAuthToken>, ConnectError> {
        let token = self.store.get(user_id, self.provider()).await?;
        Ok(token.filter(OAuthToken::has_access_token))
    }

    /// Current state of the user's connection. Never refreshes.
    pub async fn get_status(&self, user_id: &str) -> ConnectionStatus {
        match self.store.get(user_id, self.provider()).await {
            Ok(Some(token)) => ConnectionStatus::from_token(&token, Utc::now()),
            Ok(None) => ConnectionStatus::not_connected(self.provider()),
            Err(e) => {
                tracing::error!(
                    user_id = %user_id,
                    provider = %self.provider(),
                    error = %e,
                    "Failed to read token for status"
                );
                ConnectionStatus::error(self.provider(), e.to_string())
            }
        }
    }

    /// Whether the stored token is accepted by the provider right now.
    /// Missing or expired tokens answer `false` without a network call.
    pub async fn test_access(&self, user_id: &str) -> bool {
        let token = match self.load(user_id).await {
            Ok(Some(token)) => token,
            Ok(None) => return false,
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "Access test could not read token");
                return false;
            }
        };

        if token.is_expired_at(Utc::now()) {
            tracing::debug!(user_id = %user_id, "Access test skipped, token expired");
            return false;
        }

        match token.access_token.as_deref() {
            Some(access_token) => self.probe.probe(access_token).await,
            None => false,
        }
    }

    /// Refresh the user's token if it is expired (or inside the leeway) and persist the result.
    /// A failed refresh leaves the stored record untouched.
    pub async fn ensure_fresh_token(&self, user_id: &str) -> Result<FreshToken, ConnectError> {
        let token = self.load(user_id).await?.ok_or(ConnectError::NotConnected)?;
        let now = Utc::now();

        if let Some(expires_at) = token.expires_at {
            if !token.expires_within(now, self.refresh_leeway) {
                return Ok(FreshToken {
                    expires_at,
                    refreshed: false,
                });
            }
        }

        let refresh_token = token
            .refresh_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or(ConnectError::NotRefreshable)?;

        let grant = match self.refresher.refresh(refresh_token, &self.credentials).await {
            Ok(grant) => grant,
            Err(e) => {
                // Revoked refresh tokens are reported, not deleted; disconnect is the caller's call
                match &e {
                    RefreshError::AuthRejected { .. } => tracing::warn!(
                        user_id = %user_id,
                        provider = %self.provider(),
                        error = %e,
                        "Refresh rejected, re-authorization required"
                    ),
                    RefreshError::MalformedResponse(_) => tracing::warn!(
                        user_id = %user_id,
                        provider = %self.provider(),
                        error = %e,
                        "Refresh returned a malformed response, retryable"
                    ),
                    RefreshError::Transient(_) => tracing::warn!(
                        user_id = %user_id,
                        provider = %self.provider(),
                        error = %e,
                        "Refresh failed transiently, retryable"
                    ),
                }
                return Err(e.into());
            }
        };

        // Update-only: a disconnect that landed during the refresh wins
        if !self.store.update(user_id, self.provider(), &grant).await? {
            tracing::info!(
                user_id = %user_id,
                provider = %self.provider(),
                "Token disconnected during refresh, discarding new grant"
            );
            return Err(ConnectError::NotConnected);
        }

        tracing::info!(
            user_id = %user_id,
            provider = %self.provider(),
            expires_at = %grant.expires_at,
            "Token refreshed"
        );

        Ok(FreshToken {
            expires_at: grant.expires_at,
            refreshed: true,
        })
    }

    /// Initial grant for service integrations that use the client-credentials flow
    pub async fn connect_with_client_credentials(
        &self,
        user_id: &str,
    ) -> Result<ConnectionStatus, ConnectError> {
        let grant = self.refresher.acquire(&self.credentials).await?;
        self.store.upsert(user_id, self.provider(), &grant).await?;

        tracing::info!(
            user_id = %user_id,
            provider = %self.provider(),
            expires_at = %grant.expires_at,
            "Connected with client credentials"
        );

        Ok(self.get_status(user_id).await)
    }

    /// Remove the user's token. Idempotent.
    pub async fn disconnect(&self, user_id: &str) -> Result<(), ConnectError> {
        self.store.delete(user_id, self.provider()).await?;
        tracing::info!(user_id = %user_id, provider = %self.provider(), "Disconnected");
        Ok(())
    }
}
