//! Token endpoint calls: refresh-token exchange and client-credentials grant.
//!
//! Nothing here touches storage. A failed call returns a classified
//! [`RefreshError`] and the caller decides whether to persist or retry.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::{header::ACCEPT, Client, StatusCode};
use secrecy::ExposeSecret;
use serde::Deserialize;

use crate::common::{ProviderCredentials, TokenGrant};
use crate::error::RefreshError;

/// Lifetime assumed when the provider omits `expires_in`
pub const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

#[async_trait]
pub trait TokenRefresher: Send + Sync {
    /// Exchange a refresh token for a new access token
    async fn refresh(
        &self,
        refresh_token: &str,
        credentials: &ProviderCredentials,
    ) -> Result<TokenGrant, RefreshError>;

    /// Obtain a token with the client-credentials grant
    async fn acquire(&self, credentials: &ProviderCredentials) -> Result<TokenGrant, RefreshError>;
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ExpiresIn {
    Seconds(i64),
    // Some providers send the lifetime as a quoted number
    Text(String),
}

impl ExpiresIn {
    fn seconds(&self) -> Option<i64> {
        match self {
            ExpiresIn::Seconds(secs) => Some(*secs),
            ExpiresIn::Text(text) => text.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<ExpiresIn>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorResponse {
    error: Option<String>,
    error_description: Option<String>,
}

/// Token endpoint client over reqwest
pub struct HttpTokenRefresher {
    http: Client,
}

impl HttpTokenRefresher {
    pub fn new(timeout: std::time::Duration) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }

    async fn request_token(
        &self,
        credentials: &ProviderCredentials,
        grant_params: &[(&str, &str)],
    ) -> Result<TokenGrant, RefreshError> {
        let mut form: Vec<(&str, &str)> = vec![
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.expose_secret()),
        ];
        form.extend_from_slice(grant_params);
        if let Some(scope) = credentials.scope.as_deref() {
            form.push(("scope", scope));
        }

        let response = self
            .http
            .post(&credentials.token_url)
            .header(ACCEPT, "application/json")
            .form(&form)
            .send()
            .await
            .map_err(|e| RefreshError::Transient(format!("Token request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RefreshError::Transient(format!("Failed to read token response: {e}")))?;

        if status != StatusCode::OK {
            return Err(classify_status(status, &body));
        }

        parse_token_body(&body, Utc::now())
    }
}

#[async_trait]
impl TokenRefresher for HttpTokenRefresher {
    async fn refresh(
        &self,
        refresh_token: &str,
        credentials: &ProviderCredentials,
    ) -> Result<TokenGrant, RefreshError> {
        let mut grant = self
            .request_token(
                credentials,
                &[
                    ("grant_type", "refresh_token"),
                    ("refresh_token", refresh_token),
                ],
            )
            .await?;

        // Rotation is optional; keep the old refresh token when none is issued
        if grant.refresh_token.is_none() {
            grant.refresh_token = Some(refresh_token.to_string());
        }

        tracing::debug!(
            provider = %credentials.provider,
            "Successfully refreshed tokens, expires_at: {}",
            grant.expires_at
        );
        Ok(grant)
    }

    async fn acquire(&self, credentials: &ProviderCredentials) -> Result<TokenGrant, RefreshError> {
        let grant = self
            .request_token(credentials, &[("grant_type", "client_credentials")])
            .await?;

        tracing::debug!(
            provider = %credentials.provider,
            "Acquired client-credentials token, expires_at: {}",
            grant.expires_at
        );
        Ok(grant)
    }
}

/// Map a non-200 token endpoint response to an error class
fn classify_status(status: StatusCode, body: &str) -> RefreshError {
    if status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
        || status.is_server_error()
    {
        return RefreshError::Transient(format!("Token endpoint returned {status}"));
    }

    if status.is_client_error() {
        let detail: ErrorResponse = serde_json::from_str(body).unwrap_or_default();
        return RefreshError::AuthRejected {
            status: status.as_u16(),
            error: detail.error.unwrap_or_else(|| "unknown_error".to_string()),
            description: detail.error_description,
        };
    }

    RefreshError::MalformedResponse(format!("Unexpected token endpoint status {status}"))
}

fn parse_token_body(body: &str, now: DateTime<Utc>) -> Result<TokenGrant, RefreshError> {
    let response: TokenResponse = serde_json::from_str(body)
        .map_err(|e| RefreshError::MalformedResponse(format!("Invalid token JSON: {e}")))?;

    let access_token = response
        .access_token
        .filter(|token| !token.is_empty())
        .ok_or_else(|| RefreshError::MalformedResponse("Missing access_token".to_string()))?;

    let expires_in = response
        .expires_in
        .and_then(|e| e.seconds())
        .unwrap_or(DEFAULT_EXPIRES_IN_SECS)
        .max(0);

    Ok(TokenGrant {
        access_token,
        refresh_token: response.refresh_token.filter(|token| !token.is_empty()),
        expires_at: now + Duration::seconds(expires_in),
    })
}
