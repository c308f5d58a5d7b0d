use chrono::{DateTime, Duration, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Stored OAuth token for one (user, provider) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthToken {
    pub user_id: String,
    pub provider: String,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OAuthToken {
    /// A record without an access token counts as "not connected"
    pub fn has_access_token(&self) -> bool {
        self.access_token
            .as_deref()
            .is_some_and(|token| !token.is_empty())
    }

    /// `now >= expires_at`. A record missing `expires_at` is treated as expired.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_none_or(|expires_at| now >= expires_at)
    }

    /// True when the token expires within `leeway` of `now`
    pub fn expires_within(&self, now: DateTime<Utc>, leeway: Duration) -> bool {
        self.is_expired_at(now + leeway)
    }
}

/// Token triple handed out by the provider and persisted by the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
}

/// Client credentials and endpoints for one integration
#[derive(Debug, Clone)]
pub struct ProviderCredentials {
    pub provider: String,
    pub client_id: String,
    pub client_secret: SecretString,
    pub token_url: String,
    pub scope: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionState {
    NotConnected,
    Connected,
    Expired,
    Error,
}

/// Caller-facing view of a user's connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionStatus {
    pub provider: String,
    pub state: ConnectionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ConnectionStatus {
    pub fn not_connected(provider: &str) -> Self {
        Self {
            provider: provider.to_string(),
            state: ConnectionState::NotConnected,
            expires_at: None,
            error: None,
        }
    }

    pub fn error(provider: &str, message: String) -> Self {
        Self {
            provider: provider.to_string(),
            state: ConnectionState::Error,
            expires_at: None,
            error: Some(message),
        }
    }

    /// Derive the status of a stored record at `now`
    pub fn from_token(token: &OAuthToken, now: DateTime<Utc>) -> Self {
        if !token.has_access_token() {
            return Self::not_connected(&token.provider);
        }

        let state = if token.is_expired_at(now) {
            ConnectionState::Expired
        } else {
            ConnectionState::Connected
        };

        Self {
            provider: token.provider.clone(),
            state,
            expires_at: token.expires_at,
            error: None,
        }
    }
}

/// Result of `ensure_fresh_token`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FreshToken {
    pub expires_at: DateTime<Utc>,
    /// Whether a refresh round-trip was performed
    pub refreshed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(access_token: Option<&str>, expires_at: Option<DateTime<Utc>>) -> OAuthToken {
        let now = Utc::now();
        OAuthToken {
            user_id: "user-1".to_string(),
            provider: "microsoft".to_string(),
            access_token: access_token.map(str::to_string),
            refresh_token: Some("r1".to_string()),
            expires_at,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn status_from_token_without_access_token_is_not_connected() {
        let now = Utc::now();
        let status = ConnectionStatus::from_token(&token(None, Some(now)), now);
        assert_eq!(status.state, ConnectionState::NotConnected);
        assert_eq!(status.expires_at, None);

        let status = ConnectionStatus::from_token(&token(Some(""), Some(now)), now);
        assert_eq!(status.state, ConnectionState::NotConnected);
    }

    #[test]
    fn status_from_token_at_exact_expiry_is_expired() {
        let now = Utc::now();
        let status = ConnectionStatus::from_token(&token(Some("a1"), Some(now)), now);
        assert_eq!(status.state, ConnectionState::Expired);
        assert_eq!(status.expires_at, Some(now));
    }

    #[test]
    fn status_from_future_token_is_connected() {
        let now = Utc::now();
        let expires_at = now + Duration::hours(1);
        let status = ConnectionStatus::from_token(&token(Some("a1"), Some(expires_at)), now);
        assert_eq!(status.state, ConnectionState::Connected);
        assert_eq!(status.expires_at, Some(expires_at));
    }

    #[test]
    fn missing_expiry_counts_as_expired() {
        assert!(token(Some("a1"), None).is_expired_at(Utc::now()));
    }

    #[test]
    fn expires_within_leeway() {
        let now = Utc::now();
        let t = token(Some("a1"), Some(now + Duration::minutes(2)));
        assert!(t.expires_within(now, Duration::minutes(5)));
        assert!(!t.expires_within(now, Duration::zero()));
    }

    #[test]
    fn connection_state_serializes_screaming_case() {
        let json = serde_json::to_string(&ConnectionState::NotConnected).unwrap();
        assert_eq!(json, "\"NOT_CONNECTED\"");
    }
}
