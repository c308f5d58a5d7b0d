use axum::{extract::FromRequestParts, http::request::Parts};

use crate::server::error::ServerError;

/// Header set by the session layer in front of this service
pub const USER_ID_HEADER: &str = "x-user-id";

/// Caller identity supplied by the session collaborator. Trusted as-is.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: String,
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| ServerError::Unauthorized("Not logged in".to_string()))?;

        Ok(Self {
            user_id: user_id.to_string(),
        })
    }
}
