use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::common::ConnectionState;
use crate::error::{ConnectError, RefreshError};

// POST /integration/test
#[derive(Debug, Serialize)]
pub struct TestAccessResponse {
    pub provider: String,
    pub success: bool,
}

// POST /integration/refresh
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub provider: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refreshed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

/// Embedded error for 200 responses carrying a core failure
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
    pub retryable: bool,
    pub requires_reauthorization: bool,
}

impl From<&ConnectError> for ErrorBody {
    fn from(err: &ConnectError) -> Self {
        let code = match err {
            ConnectError::NotConnected => "not_connected",
            ConnectError::NotRefreshable => "not_refreshable",
            ConnectError::Refresh(RefreshError::AuthRejected { .. }) => "auth_rejected",
            ConnectError::Refresh(RefreshError::Transient(_)) => "transient",
            ConnectError::Refresh(RefreshError::MalformedResponse(_)) => "malformed_response",
            ConnectError::Storage(_) => "storage_failure",
        };

        Self {
            code,
            message: err.to_string(),
            retryable: err.is_retryable(),
            requires_reauthorization: err.requires_reauthorization(),
        }
    }
}

// POST /integration/connect
#[derive(Debug, Serialize)]
pub struct ConnectResponse {
    pub provider: String,
    pub success: bool,
    pub state: ConnectionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

// DELETE /integration
#[derive(Debug, Serialize)]
pub struct DisconnectResponse {
    pub provider: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

// Health check
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
