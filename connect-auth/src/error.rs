use thiserror::Error;

/// Persistence layer failure. Never used to signal a missing record.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Classified failure of a token endpoint call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RefreshError {
    /// Transport failure, timeout, 408/429 or 5xx
    #[error("Transient token endpoint failure: {0}")]
    Transient(String),

    /// The provider refused the credentials or refresh token
    #[error("Token endpoint rejected request ({status}): {error}{}", suffix(.description))]
    AuthRejected {
        status: u16,
        error: String,
        description: Option<String>,
    },

    /// 200 response without a usable token body
    #[error("Malformed token response: {0}")]
    MalformedResponse(String),
}

fn suffix(description: &Option<String>) -> String {
    description
        .as_deref()
        .map(|d| format!(" - {d}"))
        .unwrap_or_default()
}

impl RefreshError {
    /// Malformed responses are retried like transient failures
    pub fn is_retryable(&self) -> bool {
        !matches!(self, RefreshError::AuthRejected { .. })
    }
}

#[derive(Error, Debug)]
pub enum ConnectError {
    #[error("No connection for this user")]
    NotConnected,

    #[error("Token expired and no refresh token is stored")]
    NotRefreshable,

    #[error("Token refresh failed: {0}")]
    Refresh(#[from] RefreshError),

    #[error("Storage failure: {0}")]
    Storage(#[from] StorageError),
}

impl ConnectError {
    pub fn is_retryable(&self) -> bool {
        match self {
            ConnectError::Refresh(err) => err.is_retryable(),
            ConnectError::Storage(_) => true,
            ConnectError::NotConnected | ConnectError::NotRefreshable => false,
        }
    }

    /// Whether the user has to authorize the integration again
    pub fn requires_reauthorization(&self) -> bool {
        matches!(
            self,
            ConnectError::NotConnected
                | ConnectError::NotRefreshable
                | ConnectError::Refresh(RefreshError::AuthRejected { .. })
        )
    }
}
