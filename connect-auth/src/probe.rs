use async_trait::async_trait;
use reqwest::{redirect::Policy, Client, StatusCode};

/// Graph-style "who am I" endpoint, cheap and available to any valid token
pub const DEFAULT_PROBE_URL: &str = "https://graph.microsoft.com/v1.0/me";

/// Liveness check for an access token. Never touches stored state.
#[async_trait]
pub trait ConnectionProbe: Send + Sync {
    /// True only when the provider answers 200
    async fn probe(&self, access_token: &str) -> bool;
}

pub struct HttpConnectionProbe {
    http: Client,
    probe_url: String,
}

impl HttpConnectionProbe {
    pub fn new(probe_url: String, timeout: std::time::Duration) -> Result<Self, reqwest::Error> {
        // Only the provider's own 200 counts, never a redirect target
        let http = Client::builder()
            .timeout(timeout)
            .redirect(Policy::none())
            .build()?;
        Ok(Self { http, probe_url })
    }
}

#[async_trait]
impl ConnectionProbe for HttpConnectionProbe {
    async fn probe(&self, access_token: &str) -> bool {
        match self
            .http
            .get(&self.probe_url)
            .bearer_auth(access_token)
            .send()
            .await
        {
            Ok(response) if response.status() == StatusCode::OK => true,
            Ok(response) => {
                tracing::debug!(status = %response.status(), "Probe rejected");
                false
            }
            Err(e) => {
                tracing::debug!(error = %e, "Probe request failed");
                false
            }
        }
    }
}
