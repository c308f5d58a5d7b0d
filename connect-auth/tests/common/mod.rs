#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, SubsecRound, Utc};
use connect_auth::{
    ConnectionProbe, ConnectionStatusService, MemoryTokenStore, ProviderCredentials,
    RefreshError, TokenGrant, TokenRefresher, TokenStore,
};
use secrecy::SecretString;

pub const PROVIDER: &str = "microsoft";

pub fn credentials(token_url: &str) -> ProviderCredentials {
    ProviderCredentials {
        provider: PROVIDER.to_string(),
        client_id: "client-123".to_string(),
        client_secret: SecretString::from("secret-456".to_string()),
        token_url: token_url.to_string(),
        scope: None,
    }
}

/// Whole-second timestamp offset from now, so stores round-trip it exactly
pub fn at(offset: Duration) -> DateTime<Utc> {
    (Utc::now() + offset).trunc_subsecs(0)
}

pub fn grant(access: &str, refresh: Option<&str>, expires_at: DateTime<Utc>) -> TokenGrant {
    TokenGrant {
        access_token: access.to_string(),
        refresh_token: refresh.map(str::to_string),
        expires_at,
    }
}

/// Refresher returning a scripted result and recording what it was asked
pub struct FakeRefresher {
    result: Mutex<Result<TokenGrant, RefreshError>>,
    calls: AtomicUsize,
    seen_refresh_tokens: Mutex<Vec<String>>,
    delay: Option<std::time::Duration>,
}

impl FakeRefresher {
    pub fn succeeding(grant: TokenGrant) -> Self {
        Self::with_result(Ok(grant))
    }

    pub fn failing(error: RefreshError) -> Self {
        Self::with_result(Err(error))
    }

    fn with_result(result: Result<TokenGrant, RefreshError>) -> Self {
        Self {
            result: Mutex::new(result),
            calls: AtomicUsize::new(0),
            seen_refresh_tokens: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    /// Hold every call for `delay` before answering
    pub fn with_delay(mut self, delay: std::time::Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen_refresh_tokens(&self) -> Vec<String> {
        self.seen_refresh_tokens.lock().unwrap().clone()
    }
}

#[async_trait]
impl TokenRefresher for FakeRefresher {
    async fn refresh(
        &self,
        refresh_token: &str,
        _credentials: &ProviderCredentials,
    ) -> Result<TokenGrant, RefreshError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen_refresh_tokens
            .lock()
            .unwrap()
            .push(refresh_token.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.result.lock().unwrap().clone()
    }

    async fn acquire(
        &self,
        _credentials: &ProviderCredentials,
    ) -> Result<TokenGrant, RefreshError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.lock().unwrap().clone()
    }
}

/// Probe answering a fixed value and counting calls
pub struct FakeProbe {
    reachable: bool,
    calls: AtomicUsize,
}

impl FakeProbe {
    pub fn new(reachable: bool) -> Self {
        Self {
            reachable,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConnectionProbe for FakeProbe {
    async fn probe(&self, _access_token: &str) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reachable
    }
}

pub struct Harness {
    pub store: Arc<MemoryTokenStore>,
    pub refresher: Arc<FakeRefresher>,
    pub probe: Arc<FakeProbe>,
    pub service: ConnectionStatusService,
}

impl Harness {
    pub fn new(refresher: FakeRefresher, probe: FakeProbe) -> Self {
        Self::with_store(Arc::new(MemoryTokenStore::new()), refresher, probe)
    }

    pub fn with_store(
        store: Arc<MemoryTokenStore>,
        refresher: FakeRefresher,
        probe: FakeProbe,
    ) -> Self {
        let refresher = Arc::new(refresher);
        let probe = Arc::new(probe);
        let service = ConnectionStatusService::new(
            credentials("http://token.invalid/token"),
            store.clone(),
            refresher.clone(),
            probe.clone(),
        );

        Self {
            store,
            refresher,
            probe,
            service,
        }
    }

    pub async fn seed(&self, user_id: &str, grant: &TokenGrant) {
        self.store.upsert(user_id, PROVIDER, grant).await.unwrap();
    }
}

/// Serve `router` on an ephemeral local port and return its base URL
pub async fn spawn_server(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}
