use secrecy::SecretString;
use serde::Deserialize;

use crate::common::ProviderCredentials;
use crate::probe::DEFAULT_PROBE_URL;

#[derive(Debug, Deserialize, Clone)]
pub struct Configuration {
    #[serde(default)]
    pub server: ServerConfiguration,
    pub provider: ProviderConfiguration,
    #[serde(default)]
    pub storage: StorageConfiguration,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfiguration {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfiguration {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfiguration {
    #[serde(default = "default_provider_name")]
    pub name: String,
    pub client_id: String,
    pub client_secret: SecretString,
    pub token_url: String,
    pub scope: Option<String>,

    #[serde(default = "default_probe_url")]
    pub probe_url: String,

    #[serde(default = "default_refresh_timeout")]
    pub refresh_timeout_seconds: u64,

    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_seconds: u64,

    #[serde(default)]
    pub refresh_leeway_seconds: i64,
}

impl ProviderConfiguration {
    pub fn credentials(&self) -> ProviderCredentials {
        ProviderCredentials {
            provider: self.name.clone(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            token_url: self.token_url.clone(),
            scope: self.scope.clone(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Sqlite,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfiguration {
    #[serde(default)]
    pub backend: StorageBackend,

    #[serde(default = "default_database_url")]
    pub database_url: String,
}

impl Default for StorageConfiguration {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            database_url: default_database_url(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_provider_name() -> String {
    "microsoft".to_string()
}

fn default_probe_url() -> String {
    DEFAULT_PROBE_URL.to_string()
}

fn default_refresh_timeout() -> u64 {
    30
}

fn default_probe_timeout() -> u64 {
    5
}

fn default_database_url() -> String {
    "sqlite://connect-auth.db".to_string()
}

impl Configuration {
    pub fn new() -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        if std::path::Path::new("config.toml").exists() {
            builder = builder.add_source(config::File::with_name("config"));
        }

        builder =
            builder.add_source(config::Environment::with_prefix("CONNECT_AUTH").separator("__"));

        builder.build()?.try_deserialize()
    }
}
