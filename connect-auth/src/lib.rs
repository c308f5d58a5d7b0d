// Token lifecycle core
pub mod common;
pub mod error;
pub mod probe;
pub mod refresher;
pub mod status;
pub mod store;

pub use common::{
    ConnectionState, ConnectionStatus, FreshToken, OAuthToken, ProviderCredentials, TokenGrant,
};
pub use error::{ConnectError, RefreshError, StorageError};
pub use probe::{ConnectionProbe, HttpConnectionProbe};
pub use refresher::{HttpTokenRefresher, TokenRefresher};
pub use status::ConnectionStatusService;
pub use store::{MemoryTokenStore, SqliteTokenStore, TokenStore};

// HTTP glue (public for binary)
#[cfg(feature = "server")]
pub mod server;
