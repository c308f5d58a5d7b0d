mod models;

pub use models::{
    ConnectionState, ConnectionStatus, FreshToken, OAuthToken, ProviderCredentials, TokenGrant,
};
