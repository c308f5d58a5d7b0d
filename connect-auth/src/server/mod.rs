pub mod config;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod models;

pub use config::Configuration;
pub use error::ServerError;
pub use identity::AuthenticatedUser;

use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::status::ConnectionStatusService;

#[derive(Clone)]
pub struct AppState {
    pub status_service: Arc<ConnectionStatusService>,
}

pub fn router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/integration/status", get(handlers::get_status))
        .route("/integration/test", post(handlers::test_access))
        .route("/integration/refresh", post(handlers::refresh_token))
        .route("/integration/connect", post(handlers::connect))
        .route("/integration", delete(handlers::disconnect))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
