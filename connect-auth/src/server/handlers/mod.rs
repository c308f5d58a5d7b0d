mod connect;
mod disconnect;
mod refresh;
mod status;
mod test_access;

pub use connect::connect;
pub use disconnect::disconnect;
pub use refresh::refresh_token;
pub use status::get_status;
pub use test_access::test_access;

use crate::server::models::HealthResponse;
use axum::Json;

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
