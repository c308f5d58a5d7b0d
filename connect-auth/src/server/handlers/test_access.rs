use axum::{extract::State, Json};
use tracing::Instrument;

use crate::server::{models::TestAccessResponse, AppState, AuthenticatedUser};

pub async fn test_access(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Json<TestAccessResponse> {
    let service = &state.status_service;
    let span = tracing::info_span!(
        "test_access",
        user_id = %user.user_id,
        provider = %service.provider()
    );

    let success = async {
        let success = service.test_access(&user.user_id).await;
        tracing::info!(success, "Access test finished");
        success
    }
    .instrument(span)
    .await;

    Json(TestAccessResponse {
        provider: service.provider().to_string(),
        success,
    })
}
