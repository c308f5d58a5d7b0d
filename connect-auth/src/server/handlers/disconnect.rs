use axum::{extract::State, Json};
use tracing::Instrument;

use crate::server::{
    models::{DisconnectResponse, ErrorBody},
    AppState, AuthenticatedUser,
};

pub async fn disconnect(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Json<DisconnectResponse> {
    let service = &state.status_service;
    let span = tracing::info_span!(
        "disconnect",
        user_id = %user.user_id,
        provider = %service.provider()
    );

    let result = service.disconnect(&user.user_id).instrument(span).await;

    Json(DisconnectResponse {
        provider: service.provider().to_string(),
        success: result.is_ok(),
        error: result.as_ref().err().map(ErrorBody::from),
    })
}
