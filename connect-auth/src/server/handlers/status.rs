use axum::{extract::State, Json};
use tracing::Instrument;

use crate::common::ConnectionStatus;
use crate::server::{AppState, AuthenticatedUser};

pub async fn get_status(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Json<ConnectionStatus> {
    let span = tracing::info_span!(
        "get_status",
        user_id = %user.user_id,
        provider = %state.status_service.provider()
    );

    let status = state
        .status_service
        .get_status(&user.user_id)
        .instrument(span)
        .await;

    Json(status)
}
