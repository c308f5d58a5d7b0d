use axum::{extract::State, Json};
use tracing::Instrument;

use crate::server::{
    models::{ErrorBody, RefreshResponse},
    AppState, AuthenticatedUser,
};

pub async fn refresh_token(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Json<RefreshResponse> {
    let service = &state.status_service;
    let span = tracing::info_span!(
        "refresh_token",
        user_id = %user.user_id,
        provider = %service.provider()
    );

    let response = async {
        tracing::debug!("Token refresh requested");

        match service.ensure_fresh_token(&user.user_id).await {
            Ok(fresh) => RefreshResponse {
                provider: service.provider().to_string(),
                success: true,
                expires_at: Some(fresh.expires_at),
                refreshed: Some(fresh.refreshed),
                error: None,
            },
            Err(e) => {
                tracing::warn!(error = %e, "Token refresh unsuccessful");
                RefreshResponse {
                    provider: service.provider().to_string(),
                    success: false,
                    expires_at: None,
                    refreshed: None,
                    error: Some(ErrorBody::from(&e)),
                }
            }
        }
    }
    .instrument(span)
    .await;

    Json(response)
}
