use axum::{extract::State, Json};
use tracing::Instrument;

use crate::common::ConnectionState;
use crate::error::ConnectError;
use crate::server::{
    models::{ConnectResponse, ErrorBody},
    AppState, AuthenticatedUser,
};

pub async fn connect(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Json<ConnectResponse> {
    let service = &state.status_service;
    let span = tracing::info_span!(
        "connect",
        user_id = %user.user_id,
        provider = %service.provider()
    );

    let response = async {
        match service.connect_with_client_credentials(&user.user_id).await {
            Ok(status) => ConnectResponse {
                provider: status.provider,
                success: status.state == ConnectionState::Connected,
                state: status.state,
                expires_at: status.expires_at,
                error: None,
            },
            Err(e) => {
                tracing::warn!(error = %e, "Client-credentials connect failed");

                // Report what is stored now; a failed grant leaves any earlier token in place
                let (state, expires_at) = match &e {
                    ConnectError::Storage(_) => (ConnectionState::Error, None),
                    _ => {
                        let current = service.get_status(&user.user_id).await;
                        (current.state, current.expires_at)
                    }
                };

                ConnectResponse {
                    provider: service.provider().to_string(),
                    success: false,
                    state,
                    expires_at,
                    error: Some(ErrorBody::from(&e)),
                }
            }
        }
    }
    .instrument(span)
    .await;

    Json(response)
}
