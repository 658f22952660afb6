// libs/session-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::SessionError;
use crate::services::gate::SessionGate;
use crate::services::provider::SessionProviderClient;

/// Join a session room. The gate decides admission from current appointment
/// state; only after it says yes does the media provider mint credentials.
#[axum::debug_handler]
pub async fn join_session(
    State(state): State<Arc<AppConfig>>,
    Path(room_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let caller = Uuid::parse_str(&user.id)
        .map_err(|_| AppError::Auth("Token subject is not a valid user id".to_string()))?;

    let gate = SessionGate::new(&state);
    let grant = gate
        .authorize_join(&room_id, &caller, auth.token())
        .await
        .map_err(map_session_error)?;

    let provider = SessionProviderClient::new(&state).map_err(map_session_error)?;
    let credentials = provider
        .issue_join_token(&grant.room_id, &caller)
        .await
        .map_err(map_session_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment_id": grant.appointment_id,
        "credentials": credentials,
    })))
}

fn map_session_error(e: SessionError) -> AppError {
    match e {
        SessionError::RoomNotFound => AppError::NotFound("Room not found".to_string()),
        SessionError::NotApproved => {
            AppError::Forbidden("Appointment is not approved for a session".to_string())
        }
        SessionError::NotAuthorized => {
            AppError::Forbidden("Not a participant of this session".to_string())
        }
        SessionError::NotConfigured => {
            AppError::Internal("Session provider is not configured".to_string())
        }
        SessionError::Provider(msg) => AppError::ExternalService(msg),
        SessionError::StoreUnavailable(msg) => AppError::Unavailable(msg),
        SessionError::Store(msg) => AppError::Internal(msg),
    }
}
