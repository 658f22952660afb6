// libs/availability-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{AvailabilityError, PublishAvailabilityRequest, SlotListQuery};
use crate::services::availability::AvailabilityService;

/// Publish a new availability window. Only the provider named in the window
/// may publish it; the caller identity comes from the verified token, never
/// from the payload.
#[axum::debug_handler]
pub async fn publish_availability(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<PublishAvailabilityRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();

    if request.provider_id.to_string() != user.id {
        return Err(AppError::Forbidden(
            "Only the provider may publish their own availability".to_string(),
        ));
    }

    let service = AvailabilityService::new(&state);
    let window = service
        .publish_availability(request, token)
        .await
        .map_err(map_availability_error)?;

    Ok(Json(json!({
        "success": true,
        "window": window,
        "message": "Availability published successfully"
    })))
}

#[axum::debug_handler]
pub async fn list_windows(
    State(state): State<Arc<AppConfig>>,
    Path(provider_id): Path<Uuid>,
    Query(query): Query<SlotListQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(_user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let service = AvailabilityService::new(&state);
    let windows = service
        .list_windows(provider_id, query.date, auth.token())
        .await
        .map_err(map_availability_error)?;

    Ok(Json(json!({ "windows": windows })))
}

/// Open slots for a provider on a date. Any authenticated caller may look.
#[axum::debug_handler]
pub async fn list_open_slots(
    State(state): State<Arc<AppConfig>>,
    Path(provider_id): Path<Uuid>,
    Query(query): Query<SlotListQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(_user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let service = AvailabilityService::new(&state);
    let slots = service
        .list_open_slots(provider_id, query.date, auth.token())
        .await
        .map_err(map_availability_error)?;

    Ok(Json(json!({
        "provider_id": provider_id,
        "date": query.date,
        "slots": slots,
    })))
}

fn map_availability_error(e: AvailabilityError) -> AppError {
    match e {
        AvailabilityError::Validation(msg) => AppError::ValidationError(msg),
        AvailabilityError::NotADoctor => {
            AppError::BadRequest("Provider is not a registered doctor".to_string())
        }
        AvailabilityError::StoreUnavailable(msg) => AppError::Unavailable(msg),
        AvailabilityError::Directory(msg) => AppError::ExternalService(msg),
        AvailabilityError::Store(msg) => AppError::Internal(msg),
    }
}
