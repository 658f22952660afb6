// libs/appointment-cell/src/handlers.rs
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

use crate::models::{BookingRequest, SchedulingError};
use crate::services::booking::BookingService;
use crate::services::lifecycle::LifecycleService;
use crate::services::queries::AppointmentQueryService;

/// Request a booking. The seeker on the request must be the caller; nobody
/// books on someone else's behalf.
#[axum::debug_handler]
pub async fn request_booking(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<BookingRequest>,
) -> Result<Json<Value>, AppError> {
    if request.seeker_id != caller_uuid(&user)? {
        return Err(AppError::Forbidden(
            "Appointments can only be booked for yourself".to_string(),
        ));
    }

    let service = BookingService::new(&state);
    let appointment = service
        .request_booking(request, auth.token())
        .await
        .map_err(map_scheduling_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment requested; awaiting provider decision"
    })))
}

#[axum::debug_handler]
pub async fn accept_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let caller = caller_uuid(&user)?;
    let service = LifecycleService::new(&state);
    let appointment = service
        .accept(appointment_id, &caller, auth.token())
        .await
        .map_err(map_scheduling_error)?;

    Ok(Json(json!({ "success": true, "appointment": appointment })))
}

#[axum::debug_handler]
pub async fn reject_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let caller = caller_uuid(&user)?;
    let service = LifecycleService::new(&state);
    let appointment = service
        .reject(appointment_id, &caller, auth.token())
        .await
        .map_err(map_scheduling_error)?;

    Ok(Json(json!({ "success": true, "appointment": appointment })))
}

/// The caller's own upcoming appointments as a seeker.
#[axum::debug_handler]
pub async fn upcoming_appointments(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let caller = caller_uuid(&user)?;
    let service = AppointmentQueryService::new(&state);
    let appointments = service
        .upcoming_for_seeker(caller, auth.token())
        .await
        .map_err(map_scheduling_error)?;

    Ok(Json(json!({ "appointments": appointments })))
}

/// The caller's own approval queue as a provider.
#[axum::debug_handler]
pub async fn pending_queue(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let caller = caller_uuid(&user)?;
    let service = AppointmentQueryService::new(&state);
    let queue = service
        .pending_queue_for_provider(caller, auth.token())
        .await
        .map_err(map_scheduling_error)?;

    Ok(Json(json!({ "queue": queue })))
}

/// The caller's own schedule for today as a provider.
#[axum::debug_handler]
pub async fn today_schedule(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let caller = caller_uuid(&user)?;
    let service = AppointmentQueryService::new(&state);
    let appointments = service
        .today_for_provider(caller, auth.token())
        .await
        .map_err(map_scheduling_error)?;

    Ok(Json(json!({ "appointments": appointments })))
}

/// Fetch a single appointment. Only its two parties may see it; anyone else
/// gets the same not-found as a nonexistent id.
#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let caller = caller_uuid(&user)?;
    let service = AppointmentQueryService::new(&state);
    let appointment = service
        .get_appointment(appointment_id, auth.token())
        .await
        .map_err(map_scheduling_error)?;

    if !appointment.is_party(&caller) {
        return Err(AppError::NotFound("Appointment not found".to_string()));
    }

    Ok(Json(json!({ "appointment": appointment })))
}

fn caller_uuid(user: &User) -> Result<Uuid, AppError> {
    Uuid::parse_str(&user.id)
        .map_err(|_| AppError::Auth("Token subject is not a valid user id".to_string()))
}

fn map_scheduling_error(e: SchedulingError) -> AppError {
    match e {
        SchedulingError::NotFound => AppError::NotFound("Appointment not found".to_string()),
        SchedulingError::SlotNotOffered => {
            AppError::BadRequest("Requested time is not an offered slot".to_string())
        }
        SchedulingError::SlotUnavailable => {
            AppError::Conflict("Slot already has an active appointment".to_string())
        }
        SchedulingError::InvalidDate => {
            AppError::BadRequest("Booking date is in the past".to_string())
        }
        SchedulingError::NotAuthorized => {
            AppError::Forbidden("Not a party to this appointment".to_string())
        }
        SchedulingError::InvalidTransition => {
            AppError::Conflict("Appointment has already been decided".to_string())
        }
        SchedulingError::Validation(msg) => AppError::ValidationError(msg),
        SchedulingError::StoreUnavailable(msg) => AppError::Unavailable(msg),
        SchedulingError::Directory(msg) => AppError::ExternalService(msg),
        SchedulingError::Store(msg) => AppError::Internal(msg),
    }
}
