// libs/appointment-cell/src/services/booking.rs
use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use availability_cell::models::AvailabilityWindow;
use availability_cell::services::slots::generate_slots;
use shared_config::AppConfig;
use shared_database::directory::{DirectoryClient, DirectoryError, UserRole};
use shared_database::store::{RecordStoreClient, StoreError};

use crate::models::{room_id_for_appointment, Appointment, BookingRequest, SchedulingError};

pub struct BookingService {
    store: RecordStoreClient,
    directory: DirectoryClient,
}

impl BookingService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            store: RecordStoreClient::new(config),
            directory: DirectoryClient::new(config),
        }
    }

    /// Book a slot with a provider. The requested time must be one of the
    /// slots the provider's published windows actually generate, and the slot
    /// must not already be held by a pending or approved appointment.
    ///
    /// The pre-check against existing appointments is advisory. The store's
    /// uniqueness constraint on (provider, date, time, active status) is the
    /// authoritative arbiter: when two requests race, exactly one insert
    /// succeeds and the loser sees a conflict.
    pub async fn request_booking(
        &self,
        request: BookingRequest,
        auth_token: &str,
    ) -> Result<Appointment, SchedulingError> {
        debug!(
            "Booking request: seeker {} -> provider {} at {} {}",
            request.seeker_id, request.provider_id, request.date, request.time
        );

        validate_booking(&request)?;

        let today = Utc::now().date_naive();
        if request.date < today {
            return Err(SchedulingError::InvalidDate);
        }

        self.verify_provider(&request.provider_id, auth_token).await?;
        self.verify_slot_offered(&request, auth_token).await?;

        if self.slot_is_held(&request, auth_token).await? {
            return Err(SchedulingError::SlotUnavailable);
        }

        let id = Uuid::new_v4();
        let now = Utc::now();
        let appointment_data = json!({
            "id": id,
            "provider_id": request.provider_id,
            "seeker_id": request.seeker_id,
            "date": request.date,
            "time": request.time.format("%H:%M:%S").to_string(),
            "reason": request.reason,
            "status": "pending",
            "room_id": room_id_for_appointment(&id),
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339(),
        });

        let result = self
            .store
            .insert_returning("/rest/v1/appointments", Some(auth_token), appointment_data)
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => {
                    warn!(
                        "Lost booking race for provider {} at {} {}",
                        request.provider_id, request.date, request.time
                    );
                    SchedulingError::SlotUnavailable
                }
                StoreError::Unavailable(msg) => SchedulingError::StoreUnavailable(msg),
                other => SchedulingError::Store(other.to_string()),
            })?;

        let row = result.into_iter().next().ok_or_else(|| {
            SchedulingError::Store("store returned no row for created appointment".to_string())
        })?;

        let appointment: Appointment = serde_json::from_value(row)
            .map_err(|e| SchedulingError::Store(format!("failed to parse appointment: {}", e)))?;

        info!(
            "Appointment {} created (pending) for provider {} on {} at {}",
            appointment.id, appointment.provider_id, appointment.date, appointment.time
        );
        Ok(appointment)
    }

    // Private helpers

    async fn verify_provider(
        &self,
        provider_id: &Uuid,
        auth_token: &str,
    ) -> Result<(), SchedulingError> {
        let role = self
            .directory
            .get_user_role(&provider_id.to_string(), auth_token)
            .await
            .map_err(|e| match e {
                DirectoryError::NotFound => SchedulingError::NotFound,
                DirectoryError::Unavailable(msg) => SchedulingError::StoreUnavailable(msg),
                other => SchedulingError::Directory(other.to_string()),
            })?;

        if role != UserRole::Doctor {
            return Err(SchedulingError::Validation(
                "provider is not a registered doctor".to_string(),
            ));
        }
        Ok(())
    }

    /// The requested time must appear in a published window's generated slot
    /// sequence. Arbitrary times inside a window are not bookable.
    async fn verify_slot_offered(
        &self,
        request: &BookingRequest,
        auth_token: &str,
    ) -> Result<(), SchedulingError> {
        let path = format!(
            "/rest/v1/availability_windows?provider_id=eq.{}&date=eq.{}&order=start_time.asc",
            request.provider_id, request.date
        );
        let result: Vec<Value> = self
            .store
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(map_store_error)?;

        let windows: Vec<AvailabilityWindow> = result
            .into_iter()
            .map(|w| {
                serde_json::from_value(w)
                    .map_err(|e| SchedulingError::Store(format!("failed to parse window: {}", e)))
            })
            .collect::<Result<_, _>>()?;

        let offered = windows
            .iter()
            .flat_map(generate_slots)
            .any(|slot| slot == request.time);

        if !offered {
            return Err(SchedulingError::SlotNotOffered);
        }
        Ok(())
    }

    async fn slot_is_held(
        &self,
        request: &BookingRequest,
        auth_token: &str,
    ) -> Result<bool, SchedulingError> {
        let time = request.time.format("%H:%M:%S").to_string();
        let path = format!(
            "/rest/v1/appointments?provider_id=eq.{}&date=eq.{}&time=eq.{}&status=in.(pending,approved)&select=id",
            request.provider_id,
            request.date,
            urlencoding::encode(&time)
        );
        let result: Vec<Value> = self
            .store
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(map_store_error)?;

        Ok(!result.is_empty())
    }
}

fn validate_booking(request: &BookingRequest) -> Result<(), SchedulingError> {
    if request.reason.trim().is_empty() {
        return Err(SchedulingError::Validation(
            "reason must not be empty".to_string(),
        ));
    }
    if request.reason.len() > 500 {
        return Err(SchedulingError::Validation(
            "reason must be 500 characters or fewer".to_string(),
        ));
    }
    if request.provider_id == request.seeker_id {
        return Err(SchedulingError::Validation(
            "provider and seeker must be different users".to_string(),
        ));
    }
    Ok(())
}

fn map_store_error(e: StoreError) -> SchedulingError {
    match e {
        StoreError::Unavailable(msg) => SchedulingError::StoreUnavailable(msg),
        other => SchedulingError::Store(other.to_string()),
    }
}
