// libs/availability-cell/src/services/availability.rs
use chrono::{NaiveDate, NaiveTime, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::directory::{DirectoryClient, DirectoryError, UserRole};
use shared_database::store::{RecordStoreClient, StoreError};

use crate::models::{AvailabilityError, AvailabilityWindow, PublishAvailabilityRequest};
use crate::services::slots::generate_slots;

pub struct AvailabilityService {
    store: RecordStoreClient,
    directory: DirectoryClient,
}

impl AvailabilityService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            store: RecordStoreClient::new(config),
            directory: DirectoryClient::new(config),
        }
    }

    /// Publish a new availability window for a provider. Windows are
    /// immutable; corrections are made by publishing again.
    pub async fn publish_availability(
        &self,
        request: PublishAvailabilityRequest,
        auth_token: &str,
    ) -> Result<AvailabilityWindow, AvailabilityError> {
        debug!(
            "Publishing availability for provider {} on {}",
            request.provider_id, request.date
        );

        request.validate()?;
        self.verify_provider_is_doctor(&request.provider_id, auth_token).await?;

        let now = Utc::now();
        let window_data = json!({
            "id": Uuid::new_v4(),
            "provider_id": request.provider_id,
            "date": request.date,
            "start_time": request.start_time.format("%H:%M:%S").to_string(),
            "end_time": request.end_time.format("%H:%M:%S").to_string(),
            "break_start": request.break_start.map(|t| t.format("%H:%M:%S").to_string()),
            "break_end": request.break_end.map(|t| t.format("%H:%M:%S").to_string()),
            "slot_duration_minutes": request.slot_duration_minutes,
            "created_at": now.to_rfc3339(),
        });

        let result = self
            .store
            .insert_returning("/rest/v1/availability_windows", Some(auth_token), window_data)
            .await
            .map_err(map_store_error)?;

        let row = result.into_iter().next().ok_or_else(|| {
            AvailabilityError::Store("store returned no row for created window".to_string())
        })?;

        let window: AvailabilityWindow = serde_json::from_value(row)
            .map_err(|e| AvailabilityError::Store(format!("failed to parse window: {}", e)))?;

        info!(
            "Availability window {} published for provider {} on {}",
            window.id, window.provider_id, window.date
        );
        Ok(window)
    }

    /// All windows published by a provider for one date.
    pub async fn list_windows(
        &self,
        provider_id: Uuid,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<AvailabilityWindow>, AvailabilityError> {
        let path = format!(
            "/rest/v1/availability_windows?provider_id=eq.{}&date=eq.{}&order=start_time.asc",
            provider_id, date
        );
        let result: Vec<Value> = self
            .store
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(map_store_error)?;

        result
            .into_iter()
            .map(|w| {
                serde_json::from_value(w)
                    .map_err(|e| AvailabilityError::Store(format!("failed to parse window: {}", e)))
            })
            .collect()
    }

    /// Bookable slots still open for a provider on a date: the union of the
    /// generated sequences of all windows, minus times held by a pending or
    /// approved appointment. Slots are derived on demand, never persisted.
    pub async fn list_open_slots(
        &self,
        provider_id: Uuid,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<NaiveTime>, AvailabilityError> {
        let windows = self.list_windows(provider_id, date, auth_token).await?;

        let mut slots: Vec<NaiveTime> = windows.iter().flat_map(generate_slots).collect();
        slots.sort();
        slots.dedup();

        if slots.is_empty() {
            return Ok(slots);
        }

        let booked = self.booked_times(provider_id, date, auth_token).await?;
        slots.retain(|slot| !booked.contains(slot));

        debug!(
            "{} open slots for provider {} on {}",
            slots.len(),
            provider_id,
            date
        );
        Ok(slots)
    }

    // Private helpers

    async fn verify_provider_is_doctor(
        &self,
        provider_id: &Uuid,
        auth_token: &str,
    ) -> Result<(), AvailabilityError> {
        let role = self
            .directory
            .get_user_role(&provider_id.to_string(), auth_token)
            .await
            .map_err(|e| match e {
                DirectoryError::NotFound => AvailabilityError::NotADoctor,
                DirectoryError::Unavailable(msg) => AvailabilityError::StoreUnavailable(msg),
                other => AvailabilityError::Directory(other.to_string()),
            })?;

        if role != UserRole::Doctor {
            return Err(AvailabilityError::NotADoctor);
        }
        Ok(())
    }

    async fn booked_times(
        &self,
        provider_id: Uuid,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<NaiveTime>, AvailabilityError> {
        let path = format!(
            "/rest/v1/appointments?provider_id=eq.{}&date=eq.{}&status=in.(pending,approved)&select=time",
            provider_id, date
        );
        let result: Vec<Value> = self
            .store
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(map_store_error)?;

        Ok(result
            .iter()
            .filter_map(|row| row["time"].as_str())
            .filter_map(|s| NaiveTime::parse_from_str(s, "%H:%M:%S").ok())
            .collect())
    }
}

fn map_store_error(e: StoreError) -> AvailabilityError {
    match e {
        StoreError::Unavailable(msg) => AvailabilityError::StoreUnavailable(msg),
        other => AvailabilityError::Store(other.to_string()),
    }
}
