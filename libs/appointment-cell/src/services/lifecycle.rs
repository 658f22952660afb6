// libs/appointment-cell/src/services/lifecycle.rs
use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::store::{RecordStoreClient, StoreError};

use crate::models::{Appointment, AppointmentStatus, SchedulingError};

/// The complete transition table. Terminal states allow nothing; there is
/// no cancel, reschedule, or reopen path.
pub fn allowed_transitions(from: AppointmentStatus) -> &'static [AppointmentStatus] {
    match from {
        AppointmentStatus::Pending => {
            &[AppointmentStatus::Approved, AppointmentStatus::Rejected]
        }
        AppointmentStatus::Approved | AppointmentStatus::Rejected => &[],
    }
}

pub fn can_transition(from: AppointmentStatus, to: AppointmentStatus) -> bool {
    allowed_transitions(from).contains(&to)
}

pub struct LifecycleService {
    store: RecordStoreClient,
}

impl LifecycleService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            store: RecordStoreClient::new(config),
        }
    }

    pub async fn accept(
        &self,
        appointment_id: Uuid,
        acting_provider_id: &Uuid,
        auth_token: &str,
    ) -> Result<Appointment, SchedulingError> {
        self.transition(appointment_id, acting_provider_id, AppointmentStatus::Approved, auth_token)
            .await
    }

    pub async fn reject(
        &self,
        appointment_id: Uuid,
        acting_provider_id: &Uuid,
        auth_token: &str,
    ) -> Result<Appointment, SchedulingError> {
        self.transition(appointment_id, acting_provider_id, AppointmentStatus::Rejected, auth_token)
            .await
    }

    /// Drive an appointment to a terminal state. Only the provider on the
    /// appointment may act. The status change is a conditional update filtered
    /// on the current status, so a concurrent or repeated decision matches
    /// zero rows and surfaces as an invalid transition rather than silently
    /// overwriting the earlier outcome.
    async fn transition(
        &self,
        appointment_id: Uuid,
        acting_provider_id: &Uuid,
        target: AppointmentStatus,
        auth_token: &str,
    ) -> Result<Appointment, SchedulingError> {
        let appointment = self.fetch(appointment_id, auth_token).await?;

        if appointment.provider_id != *acting_provider_id {
            warn!(
                "User {} attempted to decide appointment {} belonging to provider {}",
                acting_provider_id, appointment_id, appointment.provider_id
            );
            return Err(SchedulingError::NotAuthorized);
        }

        if !can_transition(appointment.status, target) {
            return Err(SchedulingError::InvalidTransition);
        }

        let path = format!(
            "/rest/v1/appointments?id=eq.{}&status=eq.{}",
            appointment_id, appointment.status
        );
        let changes = json!({
            "status": target.to_string(),
            "updated_at": Utc::now().to_rfc3339(),
        });

        let rows = self
            .store
            .update_where(&path, Some(auth_token), changes)
            .await
            .map_err(map_store_error)?;

        let row = rows.into_iter().next().ok_or_else(|| {
            // Another decision landed between our read and this write.
            warn!(
                "Conditional update matched no rows for appointment {}; already decided",
                appointment_id
            );
            SchedulingError::InvalidTransition
        })?;

        let updated: Appointment = serde_json::from_value(row)
            .map_err(|e| SchedulingError::Store(format!("failed to parse appointment: {}", e)))?;

        info!(
            "Appointment {} transitioned {} -> {} by provider {}",
            appointment_id, appointment.status, updated.status, acting_provider_id
        );
        Ok(updated)
    }

    async fn fetch(
        &self,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<Appointment, SchedulingError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let result: Vec<Value> = self
            .store
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(map_store_error)?;

        let row = result.into_iter().next().ok_or(SchedulingError::NotFound)?;
        serde_json::from_value(row)
            .map_err(|e| SchedulingError::Store(format!("failed to parse appointment: {}", e)))
    }
}

fn map_store_error(e: StoreError) -> SchedulingError {
    match e {
        StoreError::Unavailable(msg) => SchedulingError::StoreUnavailable(msg),
        other => SchedulingError::Store(other.to_string()),
    }
}
