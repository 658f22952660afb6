// libs/appointment-cell/src/services/queries.rs
use chrono::Utc;
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::directory::DirectoryClient;
use shared_database::store::{RecordStoreClient, StoreError};

use crate::models::{Appointment, PendingQueueEntry, SchedulingError};

/// Read-side projections over the appointments collection. Each projection
/// is a filtered, ordered query; nothing here mutates state.
pub struct AppointmentQueryService {
    store: RecordStoreClient,
    directory: DirectoryClient,
}

impl AppointmentQueryService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            store: RecordStoreClient::new(config),
            directory: DirectoryClient::new(config),
        }
    }

    pub async fn get_appointment(
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
        parse_appointment(row)
    }

    /// A seeker's appointments from today forward, pending and approved,
    /// soonest first.
    pub async fn upcoming_for_seeker(
        &self,
        seeker_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        let today = Utc::now().date_naive();
        let path = format!(
            "/rest/v1/appointments?seeker_id=eq.{}&date=gte.{}&status=in.(pending,approved)&order=date.asc,time.asc",
            seeker_id, today
        );
        self.list(&path, auth_token).await
    }

    /// A provider's approval queue: pending appointments oldest first, each
    /// decorated with the seeker's display name where the directory knows it.
    /// A directory miss degrades to an undecorated entry; the queue itself
    /// never fails on lookup problems.
    pub async fn pending_queue_for_provider(
        &self,
        provider_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<PendingQueueEntry>, SchedulingError> {
        let path = format!(
            "/rest/v1/appointments?provider_id=eq.{}&status=eq.pending&order=created_at.asc",
            provider_id
        );
        let pending = self.list(&path, auth_token).await?;

        let mut entries = Vec::with_capacity(pending.len());
        for appointment in pending {
            let seeker_display_name = match self
                .directory
                .get_user(&appointment.seeker_id.to_string(), auth_token)
                .await
            {
                Ok(user) => user.display_name,
                Err(e) => {
                    warn!(
                        "Directory lookup failed for seeker {}: {}",
                        appointment.seeker_id, e
                    );
                    None
                }
            };
            entries.push(PendingQueueEntry {
                appointment,
                seeker_display_name,
            });
        }

        debug!(
            "{} pending appointments in queue for provider {}",
            entries.len(),
            provider_id
        );
        Ok(entries)
    }

    /// A provider's schedule for today: pending and approved, earliest first.
    pub async fn today_for_provider(
        &self,
        provider_id: Uuid,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        let today = Utc::now().date_naive();
        let path = format!(
            "/rest/v1/appointments?provider_id=eq.{}&date=eq.{}&status=in.(pending,approved)&order=time.asc",
            provider_id, today
        );
        self.list(&path, auth_token).await
    }

    async fn list(
        &self,
        path: &str,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        let result: Vec<Value> = self
            .store
            .request(Method::GET, path, Some(auth_token), None)
            .await
            .map_err(map_store_error)?;

        result.into_iter().map(parse_appointment).collect()
    }
}

fn parse_appointment(row: Value) -> Result<Appointment, SchedulingError> {
    serde_json::from_value(row)
        .map_err(|e| SchedulingError::Store(format!("failed to parse appointment: {}", e)))
}

fn map_store_error(e: StoreError) -> SchedulingError {
    match e {
        StoreError::Unavailable(msg) => SchedulingError::StoreUnavailable(msg),
        other => SchedulingError::Store(other.to_string()),
    }
}
