// libs/session-cell/src/services/gate.rs
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use appointment_cell::models::{Appointment, AppointmentStatus};
use shared_config::AppConfig;
use shared_database::store::{RecordStoreClient, StoreError};

use crate::models::{is_well_formed_room_id, AuthorizedJoin, SessionError};

/// Authorization gate in front of session rooms. Every join attempt is
/// evaluated fresh against current appointment state; an earlier grant
/// carries no weight once the appointment changes.
pub struct SessionGate {
    store: RecordStoreClient,
}

impl SessionGate {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            store: RecordStoreClient::new(config),
        }
    }

    /// Admit a caller to a room, or say why not. Fails closed: a malformed
    /// room id, an unmapped room and a store row that will not parse all
    /// come out as the same denial.
    pub async fn authorize_join(
        &self,
        room_id: &str,
        caller_id: &Uuid,
        auth_token: &str,
    ) -> Result<AuthorizedJoin, SessionError> {
        if !is_well_formed_room_id(room_id) {
            warn!("Join attempt with malformed room id {:?}", room_id);
            return Err(SessionError::RoomNotFound);
        }

        let appointment = self.resolve_room(room_id, auth_token).await?;

        if appointment.status != AppointmentStatus::Approved {
            warn!(
                "User {} denied for room {}: appointment {} is {}",
                caller_id, room_id, appointment.id, appointment.status
            );
            return Err(SessionError::NotApproved);
        }

        if !appointment.is_party(caller_id) {
            warn!(
                "User {} denied for room {}: not a party to appointment {}",
                caller_id, room_id, appointment.id
            );
            return Err(SessionError::NotAuthorized);
        }

        info!(
            "User {} authorized for room {} (appointment {})",
            caller_id, room_id, appointment.id
        );
        Ok(AuthorizedJoin {
            room_id: room_id.to_string(),
            appointment_id: appointment.id,
            provider_id: appointment.provider_id,
            seeker_id: appointment.seeker_id,
        })
    }

    /// Resolve a room to its appointment through the stored mapping column,
    /// never by dissecting the room id itself.
    async fn resolve_room(
        &self,
        room_id: &str,
        auth_token: &str,
    ) -> Result<Appointment, SessionError> {
        let path = format!("/rest/v1/appointments?room_id=eq.{}", room_id);
        debug!("Resolving room {} to its appointment", room_id);

        let result: Vec<Value> = self
            .store
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| match e {
                StoreError::Unavailable(msg) => SessionError::StoreUnavailable(msg),
                other => SessionError::Store(other.to_string()),
            })?;

        let row = result.into_iter().next().ok_or(SessionError::RoomNotFound)?;
        serde_json::from_value(row).map_err(|_| {
            warn!("Room {} maps to an unparseable appointment row", room_id);
            SessionError::RoomNotFound
        })
    }
}
