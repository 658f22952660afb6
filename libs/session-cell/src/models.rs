// libs/session-cell/src/models.rs
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use appointment_cell::models::ROOM_ID_PREFIX;

/// A room identifier is well formed when it is the room prefix followed by a
/// UUID. Anything else is denied before any lookup happens; the id is never
/// parsed apart to locate the appointment.
pub fn is_well_formed_room_id(room_id: &str) -> bool {
    match room_id.strip_prefix(ROOM_ID_PREFIX) {
        Some(suffix) => Uuid::parse_str(suffix).is_ok(),
        None => false,
    }
}

/// The outcome of a successful gate check: the appointment this room belongs
/// to and its two parties. Everything downstream (media credentials, audit
/// logs) hangs off this.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizedJoin {
    pub room_id: String,
    pub appointment_id: Uuid,
    pub provider_id: Uuid,
    pub seeker_id: Uuid,
}

/// Credentials minted by the external media provider for one participant in
/// one room. Short-lived; a fresh set is issued on every join.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinCredentials {
    pub room_id: String,
    pub token: String,
    pub expires_in_secs: Option<u64>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum SessionError {
    /// Unknown or malformed room. Deliberately indistinguishable from a
    /// room that exists but was never mapped.
    #[error("room not found")]
    RoomNotFound,

    /// The appointment exists but has not been approved.
    #[error("appointment is not approved for a session")]
    NotApproved,

    /// The caller is not a party to the room's appointment.
    #[error("caller is not a participant of this session")]
    NotAuthorized,

    #[error("session provider is not configured")]
    NotConfigured,

    #[error("session provider error: {0}")]
    Provider(String),

    #[error("record store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("record store error: {0}")]
    Store(String),
}
