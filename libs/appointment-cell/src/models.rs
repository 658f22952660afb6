// libs/appointment-cell/src/models.rs
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

/// Room identifiers carry the appointment id but are resolved through an
/// indexed lookup on the stored `room_id` column, never by splitting the
/// string back apart.
pub const ROOM_ID_PREFIX: &str = "room-";

pub fn room_id_for_appointment(appointment_id: &Uuid) -> String {
    format!("{}{}", ROOM_ID_PREFIX, appointment_id)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub seeker_id: Uuid,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub reason: String,
    pub status: AppointmentStatus,
    pub room_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    /// The appointment is the sole source of truth for who may join its room.
    pub fn is_party(&self, caller_id: &Uuid) -> bool {
        self.provider_id == *caller_id || self.seeker_id == *caller_id
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Approved,
    Rejected,
}

impl AppointmentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AppointmentStatus::Approved | AppointmentStatus::Rejected)
    }

    /// Statuses that hold a slot against further booking.
    pub fn holds_slot(&self) -> bool {
        matches!(self, AppointmentStatus::Pending | AppointmentStatus::Approved)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Pending => write!(f, "pending"),
            AppointmentStatus::Approved => write!(f, "approved"),
            AppointmentStatus::Rejected => write!(f, "rejected"),
        }
    }
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRequest {
    pub provider_id: Uuid,
    pub seeker_id: Uuid,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub reason: String,
}

/// Entry in a provider's approval queue, decorated with the seeker's
/// display name from the directory (read-side only).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingQueueEntry {
    pub appointment: Appointment,
    pub seeker_display_name: Option<String>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum SchedulingError {
    #[error("appointment not found")]
    NotFound,

    #[error("requested time is not offered by this provider on this date")]
    SlotNotOffered,

    #[error("slot already has an active appointment")]
    SlotUnavailable,

    #[error("booking date is in the past")]
    InvalidDate,

    #[error("acting identity is not a party to this appointment")]
    NotAuthorized,

    #[error("appointment is already in a terminal state")]
    InvalidTransition,

    #[error("validation error: {0}")]
    Validation(String),

    #[error("record store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("record store error: {0}")]
    Store(String),

    #[error("directory service error: {0}")]
    Directory(String),
}
