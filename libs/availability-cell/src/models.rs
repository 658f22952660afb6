// libs/availability-cell/src/models.rs
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==============================================================================
// AVAILABILITY MODELS
// ==============================================================================

/// A provider's published block of bookable time on one calendar date.
/// Immutable once created; re-publishing creates a new window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityWindow {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub break_start: Option<NaiveTime>,
    pub break_end: Option<NaiveTime>,
    pub slot_duration_minutes: SlotDuration,
    pub created_at: DateTime<Utc>,
}

/// Permitted consultation lengths. Serialized as plain minutes on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum SlotDuration {
    Min15,
    Min30,
    Min45,
    Min60,
}

impl SlotDuration {
    pub fn minutes(&self) -> u32 {
        match self {
            SlotDuration::Min15 => 15,
            SlotDuration::Min30 => 30,
            SlotDuration::Min45 => 45,
            SlotDuration::Min60 => 60,
        }
    }
}

impl TryFrom<i64> for SlotDuration {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            15 => Ok(SlotDuration::Min15),
            30 => Ok(SlotDuration::Min30),
            45 => Ok(SlotDuration::Min45),
            60 => Ok(SlotDuration::Min60),
            other => Err(format!(
                "slot duration must be one of 15, 30, 45 or 60 minutes, got {}",
                other
            )),
        }
    }
}

impl From<SlotDuration> for i64 {
    fn from(value: SlotDuration) -> Self {
        value.minutes() as i64
    }
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishAvailabilityRequest {
    pub provider_id: Uuid,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub break_start: Option<NaiveTime>,
    pub break_end: Option<NaiveTime>,
    pub slot_duration_minutes: SlotDuration,
}

impl PublishAvailabilityRequest {
    /// Window shape rules, checked before any store round-trip.
    pub fn validate(&self) -> Result<(), AvailabilityError> {
        if self.start_time >= self.end_time {
            return Err(AvailabilityError::Validation(
                "start time must be before end time".to_string(),
            ));
        }

        match (self.break_start, self.break_end) {
            (None, None) => {}
            (Some(break_start), Some(break_end)) => {
                if break_start >= break_end {
                    return Err(AvailabilityError::Validation(
                        "break start must be before break end".to_string(),
                    ));
                }
                if break_start < self.start_time || break_end > self.end_time {
                    return Err(AvailabilityError::Validation(
                        "break must lie inside the availability window".to_string(),
                    ));
                }
            }
            _ => {
                return Err(AvailabilityError::Validation(
                    "break start and break end must be provided together".to_string(),
                ));
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotListQuery {
    pub date: NaiveDate,
}

/// Open slots for one provider on one date: the generated sequence minus
/// times already held by an active appointment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenSlotsResponse {
    pub provider_id: Uuid,
    pub date: NaiveDate,
    pub slots: Vec<NaiveTime>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum AvailabilityError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("provider is not a registered doctor")]
    NotADoctor,

    #[error("record store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("record store error: {0}")]
    Store(String),

    #[error("directory service error: {0}")]
    Directory(String),
}
