// libs/availability-cell/src/services/slots.rs
use chrono::{NaiveTime, Timelike};

use crate::models::AvailabilityWindow;

/// Derive the ordered sequence of bookable slot start-times for a window.
///
/// Pure function of its input: recomputing from the same window always
/// yields the same sequence, so slots are never persisted. Starting at
/// `start_time`, a slot is emitted every `slot_duration_minutes` as long as
/// the slot's end does not pass `end_time`. A slot whose interval overlaps
/// the break interval is skipped, not shifted.
pub fn generate_slots(window: &AvailabilityWindow) -> Vec<NaiveTime> {
    let duration = window.slot_duration_minutes.minutes();
    let start = minutes_of_day(window.start_time);
    let end = minutes_of_day(window.end_time);

    let break_interval = match (window.break_start, window.break_end) {
        (Some(break_start), Some(break_end)) => {
            Some((minutes_of_day(break_start), minutes_of_day(break_end)))
        }
        _ => None,
    };

    let mut slots = Vec::new();
    let mut cursor = start;

    while cursor + duration <= end {
        let overlaps_break = break_interval
            .map(|(break_start, break_end)| cursor < break_end && cursor + duration > break_start)
            .unwrap_or(false);

        if !overlaps_break {
            slots.push(time_from_minutes(cursor));
        }

        cursor += duration;
    }

    slots
}

fn minutes_of_day(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

fn time_from_minutes(minutes: u32) -> NaiveTime {
    // cursor < end_time < 24h, so this cannot fail
    NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0).unwrap()
}
