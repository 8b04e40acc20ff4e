use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Seconds precision, no timezone. Stored and serialized in this layout so
/// that lexical order matches chronological order.
pub const BOOKING_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub username: String,
    #[serde(with = "booking_time")]
    pub booking_end_time: NaiveDateTime,
}

impl Booking {
    /// A booking is active strictly before its end time and expired from
    /// the end time onwards.
    pub fn is_active(&self, now: NaiveDateTime) -> bool {
        now < self.booking_end_time
    }

    pub fn is_expired(&self, now: NaiveDateTime) -> bool {
        !self.is_active(now)
    }

    pub fn end_time_str(&self) -> String {
        format_booking_time(&self.booking_end_time)
    }
}

pub fn parse_booking_time(raw: &str) -> Result<NaiveDateTime, AppError> {
    parse_exact(raw).ok_or_else(|| AppError::validation("invalid booking_end_time format"))
}

/// chrono accepts unpadded fields and a signed year for this layout, so the
/// parsed value must render back to exactly the input.
fn parse_exact(raw: &str) -> Option<NaiveDateTime> {
    let parsed = NaiveDateTime::parse_from_str(raw, BOOKING_TIME_FORMAT).ok()?;
    (format_booking_time(&parsed) == raw).then_some(parsed)
}

pub fn format_booking_time(dt: &NaiveDateTime) -> String {
    dt.format(BOOKING_TIME_FORMAT).to_string()
}

/// Inbound booking request. Fields default to empty so that a missing field
/// surfaces as a validation error instead of a deserialization rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SetBookingRequest {
    #[serde(default)]
    pub connector_id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub booking_end_time: String,
}

mod booking_time {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::{parse_exact, BOOKING_TIME_FORMAT};

    pub fn serialize<S: Serializer>(dt: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&dt.format(BOOKING_TIME_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        parse_exact(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid booking time: {raw}")))
    }
}
