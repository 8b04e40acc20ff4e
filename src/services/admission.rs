use chrono::NaiveDateTime;
use rusqlite::{Connection, TransactionBehavior};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::booking::parse_booking_time;
use crate::models::{Booking, SetBookingRequest};

/// Decides whether a booking request may become the connector's active
/// booking and, if so, stores it.
///
/// Rules run in a fixed order and the first failure wins:
/// 1. `booking_end_time` parses and lies strictly after `now`;
/// 2. the user holds no booking that is still active at `now`;
/// 3. the connector exists and carries no active booking.
///
/// The checks and the write share one IMMEDIATE transaction, and the write
/// itself is conditional on the connector still being free.
pub fn admit_booking(
    conn: &mut Connection,
    request: &SetBookingRequest,
    now: NaiveDateTime,
) -> Result<Booking, AppError> {
    require("connector_id", &request.connector_id)?;
    require("username", &request.username)?;
    require("booking_end_time", &request.booking_end_time)?;

    let booking_end_time = parse_booking_time(&request.booking_end_time)?;
    if booking_end_time <= now {
        return Err(AppError::validation("booking_end_time must be in the future"));
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    check_user_is_free(&tx, &request.username, now)?;
    check_connector_is_free(&tx, &request.connector_id, now)?;

    let booking = Booking {
        username: request.username.clone(),
        booking_end_time,
    };
    queries::update_connector_booking(&tx, &request.connector_id, &booking, now)?;
    tx.commit()?;

    Ok(booking)
}

fn require(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} is required")));
    }
    Ok(())
}

fn check_user_is_free(conn: &Connection, username: &str, now: NaiveDateTime) -> Result<(), AppError> {
    let bookings = queries::find_bookings_by_username(conn, username)?;
    if let Some(active) = bookings.iter().find(|b| b.is_active(now)) {
        return Err(AppError::conflict(format!(
            "user already has an active booking until {}",
            active.end_time_str()
        )));
    }
    Ok(())
}

fn check_connector_is_free(
    conn: &Connection,
    connector_id: &str,
    now: NaiveDateTime,
) -> Result<(), AppError> {
    let station = queries::find_station_by_connector_id(conn, connector_id)?
        .ok_or_else(|| AppError::not_found("connector not found"))?;
    let connector = station
        .connector(connector_id)
        .ok_or_else(|| AppError::not_found("connector not found"))?;

    if let Some(existing) = connector.booking.as_ref().filter(|b| b.is_active(now)) {
        return Err(AppError::conflict(format!(
            "connector is already booked until {}",
            existing.end_time_str()
        )));
    }
    Ok(())
}
