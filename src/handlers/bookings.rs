use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;

use super::check_auth;
use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Booking, SetBookingRequest};
use crate::services::admission;
use crate::state::AppState;

// PUT /stations/set-booking
pub async fn set_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<SetBookingRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.api_token)?;
    let Json(req) = payload?;

    let now = Utc::now().naive_utc();
    let result = {
        let mut db = state.conn()?;
        admission::admit_booking(&mut db, &req, now)
    };

    match result {
        Ok(booking) => {
            tracing::info!(
                connector_id = %req.connector_id,
                username = %booking.username,
                until = %booking.end_time_str(),
                "booking admitted"
            );
            Ok(Json(serde_json::json!({
                "message": "Booking successfully added",
                "booking": booking,
            })))
        }
        Err(e) => {
            tracing::warn!(
                connector_id = %req.connector_id,
                username = %req.username,
                reason = %e,
                "booking rejected"
            );
            Err(e)
        }
    }
}

// GET /stations/booking/:username
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(username): Path<String>,
) -> Result<Json<Booking>, AppError> {
    check_auth(&headers, &state.config.api_token)?;

    let bookings = {
        let db = state.conn()?;
        queries::find_bookings_by_username(&db, &username)?
    };

    bookings
        .into_iter()
        .next()
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("no booking found for username {username}")))
}

// GET /stations/bookings/:username
pub async fn get_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(username): Path<String>,
) -> Result<Json<Vec<Booking>>, AppError> {
    check_auth(&headers, &state.config.api_token)?;

    let bookings = {
        let db = state.conn()?;
        queries::find_bookings_by_username(&db, &username)?
    };

    if bookings.is_empty() {
        return Err(AppError::not_found(format!(
            "no bookings found for username {username}"
        )));
    }
    Ok(Json(bookings))
}
