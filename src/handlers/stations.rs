use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;

use super::check_auth;
use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Station, StationFilterRequest, StationRequest};
use crate::services::filter;
use crate::state::AppState;

// GET /stations
pub async fn list_stations(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Station>>, AppError> {
    check_auth(&headers, &state.config.api_token)?;

    let stations = {
        let db = state.conn()?;
        queries::find_all_stations(&db)?
    };
    Ok(Json(stations))
}

// GET /stations/filter
pub async fn filter_stations(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    query: Result<Query<StationFilterRequest>, QueryRejection>,
) -> Result<Json<Vec<Station>>, AppError> {
    check_auth(&headers, &state.config.api_token)?;
    let Query(query) = query?;

    let now = Utc::now().naive_utc();
    let stations = {
        let db = state.conn()?;
        filter::filter_stations(&db, &query, now)?
    };
    Ok(Json(stations))
}

// GET /stations/:id
pub async fn get_station(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Station>, AppError> {
    check_auth(&headers, &state.config.api_token)?;

    let db = state.conn()?;
    queries::find_station_by_id(&db, &id)?
        .map(Json)
        .ok_or_else(|| AppError::not_found("station not found"))
}

// GET /stations/connector/:connector_id
pub async fn get_station_by_connector(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(connector_id): Path<String>,
) -> Result<Json<Station>, AppError> {
    check_auth(&headers, &state.config.api_token)?;

    let db = state.conn()?;
    queries::find_station_by_connector_id(&db, &connector_id)?
        .map(Json)
        .ok_or_else(|| AppError::not_found("station not found"))
}

// GET /stations/username/:username
pub async fn get_station_by_username(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(username): Path<String>,
) -> Result<Json<Station>, AppError> {
    check_auth(&headers, &state.config.api_token)?;

    let db = state.conn()?;
    queries::find_station_by_username(&db, &username)?
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("no station found for username {username}")))
}

// POST /stations/create
pub async fn create_station(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<StationRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.api_token)?;
    let Json(req) = payload?;

    let new_station = req.validate()?;
    let station = {
        let db = state.conn()?;
        queries::create_station(&db, &new_station)?
    };

    tracing::info!(station_id = %station.id, name = %station.name, "station created");
    Ok(Json(serde_json::json!({
        "message": "Station created successfully",
        "station": station,
    })))
}

// PUT /stations/:id
pub async fn edit_station(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    payload: Result<Json<StationRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.api_token)?;
    let Json(req) = payload?;

    let new_station = req.validate()?;
    let station = {
        let db = state.conn()?;
        queries::update_station(&db, &id, &new_station)?
    };

    tracing::info!(station_id = %station.id, "station updated");
    Ok(Json(serde_json::json!({
        "message": "Station updated successfully",
        "station": station,
    })))
}

// DELETE /stations/:id
pub async fn remove_station(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_auth(&headers, &state.config.api_token)?;

    {
        let db = state.conn()?;
        queries::remove_station(&db, &id)?;
    }

    tracing::info!(station_id = %id, "station removed");
    Ok(Json(serde_json::json!({"message": "Station removed successfully"})))
}
