use std::sync::Arc;

use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

pub fn build(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/stations", get(handlers::stations::list_stations))
        .route("/stations/filter", get(handlers::stations::filter_stations))
        .route("/stations/create", post(handlers::stations::create_station))
        .route("/stations/set-booking", put(handlers::bookings::set_booking))
        .route(
            "/stations/booking/:username",
            get(handlers::bookings::get_booking),
        )
        .route(
            "/stations/bookings/:username",
            get(handlers::bookings::get_bookings),
        )
        .route(
            "/stations/connector/:connector_id",
            get(handlers::stations::get_station_by_connector),
        )
        .route(
            "/stations/username/:username",
            get(handlers::stations::get_station_by_username),
        )
        .route(
            "/stations/:id",
            get(handlers::stations::get_station)
                .put(handlers::stations::edit_station)
                .delete(handlers::stations::remove_station),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
