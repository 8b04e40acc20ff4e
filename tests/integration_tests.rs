use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use tower::ServiceExt;

use chargehub::config::AppConfig;
use chargehub::db;
use chargehub::router;
use chargehub::state::AppState;

// ── Helpers ──

fn test_config() -> AppConfig {
    AppConfig {
        port: 3000,
        database_url: ":memory:".to_string(),
        api_token: "test-token".to_string(),
    }
}

fn test_state() -> Arc<AppState> {
    let conn = db::init_db(":memory:").unwrap();
    Arc::new(AppState::new(conn, test_config()))
}

fn test_app(state: Arc<AppState>) -> Router {
    router::build(state)
}

fn authed(method: &str, uri: &str, body: Option<serde_json::Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", "Bearer test-token");
    match body {
        Some(json) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(state: &Arc<AppState>, req: Request<Body>) -> (StatusCode, serde_json::Value) {
    let res = test_app(state.clone()).oneshot(req).await.unwrap();
    let status = res.status();
    let body = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

fn station_body(name: &str, company: &str, is_open: bool) -> serde_json::Value {
    serde_json::json!({
        "name": name,
        "latitude": 13.7563,
        "longitude": 100.5018,
        "company": company,
        "status": {"open_hours": "08:00", "close_hours": "22:00", "is_open": is_open},
        "connectors": [
            {"type": "AC", "plug_name": "TYPE 2", "price_per_unit": 4.5, "power_output": 22},
            {"type": "DC", "plug_name": "CHAdeMO", "price_per_unit": 7.0, "power_output": 50},
            {"type": "DC", "plug_name": "CCS TYPE 2", "price_per_unit": 7.5, "power_output": 120}
        ]
    })
}

async fn create_station(state: &Arc<AppState>, name: &str, company: &str, is_open: bool) -> serde_json::Value {
    let (status, json) = send(
        state,
        authed("POST", "/stations/create", Some(station_body(name, company, is_open))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    json["station"].clone()
}

fn end_time(offset: Duration) -> String {
    (Utc::now().naive_utc() + offset)
        .format("%Y-%m-%dT%H:%M:%S")
        .to_string()
}

fn booking_body(connector_id: &str, username: &str, end: &str) -> serde_json::Value {
    serde_json::json!({
        "connector_id": connector_id,
        "username": username,
        "booking_end_time": end,
    })
}

// ── Auth ──

#[tokio::test]
async fn test_stations_require_auth() {
    let state = test_state();
    let app = test_app(state);

    let res = app
        .oneshot(Request::builder().uri("/stations").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_wrong_token() {
    let state = test_state();
    let app = test_app(state);

    let res = app
        .oneshot(
            Request::builder()
                .uri("/stations")
                .header("Authorization", "Bearer wrong-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_empty_token_disables_auth() {
    let mut config = test_config();
    config.api_token = String::new();
    let state = Arc::new(AppState::new(db::init_db(":memory:").unwrap(), config));

    let res = test_app(state)
        .oneshot(Request::builder().uri("/stations").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_health() {
    let state = test_state();
    let res = test_app(state)
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

// ── Catalog ──

#[tokio::test]
async fn test_create_and_fetch_station() {
    let state = test_state();
    let station = create_station(&state, "Central Plaza", "PTT", true).await;
    let id = station["id"].as_str().unwrap();

    let (status, json) = send(&state, authed("GET", &format!("/stations/{id}"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["name"], "Central Plaza");
    assert_eq!(json["status"]["is_open"], true);
    assert_eq!(json["connectors"].as_array().unwrap().len(), 3);
    assert_eq!(json["connectors"][1]["type"], "DC");
    assert_eq!(json["connectors"][1]["plug_name"], "CHAdeMO");
    assert!(json["connectors"][1].get("booking").is_none());

    let (status, json) = send(&state, authed("GET", "/stations", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_create_rejects_unknown_plug() {
    let state = test_state();
    let mut body = station_body("Bad", "PTT", true);
    body["connectors"][0]["plug_name"] = serde_json::json!("Tesla");

    let (status, json) = send(&state, authed("POST", "/stations/create", Some(body))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "invalid plug name: Tesla");
}

#[tokio::test]
async fn test_unknown_station_not_found() {
    let state = test_state();

    let (status, json) = send(&state, authed("GET", "/stations/does-not-exist", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "station not found");

    let (status, _) = send(&state, authed("DELETE", "/stations/does-not-exist", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &state,
        authed("PUT", "/stations/does-not-exist", Some(station_body("X", "Y", true))),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_edit_and_remove_station() {
    let state = test_state();
    let station = create_station(&state, "Old Name", "PTT", true).await;
    let id = station["id"].as_str().unwrap();

    let (status, json) = send(
        &state,
        authed("PUT", &format!("/stations/{id}"), Some(station_body("New Name", "EA", false))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["station"]["name"], "New Name");
    assert_eq!(json["station"]["id"], id);

    let (status, _) = send(&state, authed("DELETE", &format!("/stations/{id}"), None)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&state, authed("GET", &format!("/stations/{id}"), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_with_malformed_body_is_validation_error() {
    let state = test_state();

    let mut body = station_body("Nameless", "PTT", true);
    body.as_object_mut().unwrap().remove("name");
    let (status, json) = send(&state, authed("POST", "/stations/create", Some(body))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("missing field `name`"));

    let req = Request::builder()
        .method("POST")
        .uri("/stations/create")
        .header("Authorization", "Bearer test-token")
        .header("Content-Type", "application/json")
        .body(Body::from("{\"name\": "))
        .unwrap();
    let (status, json) = send(&state, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn test_edit_keeps_booking_on_unchanged_connector() {
    let state = test_state();
    let station = create_station(&state, "Old Name", "PTT", true).await;
    let id = station["id"].as_str().unwrap();
    let connector_id = station["connectors"][1]["connector_id"].as_str().unwrap();

    let end = end_time(Duration::hours(2));
    let (status, _) = send(
        &state,
        authed("PUT", "/stations/set-booking", Some(booking_body(connector_id, "alice", &end))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = send(
        &state,
        authed("PUT", &format!("/stations/{id}"), Some(station_body("New Name", "PTT", true))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["station"]["connectors"][1]["connector_id"], connector_id);
    assert_eq!(json["station"]["connectors"][1]["booking"]["username"], "alice");

    let (status, json) = send(
        &state,
        authed(
            "PUT",
            "/stations/set-booking",
            Some(booking_body(station["connectors"][0]["connector_id"].as_str().unwrap(), "alice", &end)),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(json["error"]
        .as_str()
        .unwrap()
        .starts_with("user already has an active booking until"));
}

// ── Filter ──

#[tokio::test]
async fn test_filter_invalid_status() {
    let state = test_state();
    let (status, json) = send(&state, authed("GET", "/stations/filter?status=unknown", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "invalid status value: unknown");
}

#[tokio::test]
async fn test_filter_prunes_connectors() {
    let state = test_state();
    create_station(&state, "Central Plaza", "PTT", true).await;
    create_station(&state, "Closed Depot", "EA", false).await;

    let (status, json) = send(
        &state,
        authed("GET", "/stations/filter?status=open&type=DC&plug_name=CHAdeMO", None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let stations = json.as_array().unwrap();
    assert_eq!(stations.len(), 1);
    let connectors = stations[0]["connectors"].as_array().unwrap();
    assert_eq!(connectors.len(), 1);
    assert_eq!(connectors[0]["plug_name"], "CHAdeMO");

    let (_, json) = send(&state, authed("GET", "/stations/filter?search=plaza", None)).await;
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["name"], "Central Plaza");
}

#[tokio::test]
async fn test_filter_search_folds_non_ascii() {
    let state = test_state();
    create_station(&state, "ÖSTERREICH HUB", "PTT", true).await;

    let (status, json) = send(
        &state,
        authed("GET", "/stations/filter?search=%C3%B6sterreich", None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["name"], "ÖSTERREICH HUB");
}

#[tokio::test]
async fn test_filter_malformed_query_is_validation_error() {
    let state = test_state();
    let (status, json) = send(
        &state,
        authed("GET", "/stations/filter?status=open&status=closed", None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("duplicate field"));
}

// ── Bookings ──

#[tokio::test]
async fn test_booking_flow() {
    let state = test_state();
    let station = create_station(&state, "Central Plaza", "PTT", true).await;
    let c1 = station["connectors"][0]["connector_id"].as_str().unwrap().to_string();
    let c2 = station["connectors"][1]["connector_id"].as_str().unwrap().to_string();
    let alice_end = end_time(Duration::hours(1));

    let (status, json) = send(
        &state,
        authed("PUT", "/stations/set-booking", Some(booking_body(&c1, "alice", &alice_end))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Booking successfully added");

    // same connector, different user
    let (status, json) = send(
        &state,
        authed(
            "PUT",
            "/stations/set-booking",
            Some(booking_body(&c1, "bob", &end_time(Duration::hours(2)))),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        json["error"],
        format!("connector is already booked until {alice_end}")
    );

    // same user, free connector
    let (status, json) = send(
        &state,
        authed(
            "PUT",
            "/stations/set-booking",
            Some(booking_body(&c2, "alice", &end_time(Duration::minutes(30)))),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        json["error"],
        format!("user already has an active booking until {alice_end}")
    );

    let (status, json) = send(&state, authed("GET", "/stations/bookings/alice", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["booking_end_time"], alice_end.as_str());

    let (status, json) = send(&state, authed("GET", "/stations/booking/alice", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["username"], "alice");

    let (status, json) = send(&state, authed("GET", &format!("/stations/connector/{c1}"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["id"], station["id"]);
    assert_eq!(json["connectors"][0]["booking"]["username"], "alice");

    let (status, json) = send(&state, authed("GET", "/stations/username/alice", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["connectors"].as_array().unwrap().len(), 1);
    assert_eq!(json["connectors"][0]["connector_id"], c1.as_str());
}

#[tokio::test]
async fn test_booking_in_past_rejected() {
    let state = test_state();
    let station = create_station(&state, "Central Plaza", "PTT", true).await;
    let c1 = station["connectors"][0]["connector_id"].as_str().unwrap();

    let (status, json) = send(
        &state,
        authed(
            "PUT",
            "/stations/set-booking",
            Some(booking_body(c1, "alice", "2020-01-01T10:00:00")),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "booking_end_time must be in the future");
}

#[tokio::test]
async fn test_booking_bad_format_and_missing_fields() {
    let state = test_state();

    let (status, json) = send(
        &state,
        authed(
            "PUT",
            "/stations/set-booking",
            Some(booking_body("c", "alice", "01/01/2030 10:00")),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "invalid booking_end_time format");

    let (status, json) = send(
        &state,
        authed(
            "PUT",
            "/stations/set-booking",
            Some(serde_json::json!({"connector_id": "c", "booking_end_time": "2030-01-01T10:00:00"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "username is required");
}

#[tokio::test]
async fn test_booking_rejects_mistyped_and_unpadded_times() {
    let state = test_state();

    let (status, json) = send(
        &state,
        authed(
            "PUT",
            "/stations/set-booking",
            Some(serde_json::json!({"connector_id": "c", "username": "alice", "booking_end_time": 123})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("invalid type"));

    let (status, json) = send(
        &state,
        authed(
            "PUT",
            "/stations/set-booking",
            Some(booking_body("c", "alice", "2030-6-1T1:2:3")),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "invalid booking_end_time format");
}

#[tokio::test]
async fn test_booking_unknown_connector() {
    let state = test_state();
    let (status, json) = send(
        &state,
        authed(
            "PUT",
            "/stations/set-booking",
            Some(booking_body("missing", "alice", &end_time(Duration::hours(1)))),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "connector not found");
}

#[tokio::test]
async fn test_bookings_for_unknown_user() {
    let state = test_state();

    let (status, json) = send(&state, authed("GET", "/stations/bookings/nobody", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "no bookings found for username nobody");

    let (status, json) = send(&state, authed("GET", "/stations/booking/nobody", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "no booking found for username nobody");

    let (status, _) = send(&state, authed("GET", "/stations/username/nobody", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
