pub mod bookings;
pub mod health;
pub mod stations;

use axum::http::HeaderMap;

use crate::errors::AppError;

/// Bearer-token gate for the `/stations` routes. An empty configured token
/// leaves the routes open.
fn check_auth(headers: &HeaderMap, expected_token: &str) -> Result<(), AppError> {
    if expected_token.is_empty() {
        return Ok(());
    }

    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token != expected_token {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}
