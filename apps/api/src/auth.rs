//! Single shared password gate.
//!
//! There are no user accounts: whoever knows the configured password may use
//! every endpoint. Clients send it on each request, either in
//! `x-access-password` or as a bearer token.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
    Json,
};
use serde::Deserialize;
use subtle::ConstantTimeEq;
use tracing::warn;

use crate::errors::AppError;
use crate::state::AppState;

pub const PASSWORD_HEADER: &str = "x-access-password";

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

/// The password carried by a request, if any.
pub fn presented_password(headers: &HeaderMap) -> Option<&str> {
    if let Some(value) = headers.get(PASSWORD_HEADER).and_then(|v| v.to_str().ok()) {
        return Some(value);
    }
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
}

/// Compares in constant time for equal-length inputs.
pub fn password_matches(presented: &str, expected: &str) -> bool {
    presented.as_bytes().ct_eq(expected.as_bytes()).into()
}

/// POST /api/v1/login
pub async fn handle_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<StatusCode, AppError> {
    if password_matches(&req.password, &state.config.shared_password) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        warn!("Rejected login attempt");
        Err(AppError::Unauthorized)
    }
}

/// Middleware for every protected route.
pub async fn require_password(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    match presented_password(request.headers()) {
        Some(password) if password_matches(password, &state.config.shared_password) => {
            Ok(next.run(request).await)
        }
        _ => Err(AppError::Unauthorized),
    }
}
