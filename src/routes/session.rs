use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::info;

use super::error::ApiError;
use crate::session::Session;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/api/session",
        post(login).get(current).delete(logout),
    )
}

/// Bearer token from the `Authorization` header, if any.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// The caller's session token, or 401.
pub fn require_session(state: &AppState, headers: &HeaderMap) -> Result<String, ApiError> {
    let token = bearer_token(headers).ok_or_else(|| ApiError::unauthorized("Missing bearer token"))?;
    match state.sessions.get(token) {
        Some(_) => Ok(token.to_string()),
        None => Err(ApiError::unauthorized("Invalid or expired session")),
    }
}

/// The caller's session token when one was sent and is valid.
pub fn optional_session(state: &AppState, headers: &HeaderMap) -> Option<String> {
    let token = bearer_token(headers)?;
    state.sessions.get(token).map(|_| token.to_string())
}

#[derive(Debug, Deserialize)]
struct LoginBody {
    #[serde(default)]
    email: String,
}

async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginBody>, JsonRejection>,
) -> Result<(StatusCode, Json<Session>), ApiError> {
    let Json(body) = payload?;
    let session = state
        .sessions
        .login(&body.email)
        .map_err(|e| ApiError::bad_request(e.to_string()))?;
    Ok((StatusCode::CREATED, Json(session)))
}

async fn current(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<Session>, ApiError> {
    let token = require_session(&state, &headers)?;
    state
        .sessions
        .get(&token)
        .map(Json)
        .ok_or_else(|| ApiError::unauthorized("Invalid or expired session"))
}

async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Result<StatusCode, ApiError> {
    let token = require_session(&state, &headers)?;
    if state.sessions.logout(&token) {
        info!("Session ended");
    }
    Ok(StatusCode::NO_CONTENT)
}
