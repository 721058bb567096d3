//! Account and roster handlers

use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};
use spectralink_core::auth::{LoginRequest, LoginResponse, RegisterRequest};
use spectralink_core::models::RosterEntry;
use tracing::info;

use crate::config::AppState;
use crate::error::Result;

/// POST /register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    info!("POST /register");
    let user = state
        .users
        .register(
            &req.username,
            &req.password,
            req.email.as_deref(),
            req.phone.as_deref(),
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "status": "ok", "username": user.username })),
    ))
}

/// POST /login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    info!("POST /login");
    let username = state.users.login(&req.username, &req.password).await?;
    Ok(Json(LoginResponse { username }))
}

/// GET /users
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<RosterEntry>>> {
    let roster = state.users.roster().await?;
    Ok(Json(
        roster
            .into_iter()
            .map(|username| RosterEntry { username })
            .collect(),
    ))
}
