use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use spectralink_core::models::NewGroup;
use tracing::info;

use crate::config::AppState;
use crate::error::Result;
use crate::store::StoredGroup;

#[derive(Debug, Deserialize)]
pub struct GroupParams {
    pub user: Option<String>,
}

/// GET /groups?user=
pub async fn list_groups(
    State(state): State<AppState>,
    Query(params): Query<GroupParams>,
) -> Json<Vec<StoredGroup>> {
    match params.user {
        Some(user) => Json(state.groups.for_member(&user).await),
        None => Json(Vec::new()),
    }
}

/// POST /groups
pub async fn create_group(
    State(state): State<AppState>,
    Json(req): Json<NewGroup>,
) -> Result<Json<StoredGroup>> {
    // Name uniqueness is checked under the store's write lock.
    let group = state.groups.create(&req.name, req.members).await?;
    info!("POST /groups - {}", group.name);
    Ok(Json(group))
}
