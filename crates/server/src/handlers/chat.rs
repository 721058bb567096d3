//! Message read/write handlers

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use spectralink_core::models::OutgoingMessage;
use tracing::{debug, info};

use crate::config::AppState;
use crate::error::{Error, Result};
use crate::store::{NewMessage, ReadScope, StoredMessage};

#[derive(Debug, Default, Deserialize)]
pub struct MessageParams {
    pub from: Option<String>,
    pub to: Option<String>,
    pub group: Option<String>,
}

/// GET /messages?from=&to= | ?group= | ?from=Hacker
pub async fn get_messages(
    State(state): State<AppState>,
    Query(params): Query<MessageParams>,
) -> Json<Vec<StoredMessage>> {
    let scope = ReadScope::from_params(
        params.from.as_deref(),
        params.to.as_deref(),
        params.group.as_deref(),
    );
    let messages = state.messages.read(&scope).await;
    debug!("GET /messages {:?} -> {} messages", scope, messages.len());
    Json(messages)
}

/// POST /send
pub async fn send_message(
    State(state): State<AppState>,
    Json(req): Json<OutgoingMessage>,
) -> Result<Json<Value>> {
    if req.from.is_empty() {
        return Err(Error::BadRequest("sender is required".into()));
    }
    match (&req.to, &req.group) {
        (None, None) => return Err(Error::BadRequest("receiver or group is required".into())),
        (Some(_), Some(_)) => {
            return Err(Error::BadRequest(
                "message cannot have both a receiver and a group".into(),
            ))
        }
        _ => {}
    }
    if let Some(group) = &req.group {
        if !state.groups.exists(group).await {
            return Err(Error::NotFound(format!("group {} not found", group)));
        }
    }

    let stored = state
        .messages
        .append(NewMessage {
            sender: req.from,
            receiver: req.to,
            group: req.group,
            body: req.body,
        })
        .await?;
    info!("POST /send - stored {}", stored.id);

    Ok(Json(json!({ "status": "ok" })))
}
