//! HTTP handlers

pub mod auth;
pub mod chat;
pub mod files;
pub mod groups;

pub use crate::config::AppState;

pub use auth::{list_users, login, register};
pub use chat::{get_messages, send_message};
pub use files::{get_file, upload_file};
pub use groups::{create_group, list_groups};

/// GET /health
pub async fn health_check() -> &'static str {
    "OK"
}
