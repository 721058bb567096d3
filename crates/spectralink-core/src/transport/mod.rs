//! Collaborator boundary.
//!
//! The exchange client never talks HTTP directly; it goes through
//! [`ChatTransport`], so tests can swap in an in-memory implementation.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Attachment, Group, MessageQuery, NewGroup, OutgoingMessage, RosterEntry, WireMessage};

pub mod http;

pub use http::HttpTransport;

/// Abstraction for the roster, message, attachment and group stores.
#[async_trait]
pub trait ChatTransport: Send + Sync + 'static {
    async fn fetch_roster(&self) -> Result<Vec<RosterEntry>>;

    /// Messages in the scope of `query`, in store insertion order.
    async fn fetch_messages(&self, query: &MessageQuery) -> Result<Vec<WireMessage>>;

    async fn send_message(&self, message: &OutgoingMessage) -> Result<()>;

    /// Persist an attachment and return its locator.
    async fn upload_attachment(&self, attachment: &Attachment) -> Result<String>;

    async fn fetch_groups(&self, member: &str) -> Result<Vec<Group>>;

    async fn create_group(&self, group: &NewGroup) -> Result<Group>;
}
