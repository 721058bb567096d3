//! Append-only message log

use std::path::PathBuf;

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use spectralink_core::identity::OBSERVER;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use super::{load_records, save_records};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: String,
    pub sender: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewMessage {
    pub sender: String,
    pub receiver: Option<String>,
    pub group: Option<String>,
    pub body: String,
}

/// What a read covers, derived from the request parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadScope {
    /// Both directions between two identities.
    Conversation { a: String, b: String },
    Group(String),
    /// Everything; observer reads only.
    All,
    /// Parameters that select nothing.
    Empty,
}

impl ReadScope {
    pub fn from_params(from: Option<&str>, to: Option<&str>, group: Option<&str>) -> Self {
        match (from, to, group) {
            (_, _, Some(group)) => ReadScope::Group(group.to_string()),
            (Some(a), Some(b), None) => ReadScope::Conversation {
                a: a.to_string(),
                b: b.to_string(),
            },
            (Some(OBSERVER), None, None) => ReadScope::All,
            _ => ReadScope::Empty,
        }
    }

    fn matches(&self, message: &StoredMessage) -> bool {
        match self {
            ReadScope::Conversation { a, b } => {
                let receiver = message.receiver.as_deref();
                (message.sender == *a && receiver == Some(b.as_str()))
                    || (message.sender == *b && receiver == Some(a.as_str()))
            }
            ReadScope::Group(group) => message.group.as_deref() == Some(group.as_str()),
            ReadScope::All => true,
            ReadScope::Empty => false,
        }
    }
}

pub struct MessageStore {
    path: PathBuf,
    messages: RwLock<Vec<StoredMessage>>,
}

impl MessageStore {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let messages: Vec<StoredMessage> = load_records(&path).await?;
        info!("Message store loaded {} messages from {:?}", messages.len(), path);

        Ok(Self {
            path,
            messages: RwLock::new(messages),
        })
    }

    /// Append and persist. Duplicates are stored as sent.
    pub async fn append(&self, new: NewMessage) -> Result<StoredMessage> {
        if new.receiver.is_none() && new.group.is_none() {
            bail!("message needs a receiver or a group");
        }

        let message = StoredMessage {
            id: Uuid::new_v4().to_string(),
            sender: new.sender,
            receiver: new.receiver,
            group: new.group,
            body: new.body,
            created_at: Utc::now(),
        };

        let mut messages = self.messages.write().await;
        messages.push(message.clone());
        if let Err(e) = save_records(&self.path, messages.as_slice()).await {
            messages.pop();
            return Err(e);
        }
        debug!("Stored message {} from {}", message.id, message.sender);
        Ok(message)
    }

    /// Messages in scope, in insertion order.
    pub async fn read(&self, scope: &ReadScope) -> Vec<StoredMessage> {
        self.messages
            .read()
            .await
            .iter()
            .filter(|m| scope.matches(m))
            .cloned()
            .collect()
    }
}
