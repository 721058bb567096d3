//! # SpectraLink core
//!
//! Client side of an identity-obfuscating chat. Identities and message bodies
//! travel as tagged tokens (see [`codec`]); the client resolves them back to
//! display names through the [`directory`], polls the selected conversation
//! and renders it, optionally in observer mode.
//!
//! ```no_run
//! use std::sync::Arc;
//! use spectralink_core::{ChatClient, ClientConfig, HttpTransport};
//!
//! # async fn run() -> spectralink_core::Result<()> {
//! let config = ClientConfig::from_env()?;
//! let transport = Arc::new(HttpTransport::new(&config)?);
//! let client = ChatClient::new(transport, config, "alice");
//! client.start().await;
//! client.select_contact("bob").await;
//! client.set_text("hello").await;
//! client.send().await?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod codec;
pub mod config;
pub mod directory;
pub mod error;
pub mod exchange;
pub mod identity;
pub mod models;
pub mod observer;
pub mod render;
pub mod selector;
pub mod transport;

pub use auth::{Credentials, Registration};
pub use codec::{decode, encode, is_tagged, Decoded};
pub use config::ClientConfig;
pub use directory::{build_directory, contacts_for, resolve_self, Directory};
pub use error::{ChatError, Result};
pub use exchange::{ChatClient, ChatView, Composer, PollHandle, SendOutcome};
pub use identity::{resolve_display, Identity, Role, OBSERVER};
pub use models::{
    Attachment, Group, Message, MessageBody, MessageQuery, NewGroup, OutgoingMessage, RosterEntry,
    WireMessage, ATTACHMENT_PREFIX,
};
pub use observer::ENCRYPTED_PLACEHOLDER;
pub use render::{BodyView, RenderedMessage};
pub use selector::{ConversationSelector, ConversationTarget, Generation};
pub use transport::{ChatTransport, HttpTransport};
