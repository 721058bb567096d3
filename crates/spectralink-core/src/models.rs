//! Records exchanged with the collaborator server.
//!
//! The server speaks a loosely-typed record (`receiver` and `group` both
//! optional, body either a token or an attachment reference). It is resolved
//! once, here, into [`Message`] and [`MessageBody`].

use serde::{Deserialize, Serialize};

use crate::error::ChatError;

/// Literal prefix of bodies that reference an uploaded attachment.
pub const ATTACHMENT_PREFIX: &str = "📎 File: ";

/// One roster row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub username: String,
}

/// Message record as stored and returned by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMessage {
    pub sender: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageBody {
    /// Wire token (tagged or legacy plain text).
    Text(String),
    /// Reference to an uploaded file. Never passed through the codec.
    Attachment { locator: String },
}

impl MessageBody {
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        match raw.strip_prefix(ATTACHMENT_PREFIX) {
            Some(locator) => MessageBody::Attachment {
                locator: locator.to_string(),
            },
            None => MessageBody::Text(raw),
        }
    }

    pub fn attachment(locator: impl Into<String>) -> Self {
        MessageBody::Attachment {
            locator: locator.into(),
        }
    }

    /// Body string as carried on the wire.
    pub fn to_wire(&self) -> String {
        match self {
            MessageBody::Text(token) => token.clone(),
            MessageBody::Attachment { locator } => format!("{}{}", ATTACHMENT_PREFIX, locator),
        }
    }
}

/// Final path segment of an attachment locator.
pub fn attachment_filename(locator: &str) -> &str {
    locator.rsplit('/').next().unwrap_or(locator)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Direct {
        sender: String,
        receiver: String,
        body: MessageBody,
    },
    Group {
        sender: String,
        group: String,
        body: MessageBody,
    },
}

impl Message {
    pub fn sender(&self) -> &str {
        match self {
            Message::Direct { sender, .. } | Message::Group { sender, .. } => sender,
        }
    }

    pub fn body(&self) -> &MessageBody {
        match self {
            Message::Direct { body, .. } | Message::Group { body, .. } => body,
        }
    }
}

impl TryFrom<WireMessage> for Message {
    type Error = ChatError;

    fn try_from(wire: WireMessage) -> Result<Self, Self::Error> {
        let body = MessageBody::parse(wire.body);
        match (wire.receiver, wire.group) {
            (_, Some(group)) => Ok(Message::Group {
                sender: wire.sender,
                group,
                body,
            }),
            (Some(receiver), None) => Ok(Message::Direct {
                sender: wire.sender,
                receiver,
                body,
            }),
            (None, None) => Err(ChatError::InvalidRecord(format!(
                "message from {} has neither receiver nor group",
                wire.sender
            ))),
        }
    }
}

/// Scope of a message read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageQuery {
    /// Both directions between two wire identities.
    Conversation { from: String, to: String },
    /// Every message of one group.
    Group { group: String },
    /// Every message, any participants. Issued by the observer only.
    Everything { observer: String },
}

impl MessageQuery {
    /// Query-string parameters for `GET /messages`.
    pub fn params(&self) -> Vec<(&'static str, &str)> {
        match self {
            MessageQuery::Conversation { from, to } => {
                vec![("from", from.as_str()), ("to", to.as_str())]
            }
            MessageQuery::Group { group } => vec![("group", group.as_str())],
            MessageQuery::Everything { observer } => vec![("from", observer.as_str())],
        }
    }
}

/// Body of `POST /send`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    pub from: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    pub body: String,
}

impl OutgoingMessage {
    pub fn direct(from: impl Into<String>, to: impl Into<String>, body: &MessageBody) -> Self {
        Self {
            from: from.into(),
            to: Some(to.into()),
            group: None,
            body: body.to_wire(),
        }
    }

    pub fn group(from: impl Into<String>, group: impl Into<String>, body: &MessageBody) -> Self {
        Self {
            from: from.into(),
            to: None,
            group: Some(group.into()),
            body: body.to_wire(),
        }
    }
}

/// File picked for sending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content_type: None,
            bytes,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// Response of `POST /upload`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub url: String,
}

/// Named group of wire identities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub members: Vec<String>,
}

/// Body of `POST /groups`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGroup {
    pub name: String,
    pub members: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attachment_body_is_recognised() {
        let body = MessageBody::parse("📎 File: /files/42.png");
        assert_eq!(body, MessageBody::attachment("/files/42.png"));
        assert_eq!(body.to_wire(), "📎 File: /files/42.png");
        assert_eq!(attachment_filename("/files/ab12/report.pdf"), "report.pdf");
        assert_eq!(attachment_filename("plain"), "plain");
    }

    #[test]
    fn test_record_resolution() {
        let direct = WireMessage {
            sender: "a".into(),
            receiver: Some("b".into()),
            group: None,
            body: "hi".into(),
        };
        assert!(matches!(Message::try_from(direct), Ok(Message::Direct { .. })));

        let group = WireMessage {
            sender: "a".into(),
            receiver: None,
            group: Some("rust".into()),
            body: "hi".into(),
        };
        assert!(matches!(Message::try_from(group), Ok(Message::Group { .. })));

        let orphan = WireMessage {
            sender: "a".into(),
            receiver: None,
            group: None,
            body: "hi".into(),
        };
        assert!(Message::try_from(orphan).is_err());
    }

    #[test]
    fn test_wire_message_ignores_extra_fields() {
        let json = r#"{"id":"1","sender":"a","receiver":"b","body":"x","created_at":"2026-01-01T00:00:00Z"}"#;
        let msg: WireMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.receiver.as_deref(), Some("b"));
        assert_eq!(msg.group, None);
    }

    #[test]
    fn test_outgoing_serialization_skips_empty_scope() {
        let out = OutgoingMessage::direct("a", "b", &MessageBody::Text("t".into()));
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["to"], "b");
        assert!(json.get("group").is_none());
    }
}
