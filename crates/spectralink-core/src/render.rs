//! Turns resolved messages into what a front-end shows.

use std::fmt;

use serde::Serialize;

use crate::codec::decode;
use crate::directory::Directory;
use crate::identity::Role;
use crate::models::{attachment_filename, Message, MessageBody};
use crate::observer::{self, ENCRYPTED_PLACEHOLDER};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BodyView {
    Text(String),
    Attachment { locator: String, filename: String },
    /// Tagged body hidden in observer mode.
    Masked,
}

impl fmt::Display for BodyView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BodyView::Text(text) => write!(f, "{}", text),
            BodyView::Attachment { locator, filename } => write!(f, "[{}]({})", filename, locator),
            BodyView::Masked => write!(f, "{}", ENCRYPTED_PLACEHOLDER),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedMessage {
    pub sender: String,
    /// Receiver display name, or `#<group>` for group messages.
    pub receiver: String,
    pub is_mine: bool,
    pub body: BodyView,
    /// Present in observer mode only.
    pub attribution: Option<String>,
}

impl fmt::Display for RenderedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(line) = &self.attribution {
            writeln!(f, "  {}", line)?;
        }
        let who = if self.is_mine { "me" } else { self.sender.as_str() };
        write!(f, "{}: {}", who, self.body)
    }
}

/// Everything needed to render a message list for one session.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub directory: &'a Directory,
    pub local_wire: &'a str,
    pub local_display: &'a str,
    pub role: Role,
    pub hide_encrypted: bool,
}

impl RenderContext<'_> {
    pub fn render(&self, message: &Message) -> RenderedMessage {
        let sender_wire = message.sender();
        let sender = self.directory.display_for(sender_wire);
        let receiver = match message {
            Message::Direct { receiver, .. } => self.directory.display_for(receiver),
            Message::Group { group, .. } => format!("#{}", group),
        };

        let is_mine = sender_wire == self.local_wire || sender == self.local_display;

        let (body, attribution) = match self.role {
            Role::Observer => (
                observer::observer_body(message.body(), self.hide_encrypted),
                Some(observer::attribution(&sender, &receiver)),
            ),
            Role::Standard => (standard_body(message.body()), None),
        };

        RenderedMessage {
            sender,
            receiver,
            is_mine,
            body,
            attribution,
        }
    }

    pub fn render_all(&self, messages: &[Message]) -> Vec<RenderedMessage> {
        messages.iter().map(|m| self.render(m)).collect()
    }
}

fn standard_body(body: &MessageBody) -> BodyView {
    match body {
        MessageBody::Attachment { locator } => BodyView::Attachment {
            filename: attachment_filename(locator).to_string(),
            locator: locator.clone(),
        },
        MessageBody::Text(token) => BodyView::Text(decode(token).unwrap_or_else(|| token.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{encode, DECRYPTION_FAILED};
    use crate::directory::build_directory;
    use crate::identity::OBSERVER;

    fn direct(sender: &str, receiver: &str, body: MessageBody) -> Message {
        Message::Direct {
            sender: sender.into(),
            receiver: receiver.into(),
            body,
        }
    }

    #[test]
    fn test_standard_rendering_decodes_names_and_body() {
        let alice = encode("alice");
        let bob = encode("bob");
        let directory = build_directory(vec![alice.clone(), bob.clone()]);
        let ctx = RenderContext {
            directory: &directory,
            local_wire: &alice,
            local_display: "alice",
            role: Role::Standard,
            hide_encrypted: false,
        };

        let rendered = ctx.render(&direct(&bob, &alice, MessageBody::Text(encode("hi alice"))));
        assert_eq!(rendered.sender, "bob");
        assert_eq!(rendered.receiver, "alice");
        assert!(!rendered.is_mine);
        assert_eq!(rendered.body, BodyView::Text("hi alice".into()));
        assert_eq!(rendered.attribution, None);
    }

    #[test]
    fn test_is_mine_matches_decoded_sender() {
        // A message sent under an older token of the same user is still ours.
        let old_token = encode("alice");
        let current = encode("alice");
        let directory = build_directory(vec![current.clone()]);
        let ctx = RenderContext {
            directory: &directory,
            local_wire: &current,
            local_display: "alice",
            role: Role::Standard,
            hide_encrypted: false,
        };

        let rendered = ctx.render(&direct(&old_token, "bob", MessageBody::Text("yo".into())));
        assert!(rendered.is_mine);
        assert_eq!(rendered.body, BodyView::Text("yo".into()));
    }

    #[test]
    fn test_corrupt_body_shows_failure_sentinel() {
        let directory = Directory::default();
        let ctx = RenderContext {
            directory: &directory,
            local_wire: "alice",
            local_display: "alice",
            role: Role::Standard,
            hide_encrypted: false,
        };
        let body = MessageBody::Text("🔒[0123456789abcdef0123456789abcdef]@@".into());
        assert_eq!(
            ctx.render(&direct("bob", "alice", body)).body,
            BodyView::Text(DECRYPTION_FAILED.into())
        );
    }

    #[test]
    fn test_attachment_link_uses_final_segment() {
        let directory = Directory::default();
        let ctx = RenderContext {
            directory: &directory,
            local_wire: "alice",
            local_display: "alice",
            role: Role::Standard,
            hide_encrypted: false,
        };
        let rendered = ctx.render(&direct(
            "alice",
            "bob",
            MessageBody::attachment("/files/ab12/report.pdf"),
        ));
        assert!(rendered.is_mine);
        assert_eq!(
            rendered.body,
            BodyView::Attachment {
                locator: "/files/ab12/report.pdf".into(),
                filename: "report.pdf".into(),
            }
        );
        assert_eq!(rendered.to_string(), "me: [report.pdf](/files/ab12/report.pdf)");
    }

    #[test]
    fn test_observer_rendering_attributes_every_message() {
        let alice = encode("alice");
        let directory = build_directory(vec![alice.clone()]);
        let ctx = RenderContext {
            directory: &directory,
            local_wire: OBSERVER,
            local_display: OBSERVER,
            role: Role::Observer,
            hide_encrypted: true,
        };

        let group = Message::Group {
            sender: alice.clone(),
            group: "rust".into(),
            body: MessageBody::Text(encode("hello")),
        };
        let rendered = ctx.render(&group);
        assert_eq!(rendered.attribution.as_deref(), Some("alice → #rust"));
        assert_eq!(rendered.body, BodyView::Masked);

        let own = ctx.render(&direct(OBSERVER, OBSERVER, MessageBody::Text("ping".into())));
        assert!(own.is_mine);
        assert_eq!(own.attribution.as_deref(), Some("Hacker → Hacker"));
    }
}
