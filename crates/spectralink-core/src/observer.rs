//! Observer-mode presentation rules.
//!
//! The observer reads every conversation. Tagged bodies are shown raw, or
//! replaced by [`ENCRYPTED_PLACEHOLDER`] when hiding is on. Plain and
//! attachment bodies are never masked.

use crate::codec::is_tagged;
use crate::models::{attachment_filename, MessageBody};
use crate::render::BodyView;

pub const ENCRYPTED_PLACEHOLDER: &str = "[Encrypted hidden]";

/// Body as the observer sees it.
pub fn observer_body(body: &MessageBody, hide_encrypted: bool) -> BodyView {
    match body {
        MessageBody::Attachment { locator } => BodyView::Attachment {
            filename: attachment_filename(locator).to_string(),
            locator: locator.clone(),
        },
        MessageBody::Text(token) if hide_encrypted && is_tagged(token) => BodyView::Masked,
        MessageBody::Text(token) => BodyView::Text(token.clone()),
    }
}

/// `sender → receiver` line shown above every message in observer mode.
pub fn attribution(sender_display: &str, receiver_display: &str) -> String {
    format!("{} → {}", sender_display, receiver_display)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode;

    #[test]
    fn test_only_tagged_bodies_are_masked() {
        let tagged = MessageBody::Text(encode("secret"));
        let plain = MessageBody::Text("hello".into());
        let file = MessageBody::attachment("/files/42.png");

        assert_eq!(observer_body(&tagged, true), BodyView::Masked);
        assert_eq!(observer_body(&plain, true), BodyView::Text("hello".into()));
        assert!(matches!(observer_body(&file, true), BodyView::Attachment { .. }));
    }

    #[test]
    fn test_unhidden_tagged_body_is_raw() {
        let token = encode("secret");
        let body = MessageBody::Text(token.clone());
        assert_eq!(observer_body(&body, false), BodyView::Text(token));
    }

    #[test]
    fn test_corrupt_token_is_still_masked() {
        // Masking follows the structural check, not decodability.
        let body = MessageBody::Text("🔒[0123456789abcdef0123456789abcdef]%%%".into());
        assert_eq!(observer_body(&body, true), BodyView::Masked);
    }

    #[test]
    fn test_attribution_format() {
        assert_eq!(attribution("alice", "bob"), "alice → bob");
        assert_eq!(attribution("Hacker", "#rust"), "Hacker → #rust");
    }
}
