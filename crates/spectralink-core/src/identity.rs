//! Identities and the wire/display resolution policy.

use serde::{Deserialize, Serialize};

use crate::codec::{self, Decoded};

/// Reserved identity of the privileged observer. Never encoded or decoded.
pub const OBSERVER: &str = "Hacker";

/// Session role, resolved once when the session starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Standard,
    Observer,
}

impl Role {
    pub fn for_display_name(display_name: &str) -> Self {
        if display_name == OBSERVER {
            Role::Observer
        } else {
            Role::Standard
        }
    }

    pub fn is_observer(self) -> bool {
        matches!(self, Role::Observer)
    }
}

/// A participant as known to the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Value carried on the wire and in storage.
    pub wire: String,
    /// Value shown to the user.
    pub display: String,
}

impl Identity {
    pub fn from_wire(wire: impl Into<String>) -> Self {
        let wire = wire.into();
        let display = resolve_display(&wire);
        Self { wire, display }
    }

    pub fn is_observer(&self) -> bool {
        self.wire == OBSERVER
    }
}

/// Decode if tagged, else treat as already plain.
///
/// Corrupt tagged values fall back to the raw wire value. The observer
/// sentinel is returned untouched.
pub fn resolve_display(wire: &str) -> String {
    if wire == OBSERVER {
        return OBSERVER.to_string();
    }
    match codec::inspect(wire) {
        Decoded::Tagged(plain) => plain,
        Decoded::Plain | Decoded::Corrupt => wire.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_resolution() {
        assert_eq!(Role::for_display_name("Hacker"), Role::Observer);
        assert_eq!(Role::for_display_name("hacker"), Role::Standard);
        assert_eq!(Role::for_display_name("alice"), Role::Standard);
    }

    #[test]
    fn test_resolve_display_policy() {
        assert_eq!(resolve_display(&codec::encode("alice")), "alice");
        assert_eq!(resolve_display("bob"), "bob");
        assert_eq!(resolve_display(OBSERVER), OBSERVER);

        let corrupt = "🔒[0123456789abcdef0123456789abcdef]!!!";
        assert_eq!(resolve_display(corrupt), corrupt);
    }

    #[test]
    fn test_identity_from_wire() {
        let wire = codec::encode("carol");
        let identity = Identity::from_wire(wire.clone());
        assert_eq!(identity.wire, wire);
        assert_eq!(identity.display, "carol");
        assert!(!identity.is_observer());
        assert!(Identity::from_wire(OBSERVER).is_observer());
    }
}
