//! Conversation selection state machine.
//!
//! Two states: unselected (initial) and selected. A single slot holds the
//! target, so choosing a peer always clears a group selection and vice versa.
//! Every transition bumps the generation counter; poll responses are keyed by
//! the generation active when their request was issued.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum ConversationTarget {
    /// Direct conversation with a peer, by wire identity.
    Peer(String),
    /// Group conversation, by group name.
    Group(String),
}

/// Selection generation. Monotonic for the lifetime of a selector.
pub type Generation = u64;

#[derive(Debug, Clone, Default)]
pub struct ConversationSelector {
    current: Option<ConversationTarget>,
    generation: Generation,
}

impl ConversationSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&ConversationTarget> {
        self.current.as_ref()
    }

    pub fn is_selected(&self) -> bool {
        self.current.is_some()
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Whether a response issued under `generation` may still be applied.
    pub fn is_current(&self, generation: Generation) -> bool {
        self.generation == generation
    }

    pub fn select_peer(&mut self, wire: impl Into<String>) -> Generation {
        self.transition(Some(ConversationTarget::Peer(wire.into())))
    }

    pub fn select_group(&mut self, name: impl Into<String>) -> Generation {
        self.transition(Some(ConversationTarget::Group(name.into())))
    }

    pub fn deselect(&mut self) -> Generation {
        self.transition(None)
    }

    fn transition(&mut self, next: Option<ConversationTarget>) -> Generation {
        self.current = next;
        self.generation += 1;
        self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_unselected() {
        let selector = ConversationSelector::new();
        assert!(!selector.is_selected());
        assert_eq!(selector.generation(), 0);
    }

    #[test]
    fn test_peer_and_group_are_mutually_exclusive() {
        let mut selector = ConversationSelector::new();
        selector.select_group("rust");
        selector.select_peer("bob");
        assert_eq!(selector.current(), Some(&ConversationTarget::Peer("bob".into())));

        selector.select_group("rust");
        assert_eq!(selector.current(), Some(&ConversationTarget::Group("rust".into())));
    }

    #[test]
    fn test_every_transition_bumps_generation() {
        let mut selector = ConversationSelector::new();
        let a = selector.select_peer("alice");
        let b = selector.select_peer("alice");
        let c = selector.deselect();
        assert!(a < b && b < c);
        assert!(selector.is_current(c));
        assert!(!selector.is_current(a));
        assert!(!selector.is_selected());
    }
}
