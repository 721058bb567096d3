//! Identity directory built from the server roster.
//!
//! The directory is rebuilt wholesale on every refresh. Roster order is kept,
//! duplicates are allowed, and nothing is ever dropped: entries that cannot be
//! decoded keep their wire value as display value.

use crate::identity::{resolve_display, Identity, Role, OBSERVER};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Directory {
    entries: Vec<Identity>,
}

impl Directory {
    pub fn new(entries: Vec<Identity>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[Identity] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First entry whose display value equals `display`.
    pub fn find_by_display(&self, display: &str) -> Option<&Identity> {
        self.entries.iter().find(|i| i.display == display)
    }

    pub fn find_by_wire(&self, wire: &str) -> Option<&Identity> {
        self.entries.iter().find(|i| i.wire == wire)
    }

    /// Display value for any wire value, known to the directory or not.
    pub fn display_for(&self, wire: &str) -> String {
        match self.find_by_wire(wire) {
            Some(identity) => identity.display.clone(),
            None => resolve_display(wire),
        }
    }
}

/// Resolve every roster entry into an [`Identity`].
pub fn build_directory<I, S>(roster: I) -> Directory
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Directory::new(roster.into_iter().map(|wire| Identity::from_wire(wire)).collect())
}

/// Wire identity of the local user.
///
/// Standard users get the first matching directory entry, or their display
/// name when the roster has no tagged entry for them yet. The observer always
/// gets the sentinel.
pub fn resolve_self(directory: &Directory, local_display_name: &str, role: Role) -> String {
    if role.is_observer() {
        return OBSERVER.to_string();
    }
    directory
        .find_by_display(local_display_name)
        .map(|i| i.wire.clone())
        .unwrap_or_else(|| local_display_name.to_string())
}

/// Every directory entry except the local user's.
pub fn contacts_for(directory: &Directory, local_display_name: &str) -> Vec<Identity> {
    directory
        .entries
        .iter()
        .filter(|i| i.display != local_display_name)
        .cloned()
        .collect()
}
