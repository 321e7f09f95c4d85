use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_LAST_SEEN;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Presence {
    Online,
    Offline,
}

impl Default for Presence {
    fn default() -> Self {
        Self::Offline
    }
}

/// A thread between the current user and one counterpart.
///
/// Pinned/muted state deliberately does NOT live here: the store tracks
/// those as separate id sets, and a conversation's effective state is the
/// join of this record with membership in those sets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub participant_name: String,
    pub avatar_ref: Option<String>,
    /// Mutated on every new message (own or counterpart).
    pub last_message_preview: String,
    /// Display-formatted activity time (e.g. "10:30 AM", "Yesterday").
    /// Not sortable; ordering is insertion order plus the pinned rule.
    pub last_activity: String,
    pub unread_count: u32,
    /// Opening this thread requires a one-time subscription confirmation.
    pub is_featured_participant: bool,
    /// Archived counterparts render a placeholder avatar and skip the
    /// featured-participant gate.
    pub is_archived: bool,
    #[serde(default)]
    pub last_seen: Option<String>,
    #[serde(default)]
    pub presence: Presence,
    #[serde(default)]
    pub phone: Option<String>,
}

impl Conversation {
    /// Status line shown under the participant name.
    pub fn presence_label(&self) -> String {
        match self.presence {
            Presence::Online => "online".to_string(),
            Presence::Offline => self
                .last_seen
                .clone()
                .unwrap_or_else(|| DEFAULT_LAST_SEEN.to_string()),
        }
    }
}
