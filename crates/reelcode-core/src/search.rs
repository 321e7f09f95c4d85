//! Search utilities for filtering the conversation list.
//!
//! Pure functions only; safe to call on every keystroke. Empty or
//! whitespace-only queries mean "no filter".

use crate::models::Conversation;

/// Check if text contains the query (ASCII case-insensitive substring).
pub fn text_contains(text: &str, query: &str) -> bool {
    let text_chars: Vec<char> = text.chars().collect();
    let query_chars: Vec<char> = query.chars().collect();

    if query_chars.is_empty() {
        return true;
    }

    if text_chars.len() < query_chars.len() {
        return false;
    }

    for start_idx in 0..=(text_chars.len() - query_chars.len()) {
        let matches = query_chars.iter().enumerate().all(|(i, qc)| {
            text_chars
                .get(start_idx + i)
                .is_some_and(|c| c.eq_ignore_ascii_case(qc))
        });
        if matches {
            return true;
        }
    }
    false
}

/// Whether a conversation matches a filter string: substring match against
/// the participant name or the last-message preview.
pub fn conversation_matches(conversation: &Conversation, filter: &str) -> bool {
    let filter = filter.trim();
    if filter.is_empty() {
        return true;
    }
    text_contains(&conversation.participant_name, filter)
        || text_contains(&conversation.last_message_preview, filter)
}
