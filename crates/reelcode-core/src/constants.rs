//! Application-wide constants
//!
//! Centralized location for magic strings and configuration values
//! that are used across multiple modules.

use std::time::Duration;

// Conversation defaults
pub const NEW_CONVERSATION_PREVIEW: &str = "Start a conversation!";
pub const DEFAULT_LAST_SEEN: &str = "last seen recently";
pub const PLACEHOLDER_AVATAR: &str = "/placeholder.svg";

// Chat defaults
pub const GREETING_MESSAGE: &str = "Hello";
pub const AUTO_REPLY_BODY: &str = "Thanks for your message! I'll get back to you soon.";

// Simulated delivery delays, measured from the moment a message is sent.
// Each outgoing message runs its own independent chain.
pub const DELIVERED_DELAY: Duration = Duration::from_secs(1);
pub const READ_DELAY: Duration = Duration::from_secs(2);
pub const REPLY_DELAY: Duration = Duration::from_secs(3);

/// Time format used for message timestamps and conversation activity
/// (e.g. "10:30 AM"). Display-only; never parsed back or sorted.
pub const TIME_DISPLAY_FORMAT: &str = "%-I:%M %p";
