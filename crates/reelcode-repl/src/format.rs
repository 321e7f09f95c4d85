use reelcode_core::models::{Conversation, DeliveryState, Message, Sender};
use reelcode_core::store::ConversationStore;

// ANSI color codes
pub(crate) const GREEN: &str = "\x1b[32m";
pub(crate) const YELLOW: &str = "\x1b[33m";
pub(crate) const RED: &str = "\x1b[31m";
pub(crate) const WHITE_BOLD: &str = "\x1b[1;37m";
pub(crate) const DIM: &str = "\x1b[2m";
pub(crate) const RESET: &str = "\x1b[0m";

/// One row of the conversation list: markers, name, unread badge, preview.
pub(crate) fn format_conversation_row(store: &ConversationStore, conv: &Conversation) -> String {
    let mut markers = String::new();
    if store.is_pinned(&conv.id) {
        markers.push_str("📌");
    }
    if store.is_muted(&conv.id) {
        markers.push_str("🔕");
    }
    if conv.is_featured_participant {
        markers.push('⭐');
    }
    if conv.is_archived {
        markers.push('👻');
    }
    let selected = if store.selected_id() == Some(conv.id.as_str()) {
        "> "
    } else {
        "  "
    };
    let unread = if conv.unread_count > 0 {
        format!(" {YELLOW}({}){RESET}", conv.unread_count)
    } else {
        String::new()
    };
    format!(
        "{selected}{WHITE_BOLD}{}{RESET} [{}]{markers}{unread}  {DIM}{} · {}{RESET}",
        conv.participant_name, conv.id, conv.last_message_preview, conv.last_activity
    )
}

fn delivery_ticks(state: DeliveryState) -> String {
    match state {
        DeliveryState::Sent => format!("{DIM}✓{RESET}"),
        DeliveryState::Delivered => format!("{DIM}✓✓{RESET}"),
        DeliveryState::Read => format!("{YELLOW}✓✓{RESET}"),
    }
}

pub(crate) fn format_message(msg: &Message) -> String {
    match msg.sender {
        Sender::Own => format!(
            "{GREEN}you{RESET} {DIM}{}{RESET}  {}  {}",
            msg.sent_at,
            msg.body,
            delivery_ticks(msg.delivery_state)
        ),
        Sender::Counterpart => {
            format!("{WHITE_BOLD}them{RESET} {DIM}{}{RESET}  {}", msg.sent_at, msg.body)
        }
    }
}

pub(crate) fn print_error(text: &str) {
    println!("{RED}error:{RESET} {text}");
}

pub(crate) fn print_system(text: &str) {
    println!("{DIM}{text}{RESET}");
}
