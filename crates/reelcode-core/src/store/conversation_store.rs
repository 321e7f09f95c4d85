use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::config::CoreConfig;
use crate::constants::{
    AUTO_REPLY_BODY, DEFAULT_LAST_SEEN, GREETING_MESSAGE, NEW_CONVERSATION_PREVIEW,
    PLACEHOLDER_AVATAR, TIME_DISPLAY_FORMAT,
};
use crate::delivery::{DeliveryEvent, DeliverySimulator};
use crate::models::{Conversation, DeliveryState, Message, Participant, Presence, Sender};
use crate::search::conversation_matches;

/// Outcome of attempting to open a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
    Selected,
    /// Featured participant: a subscription offer has to be confirmed
    /// before the thread opens. Nothing is selected yet.
    InterstitialRequired,
    /// Unknown id; nothing happened.
    NotFound,
}

/// Single source of truth for the inbox: the conversation list, the
/// per-conversation message histories, and the selection.
///
/// Pinned and muted state live in id sets next to the records, not on
/// them; a conversation's effective state is the join of its own fields
/// with membership in those sets.
pub struct ConversationStore {
    pub conversations: Vec<Conversation>,
    pub messages_by_conversation: HashMap<String, Vec<Message>>,

    selected_id: Option<String>,
    pinned_ids: HashSet<String>,
    muted_ids: HashSet<String>,
    /// Conversations currently showing a typing indicator (set on send,
    /// cleared the instant the simulated reply is appended).
    typing_ids: HashSet<String>,
    /// Featured conversation waiting on subscription confirmation.
    pending_interstitial: Option<String>,

    clock: Arc<dyn Clock>,
    simulator: DeliverySimulator,
    next_message_seq: u64,
}

impl ConversationStore {
    pub fn new(clock: Arc<dyn Clock>, config: CoreConfig) -> Self {
        Self {
            conversations: Vec::new(),
            messages_by_conversation: HashMap::new(),
            selected_id: None,
            pinned_ids: HashSet::new(),
            muted_ids: HashSet::new(),
            typing_ids: HashSet::new(),
            pending_interstitial: None,
            clock: clock.clone(),
            simulator: DeliverySimulator::new(clock, config),
            next_message_seq: 0,
        }
    }

    // ===== Getters =====

    pub fn conversation(&self, id: &str) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == id)
    }

    pub fn messages(&self, conversation_id: &str) -> &[Message] {
        self.messages_by_conversation
            .get(conversation_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected_id.as_deref()
    }

    pub fn selected_conversation(&self) -> Option<&Conversation> {
        self.selected_id
            .as_deref()
            .and_then(|id| self.conversation(id))
    }

    pub fn is_pinned(&self, id: &str) -> bool {
        self.pinned_ids.contains(id)
    }

    pub fn is_muted(&self, id: &str) -> bool {
        self.muted_ids.contains(id)
    }

    pub fn is_typing(&self, id: &str) -> bool {
        self.typing_ids.contains(id)
    }

    pub fn pending_interstitial(&self) -> Option<&str> {
        self.pending_interstitial.as_deref()
    }

    pub fn unread_total(&self) -> u32 {
        self.conversations.iter().map(|c| c.unread_count).sum()
    }

    /// Filtered, ordered view of the list: case-insensitive substring
    /// match on participant name or last-message preview, pinned
    /// conversations first (stable), remainder in insertion order. An
    /// empty or whitespace-only filter returns everything.
    pub fn list_conversations(&self, filter_text: &str) -> Vec<&Conversation> {
        let mut pinned = Vec::new();
        let mut rest = Vec::new();
        for conv in &self.conversations {
            if !conversation_matches(conv, filter_text) {
                continue;
            }
            if self.pinned_ids.contains(&conv.id) {
                pinned.push(conv);
            } else {
                rest.push(conv);
            }
        }
        pinned.extend(rest);
        pinned
    }

    // ===== Selection =====

    /// Open a conversation. Featured participants (unless archived) are
    /// intercepted by a subscription interstitial; selection only proceeds
    /// on [`confirm_interstitial`](Self::confirm_interstitial). Opening
    /// resets the unread count.
    pub fn select_conversation(&mut self, id: &str) -> SelectOutcome {
        let Some(conv) = self.conversation(id) else {
            warn!(id, "select on unknown conversation");
            return SelectOutcome::NotFound;
        };

        if conv.is_featured_participant && !conv.is_archived {
            debug!(id, "featured participant, showing subscription offer");
            self.pending_interstitial = Some(id.to_string());
            return SelectOutcome::InterstitialRequired;
        }

        self.select_unchecked(id);
        SelectOutcome::Selected
    }

    /// Accept the subscription offer and finish opening the thread.
    /// Returns false when no interstitial is pending.
    pub fn confirm_interstitial(&mut self) -> bool {
        match self.pending_interstitial.take() {
            Some(id) => {
                self.select_unchecked(&id);
                true
            }
            None => false,
        }
    }

    /// Dismiss the subscription offer. Selection and unread count of the
    /// target are left untouched.
    pub fn decline_interstitial(&mut self) {
        self.pending_interstitial = None;
    }

    /// Navigate back to the list. Pending delivery timers for the thread
    /// keep running and will still land on it.
    pub fn deselect(&mut self) {
        self.selected_id = None;
    }

    fn select_unchecked(&mut self, id: &str) {
        if let Some(conv) = self.conversations.iter_mut().find(|c| c.id == id) {
            conv.unread_count = 0;
            self.selected_id = Some(id.to_string());
            self.pending_interstitial = None;
            debug!(id, "conversation selected");
        }
    }

    // ===== Mutations =====

    /// Append a new conversation for the given participant, with an empty
    /// history and the placeholder preview. Returns its id.
    pub fn create_conversation(&mut self, participant: Participant) -> String {
        let id = participant.id.clone();
        debug!(id = %id, name = %participant.name, "creating conversation");
        self.conversations.push(Conversation {
            id: id.clone(),
            participant_name: participant.name,
            avatar_ref: participant
                .avatar_ref
                .or_else(|| Some(PLACEHOLDER_AVATAR.to_string())),
            last_message_preview: NEW_CONVERSATION_PREVIEW.to_string(),
            last_activity: "Now".to_string(),
            unread_count: 0,
            is_featured_participant: participant.is_featured,
            is_archived: false,
            last_seen: Some(DEFAULT_LAST_SEEN.to_string()),
            presence: Presence::Offline,
            phone: None,
        });
        self.messages_by_conversation.insert(id.clone(), Vec::new());
        id
    }

    pub fn create_conversation_named(&mut self, name: &str) -> String {
        self.create_conversation(Participant::new(name))
    }

    /// Arrival from a "message this creator" deep link: select the
    /// existing thread if the id is already known, otherwise seed a
    /// featured conversation and open it. The deep link carries the
    /// user's intent to open the thread, so the interstitial is skipped.
    pub fn open_from_deep_link(&mut self, creator_id: &str, creator_name: &str) -> String {
        if self.conversation(creator_id).is_none() {
            self.create_conversation(Participant {
                id: creator_id.to_string(),
                ..Participant::featured(creator_name)
            });
        }
        self.select_unchecked(creator_id);
        creator_id.to_string()
    }

    /// Remove a conversation and its history. Clears the selection iff it
    /// was selected. Irreversible; unknown id is a no-op.
    pub fn delete_conversation(&mut self, id: &str) {
        let before = self.conversations.len();
        self.conversations.retain(|c| c.id != id);
        if self.conversations.len() == before {
            warn!(id, "delete on unknown conversation");
            return;
        }

        debug!(id, "conversation deleted");
        self.messages_by_conversation.remove(id);
        self.pinned_ids.remove(id);
        self.muted_ids.remove(id);
        self.typing_ids.remove(id);
        self.simulator.prune_conversation(id);
        if self.selected_id.as_deref() == Some(id) {
            self.selected_id = None;
        }
        if self.pending_interstitial.as_deref() == Some(id) {
            self.pending_interstitial = None;
        }
    }

    /// Flip pin membership. Its own inverse; affects ordering only via
    /// the pinned-first rule in [`list_conversations`](Self::list_conversations).
    pub fn toggle_pin(&mut self, id: &str) {
        if self.conversation(id).is_none() {
            warn!(id, "pin toggle on unknown conversation");
            return;
        }
        if !self.pinned_ids.remove(id) {
            self.pinned_ids.insert(id.to_string());
        }
    }

    /// Flip mute membership. Display treatment only; never affects
    /// ordering or delivery.
    pub fn toggle_mute(&mut self, id: &str) {
        if self.conversation(id).is_none() {
            warn!(id, "mute toggle on unknown conversation");
            return;
        }
        if !self.muted_ids.remove(id) {
            self.muted_ids.insert(id.to_string());
        }
    }

    // ===== Sending =====

    /// Send a message into the selected conversation. Appends it in
    /// `Sent`, updates the preview and activity time, shows the typing
    /// indicator, and schedules the simulated delivery chain. Returns the
    /// message id, or None when nothing is selected or the body is blank.
    pub fn send_message(&mut self, body: &str) -> Option<String> {
        let body = body.trim();
        if body.is_empty() {
            return None;
        }
        let conversation_id = self.selected_id.clone()?;

        let message_id = self.next_message_id();
        let sent_at = self.now_display();
        self.messages_by_conversation
            .entry(conversation_id.clone())
            .or_default()
            .push(Message {
                id: message_id.clone(),
                body: body.to_string(),
                sender: Sender::Own,
                sent_at: sent_at.clone(),
                delivery_state: DeliveryState::Sent,
            });
        self.touch_conversation(&conversation_id, body, &sent_at);
        self.typing_ids.insert(conversation_id.clone());
        self.simulator.schedule_chain(&conversation_id, &message_id);
        Some(message_id)
    }

    /// One-tap greeting for an empty thread.
    pub fn say_hello(&mut self) -> Option<String> {
        self.send_message(GREETING_MESSAGE)
    }

    // ===== Delivery =====

    /// Apply every delivery timer that has come due. Transitions keyed to
    /// a conversation that was deleted in the meantime fall out as no-ops;
    /// transitions for a merely deselected conversation still land on it.
    pub fn poll_delivery(&mut self) -> Vec<DeliveryEvent> {
        let events = self.simulator.poll();
        for event in &events {
            match event {
                DeliveryEvent::StateChanged {
                    conversation_id,
                    message_id,
                    state,
                } => self.apply_state_change(conversation_id, message_id, *state),
                DeliveryEvent::ReplyDue { conversation_id } => {
                    self.apply_auto_reply(conversation_id)
                }
            }
        }
        events
    }

    pub fn has_pending_delivery(&self) -> bool {
        self.simulator.has_pending()
    }

    pub fn next_delivery_due_in(&self) -> Option<Duration> {
        self.simulator.next_due_in()
    }

    fn apply_state_change(&mut self, conversation_id: &str, message_id: &str, state: DeliveryState) {
        let Some(messages) = self.messages_by_conversation.get_mut(conversation_id) else {
            return;
        };
        if let Some(msg) = messages.iter_mut().find(|m| m.id == message_id) {
            if msg.advance_to(state) {
                debug!(conversation_id, message_id, ?state, "delivery state advanced");
            }
        }
    }

    fn apply_auto_reply(&mut self, conversation_id: &str) {
        // The conversation may have been deleted while the timer was
        // pending; its typing flag went with it, so just drop the reply.
        if self.conversation(conversation_id).is_none() {
            return;
        }

        self.typing_ids.remove(conversation_id);

        let message_id = self.next_message_id();
        let sent_at = self.now_display();
        self.messages_by_conversation
            .entry(conversation_id.to_string())
            .or_default()
            .push(Message {
                id: message_id,
                body: AUTO_REPLY_BODY.to_string(),
                sender: Sender::Counterpart,
                sent_at: sent_at.clone(),
                delivery_state: DeliveryState::Read,
            });
        self.touch_conversation(conversation_id, AUTO_REPLY_BODY, &sent_at);
        if self.selected_id.as_deref() != Some(conversation_id) {
            if let Some(conv) = self.conversations.iter_mut().find(|c| c.id == conversation_id) {
                conv.unread_count += 1;
            }
        }
        debug!(conversation_id, "auto-reply appended");
    }

    // ===== Helpers =====

    fn touch_conversation(&mut self, id: &str, preview: &str, activity: &str) {
        if let Some(conv) = self.conversations.iter_mut().find(|c| c.id == id) {
            conv.last_message_preview = preview.to_string();
            conv.last_activity = activity.to_string();
        }
    }

    /// Timestamp-derived message id with a sequence suffix so rapid sends
    /// inside the same millisecond stay unique.
    fn next_message_id(&mut self) -> String {
        self.next_message_seq += 1;
        format!("msg-{}-{}", self.clock.now_ms(), self.next_message_seq)
    }

    fn now_display(&self) -> String {
        Local::now().format(TIME_DISPLAY_FORMAT).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::constants::{DELIVERED_DELAY, READ_DELAY, REPLY_DELAY};

    fn store_with_clock() -> (ConversationStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let store = ConversationStore::new(clock.clone(), CoreConfig::default());
        (store, clock)
    }

    fn seeded_store() -> (ConversationStore, Arc<ManualClock>) {
        let (mut store, clock) = store_with_clock();
        store.create_conversation(Participant {
            id: "1".to_string(),
            ..Participant::new("John Doe")
        });
        store.create_conversation(Participant {
            id: "2".to_string(),
            ..Participant::new("Alice Smith")
        });
        store.create_conversation(Participant {
            id: "3".to_string(),
            ..Participant::new("Bob Smith")
        });
        (store, clock)
    }

    fn ids(conversations: &[&Conversation]) -> Vec<String> {
        conversations.iter().map(|c| c.id.clone()).collect()
    }

    #[test]
    fn select_resets_unread_count() {
        let (mut store, _clock) = seeded_store();
        store.conversations[1].unread_count = 3;

        assert_eq!(store.select_conversation("2"), SelectOutcome::Selected);
        assert_eq!(store.conversation("2").unwrap().unread_count, 0);
        assert_eq!(store.selected_id(), Some("2"));
    }

    #[test]
    fn featured_selection_requires_confirmation() {
        let (mut store, _clock) = store_with_clock();
        let id = store.create_conversation(Participant::featured("John Doe"));
        store.conversations[0].unread_count = 5;

        assert_eq!(
            store.select_conversation(&id),
            SelectOutcome::InterstitialRequired
        );
        assert_eq!(store.selected_id(), None);
        assert_eq!(store.conversation(&id).unwrap().unread_count, 5);

        assert!(store.confirm_interstitial());
        assert_eq!(store.selected_id(), Some(id.as_str()));
        assert_eq!(store.conversation(&id).unwrap().unread_count, 0);
    }

    #[test]
    fn declined_interstitial_leaves_everything_untouched() {
        let (mut store, _clock) = store_with_clock();
        let id = store.create_conversation(Participant::featured("John Doe"));
        store.conversations[0].unread_count = 5;

        store.select_conversation(&id);
        store.decline_interstitial();

        assert_eq!(store.selected_id(), None);
        assert_eq!(store.conversation(&id).unwrap().unread_count, 5);
        assert!(!store.confirm_interstitial());
    }

    #[test]
    fn archived_featured_conversation_skips_interstitial() {
        let (mut store, _clock) = store_with_clock();
        let id = store.create_conversation(Participant::featured("Gone Creator"));
        store.conversations[0].is_archived = true;

        assert_eq!(store.select_conversation(&id), SelectOutcome::Selected);
    }

    #[test]
    fn pinned_conversations_sort_first() {
        let (mut store, _clock) = seeded_store();
        store.toggle_pin("3");

        assert_eq!(ids(&store.list_conversations("")), vec!["3", "1", "2"]);

        // Toggle is its own inverse.
        store.toggle_pin("3");
        assert!(!store.is_pinned("3"));
        assert_eq!(ids(&store.list_conversations("")), vec!["1", "2", "3"]);
    }

    #[test]
    fn empty_filter_returns_all_ids() {
        let (store, _clock) = seeded_store();
        assert_eq!(store.list_conversations("").len(), 3);
        assert_eq!(store.list_conversations("   ").len(), 3);
    }

    #[test]
    fn filter_matches_name_and_preview() {
        let (mut store, _clock) = seeded_store();
        store.conversations[0].last_message_preview = "Hey, how are you?".to_string();

        assert_eq!(ids(&store.list_conversations("smith")), vec!["2", "3"]);
        assert_eq!(ids(&store.list_conversations("how are")), vec!["1"]);
        assert!(store.list_conversations("nobody").is_empty());
    }

    #[test]
    fn filter_keeps_pinned_first() {
        let (mut store, _clock) = seeded_store();
        store.toggle_pin("3");
        assert_eq!(ids(&store.list_conversations("smith")), vec!["3", "2"]);
    }

    #[test]
    fn delete_selected_clears_selection() {
        let (mut store, _clock) = seeded_store();
        store.select_conversation("1");
        store.delete_conversation("1");

        assert_eq!(store.selected_id(), None);
        assert!(store.conversation("1").is_none());
        assert!(store.messages("1").is_empty());
    }

    #[test]
    fn delete_other_keeps_selection() {
        let (mut store, _clock) = seeded_store();
        store.select_conversation("1");
        store.delete_conversation("2");
        assert_eq!(store.selected_id(), Some("1"));
    }

    #[test]
    fn unknown_id_operations_are_noops() {
        let (mut store, _clock) = seeded_store();
        store.select_conversation("1");

        assert_eq!(store.select_conversation("missing"), SelectOutcome::NotFound);
        store.delete_conversation("missing");
        store.toggle_pin("missing");
        store.toggle_mute("missing");

        assert_eq!(store.selected_id(), Some("1"));
        assert_eq!(store.conversations.len(), 3);
        assert!(!store.is_pinned("missing"));
        assert!(!store.is_muted("missing"));
    }

    #[test]
    fn send_requires_selection_and_nonblank_body() {
        let (mut store, _clock) = seeded_store();
        assert!(store.send_message("hi").is_none());

        store.select_conversation("1");
        assert!(store.send_message("   ").is_none());
        assert!(store.send_message("hi").is_some());
        assert_eq!(store.messages("1").len(), 1);
    }

    #[test]
    fn delivery_states_advance_at_configured_delays() {
        let (mut store, clock) = seeded_store();
        store.select_conversation("1");
        let msg_id = store.send_message("hi").unwrap();

        let state = |store: &ConversationStore| {
            store
                .messages("1")
                .iter()
                .find(|m| m.id == msg_id)
                .unwrap()
                .delivery_state
        };

        assert_eq!(state(&store), DeliveryState::Sent);

        clock.advance(DELIVERED_DELAY);
        store.poll_delivery();
        assert_eq!(state(&store), DeliveryState::Delivered);

        clock.advance(READ_DELAY - DELIVERED_DELAY);
        store.poll_delivery();
        assert_eq!(state(&store), DeliveryState::Read);

        // A late poll never regresses the state.
        clock.advance(Duration::from_secs(60));
        store.poll_delivery();
        assert_eq!(state(&store), DeliveryState::Read);
    }

    #[test]
    fn typing_indicator_spans_send_to_reply() {
        let (mut store, clock) = seeded_store();
        store.select_conversation("1");
        store.send_message("hi");
        assert!(store.is_typing("1"));

        clock.advance(REPLY_DELAY);
        store.poll_delivery();
        assert!(!store.is_typing("1"));
    }

    #[test]
    fn end_to_end_dana_scenario() {
        let (mut store, clock) = store_with_clock();
        let id = store.create_conversation_named("Dana");

        let listed = store.list_conversations("");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].last_message_preview, NEW_CONVERSATION_PREVIEW);

        store.select_conversation(&id);
        store.send_message("hi");
        assert_eq!(store.conversation(&id).unwrap().last_message_preview, "hi");
        assert_eq!(store.messages(&id).len(), 1);

        clock.advance(REPLY_DELAY);
        store.poll_delivery();

        let messages = store.messages(&id);
        assert_eq!(messages.len(), 2);
        let reply = &messages[1];
        assert_eq!(reply.sender, Sender::Counterpart);
        assert_eq!(reply.body, AUTO_REPLY_BODY);
        assert_eq!(
            store.conversation(&id).unwrap().last_message_preview,
            AUTO_REPLY_BODY
        );
    }

    #[test]
    fn end_to_end_pin_second_conversation() {
        let (mut store, _clock) = store_with_clock();
        store.create_conversation_named("First");
        let second = store.create_conversation_named("Second");
        store.toggle_pin(&second);
        assert_eq!(store.list_conversations("")[0].id, second);
    }

    #[test]
    fn timers_still_land_on_deselected_conversation() {
        // Documented defect carried over from the original behavior:
        // switching threads does not cancel in-flight timers.
        let (mut store, clock) = seeded_store();
        store.select_conversation("1");
        let msg_id = store.send_message("hi").unwrap();

        store.deselect();
        store.select_conversation("2");

        clock.advance(REPLY_DELAY);
        store.poll_delivery();

        let msg = store.messages("1").iter().find(|m| m.id == msg_id).unwrap();
        assert_eq!(msg.delivery_state, DeliveryState::Read);
        assert_eq!(store.messages("1").len(), 2);
        // The reply landed unseen, so it counts as unread.
        assert_eq!(store.conversation("1").unwrap().unread_count, 1);
        assert_eq!(store.unread_total(), 1);
        // The active thread is untouched.
        assert!(store.messages("2").is_empty());
        // Opening the thread clears it again.
        store.select_conversation("1");
        assert_eq!(store.unread_total(), 0);
    }

    #[test]
    fn timers_for_deleted_conversation_are_dropped() {
        let (mut store, clock) = seeded_store();
        store.select_conversation("1");
        store.send_message("hi");
        store.delete_conversation("1");

        clock.advance(Duration::from_secs(10));
        let events = store.poll_delivery();
        assert!(events.is_empty());
        assert!(store.messages("1").is_empty());
    }

    #[test]
    fn deep_link_creates_featured_conversation_and_opens_it() {
        let (mut store, _clock) = store_with_clock();
        store.open_from_deep_link("creator-7", "Dana");

        let conv = store.conversation("creator-7").unwrap();
        assert!(conv.is_featured_participant);
        assert_eq!(conv.participant_name, "Dana");
        assert_eq!(conv.last_message_preview, NEW_CONVERSATION_PREVIEW);
        assert_eq!(store.selected_id(), Some("creator-7"));
    }

    #[test]
    fn deep_link_to_existing_id_selects_instead_of_duplicating() {
        let (mut store, _clock) = store_with_clock();
        store.open_from_deep_link("creator-7", "Dana");
        store.deselect();
        store.open_from_deep_link("creator-7", "Dana");
        assert_eq!(store.conversations.len(), 1);
        assert_eq!(store.selected_id(), Some("creator-7"));
    }

    #[test]
    fn mute_toggle_is_display_only() {
        let (mut store, _clock) = seeded_store();
        store.toggle_mute("2");
        assert!(store.is_muted("2"));
        assert_eq!(ids(&store.list_conversations("")), vec!["1", "2", "3"]);
        store.toggle_mute("2");
        assert!(!store.is_muted("2"));
    }

    #[test]
    fn rapid_sends_each_get_unique_ids_and_chains() {
        let (mut store, clock) = seeded_store();
        store.select_conversation("1");
        let a = store.send_message("one").unwrap();
        let b = store.send_message("two").unwrap();
        assert_ne!(a, b);

        clock.advance(REPLY_DELAY);
        store.poll_delivery();
        // Two sends, two auto-replies.
        assert_eq!(store.messages("1").len(), 4);
        assert!(store
            .messages("1")
            .iter()
            .filter(|m| m.sender == Sender::Own)
            .all(|m| m.delivery_state == DeliveryState::Read));
    }
}
