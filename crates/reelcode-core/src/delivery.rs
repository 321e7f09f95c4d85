//! Simulated message delivery.
//!
//! There is no transport behind this inbox, so delivery receipts are
//! time-driven: every outgoing message runs an independent three-stage
//! timer chain (delivered, read, then a canned counterpart reply). The
//! chain is kept as a due-time queue over an injected [`Clock`] rather
//! than raw timers, so tests drive it with a manual clock and the runtime
//! drives it with the wall clock.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::clock::Clock;
use crate::config::CoreConfig;
use crate::models::DeliveryState;

/// A timer that has come due, ready to be applied to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryEvent {
    /// An outgoing message moved forward in its delivery lifecycle.
    StateChanged {
        conversation_id: String,
        message_id: String,
        state: DeliveryState,
    },
    /// The counterpart's canned reply is due in a conversation. The typing
    /// indicator shown since the triggering send is cleared when the reply
    /// is appended.
    ReplyDue { conversation_id: String },
}

impl DeliveryEvent {
    pub fn conversation_id(&self) -> &str {
        match self {
            DeliveryEvent::StateChanged {
                conversation_id, ..
            } => conversation_id,
            DeliveryEvent::ReplyDue { conversation_id } => conversation_id,
        }
    }
}

#[derive(Debug)]
struct PendingTimer {
    due_at_ms: u64,
    event: DeliveryEvent,
}

pub struct DeliverySimulator {
    clock: Arc<dyn Clock>,
    config: CoreConfig,
    pending: Vec<PendingTimer>,
}

impl DeliverySimulator {
    pub fn new(clock: Arc<dyn Clock>, config: CoreConfig) -> Self {
        Self {
            clock,
            config,
            pending: Vec::new(),
        }
    }

    /// Schedule the full chain for a freshly sent message. Chains are keyed
    /// by message id and never coalesced: rapid sends each get their own
    /// timers. Nothing is cancelled when the conversation is deselected, so
    /// transitions still land on a now-inactive thread.
    pub fn schedule_chain(&mut self, conversation_id: &str, message_id: &str) {
        let now = self.clock.now_ms();
        debug!(conversation_id, message_id, "scheduling delivery chain");

        self.push(
            now + self.config.delivered_delay.as_millis() as u64,
            DeliveryEvent::StateChanged {
                conversation_id: conversation_id.to_string(),
                message_id: message_id.to_string(),
                state: DeliveryState::Delivered,
            },
        );
        self.push(
            now + self.config.read_delay.as_millis() as u64,
            DeliveryEvent::StateChanged {
                conversation_id: conversation_id.to_string(),
                message_id: message_id.to_string(),
                state: DeliveryState::Read,
            },
        );
        self.push(
            now + self.config.reply_delay.as_millis() as u64,
            DeliveryEvent::ReplyDue {
                conversation_id: conversation_id.to_string(),
            },
        );
    }

    fn push(&mut self, due_at_ms: u64, event: DeliveryEvent) {
        self.pending.push(PendingTimer { due_at_ms, event });
    }

    /// Drop every pending timer for a conversation. Called on delete so the
    /// queue cannot accumulate timers for threads that no longer exist;
    /// applying them would be a no-op anyway.
    pub fn prune_conversation(&mut self, conversation_id: &str) {
        self.pending
            .retain(|t| t.event.conversation_id() != conversation_id);
    }

    /// Pop everything due at or before the clock's current time, in due
    /// order (stable for equal due times, so a chain's own ordering holds).
    pub fn poll(&mut self) -> Vec<DeliveryEvent> {
        let now = self.clock.now_ms();
        let mut due: Vec<PendingTimer> = Vec::new();
        let mut remaining: Vec<PendingTimer> = Vec::new();
        for timer in self.pending.drain(..) {
            if timer.due_at_ms <= now {
                due.push(timer);
            } else {
                remaining.push(timer);
            }
        }
        self.pending = remaining;

        due.sort_by_key(|t| t.due_at_ms);
        due.into_iter().map(|t| t.event).collect()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Time until the earliest pending timer fires. None when idle; zero
    /// when something is already overdue.
    pub fn next_due_in(&self) -> Option<Duration> {
        let now = self.clock.now_ms();
        self.pending
            .iter()
            .map(|t| t.due_at_ms.saturating_sub(now))
            .min()
            .map(Duration::from_millis)
    }
}
