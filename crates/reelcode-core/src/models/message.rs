use serde::{Deserialize, Serialize};

/// Who authored a message within a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sender {
    /// The current user.
    Own,
    /// The conversation counterpart.
    Counterpart,
}

/// Simulated delivery lifecycle for outgoing messages.
///
/// Strictly ordered: a message only ever moves forward through
/// Sent -> Delivered -> Read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DeliveryState {
    Sent,
    Delivered,
    Read,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique id derived from the creation timestamp plus a sequence
    /// suffix, so rapid sends within one millisecond stay distinct.
    pub id: String,
    pub body: String,
    pub sender: Sender,
    /// Display-formatted send time (e.g. "10:30 AM"). Never sorted on.
    pub sent_at: String,
    pub delivery_state: DeliveryState,
}

impl Message {
    /// Advance the delivery state, ignoring transitions that would move
    /// backwards. Returns true if the state changed.
    pub fn advance_to(&mut self, state: DeliveryState) -> bool {
        if state > self.delivery_state {
            self.delivery_state = state;
            true
        } else {
            false
        }
    }
}
