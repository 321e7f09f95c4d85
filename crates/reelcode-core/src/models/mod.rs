pub mod conversation;
pub mod message;
pub mod participant;

pub use conversation::{Conversation, Presence};
pub use message::{DeliveryState, Message, Sender};
pub use participant::Participant;
