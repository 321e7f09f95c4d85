pub mod clock;
pub mod config;
pub mod constants;
pub mod delivery;
pub mod models;
pub mod runtime;
pub mod search;
pub mod session;
pub mod store;
pub mod tracing_setup;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::CoreConfig;
pub use delivery::{DeliveryEvent, DeliverySimulator};
pub use models::{Conversation, DeliveryState, Message, Participant, Presence, Sender};
pub use runtime::{run_delivery_loop, SharedStore};
pub use session::{AuthError, AuthProvider, LocalAuthProvider, Session, SessionStore};
pub use store::{ConversationStore, SelectOutcome};
