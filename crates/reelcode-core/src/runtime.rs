use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::debug;

use crate::store::ConversationStore;

pub type SharedStore = Arc<Mutex<ConversationStore>>;

/// Upper bound on any driver sleep. The due time is computed under the
/// lock and goes stale the moment a send schedules a shorter timer, so
/// the driver never commits to a long sleep; it re-checks at least this
/// often.
const MAX_SLEEP: Duration = Duration::from_millis(200);

/// Drive the delivery queue against the wall clock: sleep until the next
/// pending timer comes due (capped at [`MAX_SLEEP`]), apply everything
/// due, repeat. Intended to be spawned as a task and aborted on shutdown;
/// holds the store lock only while polling.
pub async fn run_delivery_loop(store: SharedStore) {
    loop {
        let wait = { store.lock().next_delivery_due_in() };
        match wait {
            Some(due_in) if due_in.is_zero() => {
                let events = store.lock().poll_delivery();
                if !events.is_empty() {
                    debug!(count = events.len(), "applied delivery events");
                }
            }
            Some(due_in) => tokio::time::sleep(due_in.min(MAX_SLEEP)).await,
            None => tokio::time::sleep(MAX_SLEEP).await,
        }
    }
}
