use std::time::Duration;

use crate::constants::{DELIVERED_DELAY, READ_DELAY, REPLY_DELAY};

/// Core configuration. The three delays drive the simulated delivery
/// chain; tests and the REPL shrink them to keep runs fast.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    pub delivered_delay: Duration,
    pub read_delay: Duration,
    pub reply_delay: Duration,
}

impl CoreConfig {
    pub fn with_delays(delivered: Duration, read: Duration, reply: Duration) -> Self {
        Self {
            delivered_delay: delivered,
            read_delay: read,
            reply_delay: reply,
        }
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self::with_delays(DELIVERED_DELAY, READ_DELAY, REPLY_DELAY)
    }
}
