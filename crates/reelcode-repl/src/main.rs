mod commands;
mod format;

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, BufReader};

use reelcode_core::clock::SystemClock;
use reelcode_core::config::CoreConfig;
use reelcode_core::runtime::{run_delivery_loop, SharedStore};
use reelcode_core::session::{LocalAuthProvider, SessionStore};
use reelcode_core::store::ConversationStore;
use reelcode_core::tracing_setup::init_tracing;

use commands::{handle_line, CommandOutcome};

#[derive(Parser, Debug)]
#[command(name = "reelcode-repl", about = "Interactive ReelCode inbox")]
struct Args {
    /// Shrink the simulated delivery delays to milliseconds
    #[arg(long)]
    fast: bool,
    /// Start with an empty inbox instead of the demo conversations
    #[arg(long)]
    empty: bool,
}

fn demo_config(fast: bool) -> CoreConfig {
    if fast {
        CoreConfig::with_delays(
            Duration::from_millis(100),
            Duration::from_millis(200),
            Duration::from_millis(300),
        )
    } else {
        CoreConfig::default()
    }
}

fn seed_demo_conversations(store: &SharedStore) {
    use reelcode_core::models::Participant;
    let mut s = store.lock();
    s.create_conversation(Participant {
        id: "1".to_string(),
        ..Participant::featured("John Doe")
    });
    s.create_conversation(Participant {
        id: "2".to_string(),
        ..Participant::new("Alice Smith")
    });
    s.create_conversation(Participant {
        id: "3".to_string(),
        ..Participant::new("Bob Smith")
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let clock = Arc::new(SystemClock::new());
    let store: SharedStore = Arc::new(Mutex::new(ConversationStore::new(
        clock,
        demo_config(args.fast),
    )));
    if !args.empty {
        seed_demo_conversations(&store);
    }

    let provider = Arc::new(LocalAuthProvider::new().with_account("demo@reelcode.dev", "demo"));
    let session = SessionStore::new(provider);

    let driver = tokio::spawn(run_delivery_loop(store.clone()));

    println!("ReelCode inbox — `help` for commands");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        if let CommandOutcome::Quit = handle_line(&line, &store, &session) {
            break;
        }
    }

    driver.abort();
    Ok(())
}
