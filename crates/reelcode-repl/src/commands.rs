use reelcode_core::runtime::SharedStore;
use reelcode_core::session::{AuthError, SessionStore};
use reelcode_core::store::SelectOutcome;

use crate::format::{format_conversation_row, format_message, print_error, print_system};

pub(crate) enum CommandOutcome {
    Continue,
    Quit,
}

const HELP: &str = "\
commands:
  list [filter]        show conversations (pinned first)
  open <id>            open a conversation
  yes | no             answer a pending subscription offer
  back                 return to the list
  show                 print the open conversation
  send <text>          send a message
  hello                send the greeting
  new <name>           start a conversation
  msg <id> <name>      open via creator deep link
  pin <id> | mute <id> toggle pin/mute
  delete <id>          delete a conversation
  export               dump conversations as JSON
  login <email> <pw>   sign in
  signup <email> <pw>  create an account
  resend <email>       re-send the confirmation email
  logout | whoami      session
  quit";

pub(crate) fn handle_line(
    line: &str,
    store: &SharedStore,
    session: &SessionStore,
) -> CommandOutcome {
    let line = line.trim();
    if line.is_empty() {
        return CommandOutcome::Continue;
    }
    let (cmd, arg) = match line.split_once(' ') {
        Some((cmd, rest)) => (cmd, rest.trim()),
        None => (line, ""),
    };

    match cmd {
        "help" => println!("{HELP}"),
        "list" | "search" => {
            let s = store.lock();
            let unread = s.unread_total();
            if unread > 0 {
                print_system(&format!("🔔 {unread} unread"));
            }
            let listed = s.list_conversations(arg);
            if listed.is_empty() {
                print_system("no conversations");
            }
            for conv in listed {
                println!("{}", format_conversation_row(&s, conv));
            }
        }
        "open" => {
            if arg.is_empty() {
                print_error("usage: open <id>");
            } else {
                let mut s = store.lock();
                match s.select_conversation(arg) {
                    SelectOutcome::Selected => print_system("conversation opened"),
                    SelectOutcome::InterstitialRequired => {
                        println!(
                            "⭐ {} is a featured creator — subscribe to open this chat? (yes/no)",
                            s.conversation(arg)
                                .map(|c| c.participant_name.clone())
                                .unwrap_or_default()
                        );
                    }
                    SelectOutcome::NotFound => print_error("no such conversation"),
                }
            }
        }
        "yes" => {
            if store.lock().confirm_interstitial() {
                print_system("subscribed, conversation opened");
            } else {
                print_error("nothing to confirm");
            }
        }
        "no" => {
            store.lock().decline_interstitial();
        }
        "back" => store.lock().deselect(),
        "show" => show_selected(store),
        "send" => {
            if store.lock().send_message(arg).is_none() {
                print_error("open a conversation and give a non-empty message");
            }
        }
        "hello" => {
            if store.lock().say_hello().is_none() {
                print_error("open a conversation first");
            }
        }
        "new" => {
            if arg.is_empty() {
                print_error("usage: new <name>");
            } else {
                let id = store.lock().create_conversation_named(arg);
                print_system(&format!("created conversation {id}"));
            }
        }
        "msg" => match arg.split_once(' ') {
            Some((id, name)) => {
                store.lock().open_from_deep_link(id, name.trim());
                print_system("conversation opened");
            }
            None => print_error("usage: msg <creator-id> <name>"),
        },
        "pin" => store.lock().toggle_pin(arg),
        "mute" => store.lock().toggle_mute(arg),
        "delete" => store.lock().delete_conversation(arg),
        "export" => {
            let s = store.lock();
            match serde_json::to_string_pretty(&s.conversations) {
                Ok(json) => println!("{json}"),
                Err(err) => print_error(&err.to_string()),
            }
        }
        "login" => match split_credentials(arg) {
            Some((email, password)) => match session.login(email, password) {
                Ok(s) => print_system(&format!("signed in as {}", s.email)),
                Err(err) => print_auth_error(&err),
            },
            None => print_error("usage: login <email> <password>"),
        },
        "signup" => match split_credentials(arg) {
            Some((email, password)) => match session.signup(email, password) {
                Ok(()) => print_system("account created, confirm your email to sign in"),
                Err(err) => print_auth_error(&err),
            },
            None => print_error("usage: signup <email> <password>"),
        },
        "resend" => match session.resend_confirmation(arg) {
            Ok(()) => print_system("confirmation email re-sent"),
            Err(err) => print_auth_error(&err),
        },
        "logout" => session.logout(),
        "whoami" => match session.session() {
            Some(s) => println!("{}", s.email),
            None => print_system("not signed in"),
        },
        "quit" | "exit" => return CommandOutcome::Quit,
        _ => print_error("unknown command, try `help`"),
    }
    CommandOutcome::Continue
}

fn show_selected(store: &SharedStore) {
    let s = store.lock();
    let Some(conv) = s.selected_conversation() else {
        print_system("no conversation open");
        return;
    };
    println!("── {} ({}) ──", conv.participant_name, conv.presence_label());
    let messages = s.messages(&conv.id);
    if messages.is_empty() {
        print_system("No messages here yet...");
    }
    for msg in messages {
        println!("{}", format_message(msg));
    }
    if s.is_typing(&conv.id) {
        print_system("typing...");
    }
}

fn split_credentials(arg: &str) -> Option<(&str, &str)> {
    arg.split_once(' ')
        .map(|(email, password)| (email, password.trim()))
        .filter(|(email, password)| !email.is_empty() && !password.is_empty())
}

fn print_auth_error(err: &AuthError) {
    match err {
        AuthError::InvalidCredentials => print_error("invalid email or password, please try again"),
        AuthError::EmailUnconfirmed => {
            print_error("email not confirmed yet, use `resend <email>`")
        }
        AuthError::Other(msg) => print_error(msg),
    }
}
