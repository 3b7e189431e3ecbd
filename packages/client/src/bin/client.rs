//! Interactive Huddle chat client.
//!
//! Connects to a chat server and sends messages from stdin. Plain input is
//! broadcast; slash commands address rooms and users:
//!
//! ```not_rust
//! /join <room>          join a room (replays its history)
//! /leave <room>         leave a room
//! /room <room> <text>   send to a room
//! /msg <user-id> <text> send a private message
//! /typing [room]        send a typing indicator
//! /quit                 disconnect and exit
//! ```
//!
//! Run with:
//! ```not_rust
//! cargo run --bin huddle-client -- --display-name Alice --auth-token t1
//! ```

use std::io::Write;

use clap::Parser;
use rustyline::{DefaultEditor, error::ReadlineError};
use tokio::sync::mpsc;

use huddle_client::{Callbacks, ChatClient, ChatConfig, formatter::MessageFormatter};
use huddle_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "huddle-client")]
#[command(about = "Interactive chat client with broadcast, room, and private messaging", long_about = None)]
struct Args {
    /// Display name shown to other participants
    #[arg(short = 'n', long)]
    display_name: String,

    /// Auth token passed to the server's session gate
    #[arg(short = 't', long)]
    auth_token: String,

    /// WebSocket server URL
    #[arg(short = 'u', long, default_value = "ws://127.0.0.1:8080/ws")]
    url: String,
}

/// One parsed line of user input.
#[derive(Debug, PartialEq, Eq)]
enum Input {
    Broadcast(String),
    Join(String),
    Leave(String),
    Room { room_id: String, content: String },
    Private { to_user_id: String, content: String },
    Typing(Option<String>),
    Quit,
    Invalid(&'static str),
}

fn parse_line(line: &str) -> Input {
    let line = line.trim();
    let Some(command) = line.strip_prefix('/') else {
        return Input::Broadcast(line.to_string());
    };

    let (name, rest) = match command.split_once(' ') {
        Some((name, rest)) => (name, rest.trim()),
        None => (command, ""),
    };

    match name {
        "join" if !rest.is_empty() => Input::Join(rest.to_string()),
        "join" => Input::Invalid("usage: /join <room>"),
        "leave" if !rest.is_empty() => Input::Leave(rest.to_string()),
        "leave" => Input::Invalid("usage: /leave <room>"),
        "room" => match rest.split_once(' ') {
            Some((room_id, content)) if !content.trim().is_empty() => Input::Room {
                room_id: room_id.to_string(),
                content: content.trim().to_string(),
            },
            _ => Input::Invalid("usage: /room <room> <text>"),
        },
        "msg" => match rest.split_once(' ') {
            Some((to_user_id, content)) if !content.trim().is_empty() => Input::Private {
                to_user_id: to_user_id.to_string(),
                content: content.trim().to_string(),
            },
            _ => Input::Invalid("usage: /msg <user-id> <text>"),
        },
        "typing" if rest.is_empty() => Input::Typing(None),
        "typing" => Input::Typing(Some(rest.to_string())),
        "quit" | "exit" => Input::Quit,
        _ => Input::Invalid("unknown command"),
    }
}

fn redisplay_prompt(name: &str) {
    print!("{}> ", name);
    let _ = std::io::stdout().flush();
}

fn printing_callbacks(prompt_name: &str) -> Callbacks {
    let for_message = prompt_name.to_string();
    let for_typing = prompt_name.to_string();
    let for_status = prompt_name.to_string();
    let for_error = prompt_name.to_string();

    Callbacks::new()
        .on_message(move |msg| {
            print!("{}", MessageFormatter::format_message(&msg));
            redisplay_prompt(&for_message);
        })
        .on_typing(move |notice| {
            print!("{}", MessageFormatter::format_typing(&notice));
            redisplay_prompt(&for_typing);
        })
        .on_status_change(move |status| {
            print!("{}", MessageFormatter::format_status(&status));
            redisplay_prompt(&for_status);
        })
        .on_error(move |notice| {
            print!("{}", MessageFormatter::format_error(&notice));
            redisplay_prompt(&for_error);
        })
}

#[tokio::main]
async fn main() {
    setup_logger(env!("CARGO_BIN_NAME"), "warn");

    let args = Args::parse();

    let client = ChatClient::connect(
        ChatConfig {
            url: args.url,
            auth_token: args.auth_token,
            display_name: args.display_name.clone(),
        },
        printing_callbacks(&args.display_name),
    );

    println!(
        "\nYou are '{}'. Type to broadcast, /join <room> for rooms, /quit to exit.\n",
        args.display_name
    );

    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<String>();

    // rustyline is synchronous; run it on its own thread.
    let prompt = format!("{}> ", args.display_name);
    let _readline_handle = std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("failed to initialize readline: {}", e);
                return;
            }
        };

        loop {
            match rl.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        rl.add_history_entry(line).ok();
                        if input_tx.send(line.to_string()).is_err() {
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(e) => {
                    tracing::error!("readline error: {}", e);
                    break;
                }
            }
        }
    });

    while let Some(line) = input_rx.recv().await {
        let action = match parse_line(&line) {
            Input::Broadcast(text) => client.send_broadcast(&text),
            Input::Join(room) => client.join_room(&room),
            Input::Leave(room) => client.leave_room(&room),
            Input::Room { room_id, content } => client.send_to_room(&room_id, &content),
            Input::Private {
                to_user_id,
                content,
            } => client.send_private(&to_user_id, &content),
            Input::Typing(room) => client.send_typing(room.as_deref()),
            Input::Quit => break,
            Input::Invalid(usage) => {
                println!("{}", usage);
                Ok(())
            }
        };
        if action.is_err() {
            eprintln!("connection is closed");
            break;
        }
    }

    client.disconnect();
    if let Err(e) = client.wait().await {
        tracing::error!("client error: {}", e);
        std::process::exit(1);
    }
}
