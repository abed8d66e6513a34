//! Settings commands read from stdin, one per line.
//!
//! ```text
//! guild <name>
//! guild-chat on|off
//! log-folder [path]
//! global on|off
//! help on|off
//! trade on|off
//! spoilers hide|show
//! ```

use std::path::PathBuf;

use pgrelay_session::SessionCommand;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

/// Forwards stdin commands to the session until stdin or the session closes.
pub async fn read_commands(tx: mpsc::Sender<SessionCommand>) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let Some(command) = parse_command(&line) else {
            tracing::warn!(line = %line.trim(), "unrecognized command");
            continue;
        };
        if tx.send(command).await.is_err() {
            break;
        }
    }
    Ok(())
}

fn parse_command(line: &str) -> Option<SessionCommand> {
    let line = line.trim();
    let (verb, arg) = match line.split_once(char::is_whitespace) {
        Some((verb, arg)) => (verb, arg.trim()),
        None => (line, ""),
    };

    match verb {
        "guild" if !arg.is_empty() => Some(SessionCommand::SelectGuild(arg.to_string())),
        "guild-chat" => switch(arg).map(SessionCommand::SetGuildChatEnabled),
        "log-folder" => Some(SessionCommand::SetCustomLogFolder(
            (!arg.is_empty()).then(|| PathBuf::from(arg)),
        )),
        "global" => switch(arg).map(SessionCommand::SetDisplayGlobal),
        "help" => switch(arg).map(SessionCommand::SetDisplayHelp),
        "trade" => switch(arg).map(SessionCommand::SetDisplayTrade),
        "spoilers" => match arg {
            "hide" => Some(SessionCommand::SetHideSpoilers(true)),
            "show" => Some(SessionCommand::SetHideSpoilers(false)),
            _ => None,
        },
        _ => None,
    }
}

fn switch(arg: &str) -> Option<bool> {
    match arg {
        "on" => Some(true),
        "off" => Some(false),
        _ => None,
    }
}
