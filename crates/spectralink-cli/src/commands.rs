//! Slash commands typed at the chat prompt.

use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Plain text for the current conversation.
    Say(String),
    /// Resend whatever the composer still holds.
    Retry,
    To(String),
    Group(String),
    NewGroup { name: String, members: Vec<String> },
    Groups,
    Contacts,
    File(PathBuf),
    /// Save the attachment of the n-th visible message (1-based).
    Save(usize),
    Hide(bool),
    Leave,
    Refresh,
    Help,
    Quit,
}

pub const HELP: &str = "\
/to <name>                 open a conversation
/group <name>              open a group conversation
/newgroup <name> <a> <b>   create a group with the given members
/groups                    list your groups
/contacts                  list contacts
/file <path>               attach a file and send it
/retry                     resend a message that failed to send
/save <n>                  save the attachment of message n
/hide on|off               observer: mask encrypted bodies
/leave                     close the conversation
/refresh                   reload contacts and messages
/quit                      sign out and exit";

pub fn parse(line: &str) -> Result<Command, String> {
    let Some(rest) = line.strip_prefix('/') else {
        return Ok(Command::Say(line.to_string()));
    };

    let mut words = rest.split_whitespace();
    let name = words.next().unwrap_or_default();
    let args: Vec<&str> = words.collect();

    let one = |usage: &str| -> Result<String, String> {
        match args.as_slice() {
            [] => Err(format!("usage: {}", usage)),
            parts => Ok(parts.join(" ")),
        }
    };

    match name {
        "to" => one("/to <name>").map(Command::To),
        "group" => one("/group <name>").map(Command::Group),
        "newgroup" => match args.split_first() {
            Some((name, members)) => Ok(Command::NewGroup {
                name: name.to_string(),
                members: members.iter().map(|m| m.to_string()).collect(),
            }),
            None => Err("usage: /newgroup <name> [members...]".into()),
        },
        "groups" => Ok(Command::Groups),
        "contacts" => Ok(Command::Contacts),
        "file" => one("/file <path>").map(|p| Command::File(PathBuf::from(p))),
        "save" => match args.as_slice() {
            [n] => n
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .map(Command::Save)
                .ok_or_else(|| format!("not a message number: {}", n)),
            _ => Err("usage: /save <n>".into()),
        },
        "hide" => match args.as_slice() {
            ["on"] => Ok(Command::Hide(true)),
            ["off"] => Ok(Command::Hide(false)),
            _ => Err("usage: /hide on|off".into()),
        },
        "retry" => Ok(Command::Retry),
        "leave" => Ok(Command::Leave),
        "refresh" => Ok(Command::Refresh),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        other => Err(format!("unknown command /{} (try /help)", other)),
    }
}

/// Content type for an attachment, from its extension.
pub fn guess_content_type(path: &std::path::Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    Some(match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "pdf" => "application/pdf",
        "txt" | "md" => "text/plain",
        "json" => "application/json",
        _ => return None,
    })
}
