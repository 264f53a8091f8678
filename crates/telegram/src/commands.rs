//! Slash commands understood by the bot.

use tubewatch_watcher::{ConversationId, SubscribeOutcome, SubscriptionRegistry};

pub const HELP_TEXT: &str = "tubewatch\n\n\
Commands:\n\
/channel <channel_id> - Subscribe this chat to a channel's new uploads\n\
/start - Show this help";

pub const CHANNEL_USAGE: &str = "Please provide Channel ID: /channel UC_x5XG1OV2P6uZZ5FSM9Ttw";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Channel { channel_id: Option<String> },
}

/// Parse a message body into a command.
///
/// Accepts `/cmd@botname` only when `botname` matches `bot_username`, so in
/// groups the bot ignores commands meant for another bot.
pub fn parse_command(text: &str, bot_username: Option<&str>) -> Option<Command> {
    let body = text.trim().strip_prefix('/')?;
    let mut parts = body.split_whitespace();
    let head = parts.next()?;

    let name = match head.split_once('@') {
        Some((name, target)) => {
            let addressed_to_us =
                bot_username.is_some_and(|ours| ours.eq_ignore_ascii_case(target));
            if !addressed_to_us {
                return None;
            }
            name
        },
        None => head,
    };

    match name.to_ascii_lowercase().as_str() {
        "start" | "help" => Some(Command::Start),
        "channel" => Some(Command::Channel {
            channel_id: parts.next().map(str::to_string),
        }),
        _ => None,
    }
}

/// Apply `command` for `conversation` and return the reply text.
pub fn execute(
    command: &Command,
    conversation: &ConversationId,
    registry: &SubscriptionRegistry,
) -> String {
    match command {
        Command::Start => HELP_TEXT.to_string(),
        Command::Channel { channel_id: None } => CHANNEL_USAGE.to_string(),
        Command::Channel {
            channel_id: Some(channel_id),
        } => match registry.subscribe(conversation.clone(), channel_id.as_str()) {
            SubscribeOutcome::Added => format!("Subscribed to channel: {channel_id}"),
            SubscribeOutcome::AlreadyPresent => "Already subscribed!".to_string(),
        },
    }
}
