//! Command parsing

/// A chat message as the bot understands it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    /// `/link CODE`; `None` when the code is missing
    Link(Option<String>),
    Status,
    /// A slash command the bot does not know
    Unknown(String),
    /// Text that is not a command
    Text,
    /// A command addressed to another bot
    Ignored,
}

/// Parse a message text. `bot_username` is used to drop commands written as
/// `/cmd@otherbot` in group chats.
pub fn parse_command(text: &str, bot_username: Option<&str>) -> Command {
    let text = text.trim();
    let Some(rest) = text.strip_prefix('/') else {
        return Command::Text;
    };

    let (head, args) = rest
        .split_once(char::is_whitespace)
        .map_or((rest, ""), |(head, args)| (head, args.trim()));

    let name = match head.split_once('@') {
        Some((name, target)) => match bot_username {
            Some(me) if !target.eq_ignore_ascii_case(me) => return Command::Ignored,
            _ => name,
        },
        None => head,
    };

    match name.to_ascii_lowercase().as_str() {
        "start" => Command::Start,
        "help" => Command::Help,
        "status" => Command::Status,
        "link" => {
            let code = args.split_whitespace().next().map(str::to_string);
            Command::Link(code)
        }
        other => Command::Unknown(other.to_string()),
    }
}
