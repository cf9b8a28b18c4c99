// ABOUTME: Command parsing for chat messages addressed to the bot
// ABOUTME: Recognises !, / and @ prefixed commands and maps them to bot actions

/// A command recognised in a chat message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// The prefix character the command was written with
    pub prefix: char,
    /// The command name (without prefix or @botname suffix), lowercased
    pub name: String,
}

/// Commands the bot acts on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotCommand {
    Start,
    Help,
    /// `tag` / `everyone`
    Broadcast,
    /// `grant`
    GrantTag,
    /// `revoke`
    RevokeTag,
    /// `grant_su`
    GrantSudo,
    /// `revoke_su`
    RevokeSudo,
}

impl BotCommand {
    /// Map a parsed command onto a bot action.
    ///
    /// `@` only introduces the broadcast aliases, so ordinary @mentions of
    /// other users are never mistaken for commands.
    pub fn from_command(command: &Command) -> Option<Self> {
        let parsed = match command.name.as_str() {
            "start" => BotCommand::Start,
            "help" => BotCommand::Help,
            "tag" | "everyone" => BotCommand::Broadcast,
            "grant" => BotCommand::GrantTag,
            "revoke" => BotCommand::RevokeTag,
            "grant_su" => BotCommand::GrantSudo,
            "revoke_su" => BotCommand::RevokeSudo,
            _ => return None,
        };
        if command.prefix == '@' && parsed != BotCommand::Broadcast {
            return None;
        }
        Some(parsed)
    }
}

const COMMAND_PREFIXES: [char; 3] = ['!', '/', '@'];

/// Parse a chat message into a command, if it is one
///
/// # Arguments
/// * `body` - The message body to parse
/// * `bot_username` - The bot's username, used to accept `/cmd@botname`
///
/// Anything after the command word is ignored. Messages starting with `!!`
/// are escaped and never commands.
pub fn parse_message(body: &str, bot_username: Option<&str>) -> Option<Command> {
    let trimmed = body.trim();
    if trimmed.starts_with("!!") {
        return None;
    }

    let mut chars = trimmed.chars();
    let prefix = chars.next().filter(|c| COMMAND_PREFIXES.contains(c))?;
    let after_prefix = chars.as_str();

    // Must start with an alphabetic character
    if !after_prefix.chars().next().is_some_and(|c| c.is_alphabetic()) {
        return None;
    }

    let word = after_prefix.split_whitespace().next()?;
    let name = match word.split_once('@') {
        Some((name, target)) => {
            let addressed_to_us = bot_username
                .is_some_and(|me| me.trim_start_matches('@').eq_ignore_ascii_case(target));
            if !addressed_to_us {
                return None;
            }
            name
        }
        None => word,
    };

    Some(Command {
        prefix,
        name: name.to_lowercase(),
    })
}

/// Parse `body` straight to a bot action, if it is one
pub fn parse_bot_command(body: &str, bot_username: Option<&str>) -> Option<BotCommand> {
    parse_message(body, bot_username)
        .as_ref()
        .and_then(BotCommand::from_command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_command() {
        let cmd = parse_message("!tag", None).unwrap();
        assert_eq!(cmd.name, "tag");
        assert_eq!(cmd.prefix, '!');
    }

    #[test]
    fn test_parse_ignores_trailing_words() {
        let cmd = parse_message("!help  me now", None).unwrap();
        assert_eq!(cmd.name, "help");
    }

    #[test]
    fn test_parse_slash_with_bot_suffix() {
        let cmd = parse_message("/everyone@TagAllBot", Some("tagallbot")).unwrap();
        assert_eq!(cmd.name, "everyone");
        assert_eq!(cmd.prefix, '/');
    }

    #[test]
    fn test_parse_suffix_for_other_bot_is_not_command() {
        assert_eq!(parse_message("/tag@SomeOtherBot", Some("tagallbot")), None);
        assert_eq!(parse_message("/tag@tagallbot", None), None);
    }

    #[test]
    fn test_parse_escape_sequence() {
        assert_eq!(parse_message("!!tag", None), None);
        assert_eq!(parse_message("!!", None), None);
    }

    #[test]
    fn test_parse_regular_and_empty_messages() {
        assert_eq!(parse_message("hello world", None), None);
        assert_eq!(parse_message("   ", None), None);
        assert_eq!(parse_message("", None), None);
    }

    #[test]
    fn test_non_alphabetic_after_prefix() {
        assert_eq!(parse_message("!123", None), None);
        assert_eq!(parse_message("!", None), None);
        assert_eq!(parse_message("@ everyone", None), None);
    }

    #[test]
    fn test_case_insensitive_name() {
        assert_eq!(parse_bot_command("!TAG", None), Some(BotCommand::Broadcast));
    }

    #[test]
    fn test_bot_command_mapping() {
        let cases = [
            ("!start", Some(BotCommand::Start)),
            ("/help", Some(BotCommand::Help)),
            ("!tag", Some(BotCommand::Broadcast)),
            ("@everyone", Some(BotCommand::Broadcast)),
            ("@tag", Some(BotCommand::Broadcast)),
            ("!grant", Some(BotCommand::GrantTag)),
            ("!revoke", Some(BotCommand::RevokeTag)),
            ("!grant_su", Some(BotCommand::GrantSudo)),
            ("/revoke_su", Some(BotCommand::RevokeSudo)),
            ("!unknown", None),
        ];
        for (body, expected) in cases {
            assert_eq!(parse_bot_command(body, None), expected, "{}", body);
        }
    }

    #[test]
    fn test_at_prefix_only_for_broadcast() {
        assert_eq!(parse_bot_command("@grant", None), None);
        assert_eq!(parse_bot_command("@alice hi there", None), None);
    }
}
