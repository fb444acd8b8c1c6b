#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    Exit,
    Help,
    Clear,
    /// `/model` alone lists the choices.
    Model(Option<String>),
    Temperature(String),
    TopP(String),
    Token,
    History,
    Status,
    Retry,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedChatCommand {
    NotACommand,
    Command(ChatCommand),
    MissingArgument { usage: &'static str },
    UnknownCommand(String),
}

pub const CHAT_HELP: &str = "\
Commands:
  /help              Show this help
  /clear             Clear chat history
  /model [name]      Show or switch the model
  /temperature <v>   Set temperature (0.01 - 2.00)
  /top_p <v>         Set top_p (0.01 - 1.00)
  /token             Enter a new API token
  /history           Print the conversation so far
  /status            Show model, parameters and credential status
  /retry             Ask again for a message left without a reply
  /exit              Quit";

/// Classify a line typed at the chat prompt. Anything not starting with `/`
/// is a chat message.
pub fn parse_chat_command(input: &str) -> ParsedChatCommand {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return ParsedChatCommand::NotACommand;
    }

    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let name = parts.next().unwrap_or_default().to_ascii_lowercase();
    let arg = parts
        .next()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string);

    let command = match name.as_str() {
        "/exit" | "/quit" | "/q" => ChatCommand::Exit,
        "/help" | "/?" => ChatCommand::Help,
        "/clear" => ChatCommand::Clear,
        "/model" => ChatCommand::Model(arg),
        "/temperature" | "/temp" => match arg {
            Some(value) => ChatCommand::Temperature(value),
            None => {
                return ParsedChatCommand::MissingArgument {
                    usage: "/temperature <0.01-2.00>",
                }
            }
        },
        "/top_p" | "/top-p" => match arg {
            Some(value) => ChatCommand::TopP(value),
            None => {
                return ParsedChatCommand::MissingArgument {
                    usage: "/top_p <0.01-1.00>",
                }
            }
        },
        "/token" => ChatCommand::Token,
        "/history" => ChatCommand::History,
        "/status" => ChatCommand::Status,
        "/retry" => ChatCommand::Retry,
        _ => return ParsedChatCommand::UnknownCommand(name),
    };

    ParsedChatCommand::Command(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_not_a_command() {
        assert_eq!(parse_chat_command("I have a headache"), ParsedChatCommand::NotACommand);
        assert_eq!(parse_chat_command("  "), ParsedChatCommand::NotACommand);
    }

    #[test]
    fn parses_commands_with_arguments() {
        assert_eq!(
            parse_chat_command("/temperature 0.5"),
            ParsedChatCommand::Command(ChatCommand::Temperature("0.5".into()))
        );
        assert_eq!(
            parse_chat_command("/MODEL  llama2-13b "),
            ParsedChatCommand::Command(ChatCommand::Model(Some("llama2-13b".into())))
        );
        assert_eq!(
            parse_chat_command("/model"),
            ParsedChatCommand::Command(ChatCommand::Model(None))
        );
    }

    #[test]
    fn aliases_map_to_same_command() {
        assert_eq!(parse_chat_command("/q"), ParsedChatCommand::Command(ChatCommand::Exit));
        assert_eq!(
            parse_chat_command("/top-p 0.8"),
            ParsedChatCommand::Command(ChatCommand::TopP("0.8".into()))
        );
    }

    #[test]
    fn reports_missing_argument() {
        assert!(matches!(
            parse_chat_command("/top_p"),
            ParsedChatCommand::MissingArgument { .. }
        ));
    }

    #[test]
    fn reports_unknown_command() {
        assert_eq!(
            parse_chat_command("/diagnose me"),
            ParsedChatCommand::UnknownCommand("/diagnose".into())
        );
    }
}
