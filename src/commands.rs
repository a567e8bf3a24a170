use std::str::FromStr;

use strum::{AsRefStr, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// Commands that can be invoked by starting a line with a leading slash.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, EnumIter, AsRefStr, IntoStaticStr,
)]
#[strum(serialize_all = "kebab-case")]
pub enum SlashCommand {
    /// Start the conversation over
    Clear,
    /// List the suggested questions
    Questions,
    /// Ask a suggested question by number
    Ask,
    /// Print the conversation so far
    History,
    /// Save the transcript to a file
    Save,
    /// Show help
    Help,
    /// Exit the application
    Bye,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub command: SlashCommand,
    pub argument: Option<String>,
}

impl ParsedCommand {
    pub fn argument(&self) -> Option<&str> {
        self.argument.as_deref()
    }

    /// 1-based question number for `/ask`
    pub fn question_number(&self) -> Option<usize> {
        if self.command != SlashCommand::Ask {
            return None;
        }

        self.argument()?.trim().parse().ok()
    }
}

impl SlashCommand {
    /// User-visible description shown in help.
    pub fn description(self) -> &'static str {
        match self {
            SlashCommand::Clear => "clear the conversation and start over",
            SlashCommand::Questions => "list the suggested questions",
            SlashCommand::Ask => "ask a suggested question by number, e.g. /ask 2",
            SlashCommand::History => "show the conversation so far",
            SlashCommand::Save => "save the transcript (optionally to a given path)",
            SlashCommand::Help => "show available commands",
            SlashCommand::Bye => "exit the application",
        }
    }

    /// Command string without the leading '/'.
    pub fn command(self) -> &'static str {
        self.into()
    }
}

/// Return all built-in commands paired with their command string.
pub fn built_in_slash_commands() -> Vec<(&'static str, SlashCommand)> {
    SlashCommand::iter().map(|c| (c.command(), c)).collect()
}

/// Parse a slash command from user input
pub fn parse_slash_command(input: &str) -> Option<ParsedCommand> {
    let body = input.trim().strip_prefix('/')?;

    let mut parts = body.split_whitespace();
    let head = parts.next()?;
    let rest: Vec<&str> = parts.collect();

    let command = SlashCommand::from_str(head)
        .ok()
        .or_else(|| match head.to_lowercase().as_str() {
            "q" | "quit" | "exit" => Some(SlashCommand::Bye),
            "reset" => Some(SlashCommand::Clear),
            "suggest" | "suggested" => Some(SlashCommand::Questions),
            "h" | "?" => Some(SlashCommand::Help),
            _ => None,
        })?;

    let argument = if rest.is_empty() {
        None
    } else {
        Some(rest.join(" "))
    };

    Some(ParsedCommand { command, argument })
}

/// Get help text for all available commands
pub fn get_help_text() -> String {
    let mut help = String::from("Available commands:\n\n");
    for (command_str, command) in built_in_slash_commands() {
        help.push_str(&format!("/{} - {}\n", command_str, command.description()));
    }

    help.push_str(
        "\nAliases: /q, /quit, /exit for /bye; /reset for /clear; /suggest for /questions.",
    );
    help.push_str("\nAnything else you type is sent as a question.");

    help
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_not_a_command() {
        assert_eq!(parse_slash_command("What's your superpower?"), None);
        assert_eq!(parse_slash_command("/"), None);
    }

    #[test]
    fn parses_commands_and_aliases() {
        assert_eq!(
            parse_slash_command("/clear").map(|c| c.command),
            Some(SlashCommand::Clear)
        );
        assert_eq!(
            parse_slash_command("  /quit ").map(|c| c.command),
            Some(SlashCommand::Bye)
        );
        assert_eq!(
            parse_slash_command("/suggest").map(|c| c.command),
            Some(SlashCommand::Questions)
        );
        assert_eq!(parse_slash_command("/dance"), None);
    }

    #[test]
    fn ask_takes_a_question_number() {
        let parsed = parse_slash_command("/ask 3").unwrap();
        assert_eq!(parsed.question_number(), Some(3));

        assert_eq!(parse_slash_command("/ask").unwrap().question_number(), None);
        assert_eq!(parse_slash_command("/ask three").unwrap().question_number(), None);
        assert_eq!(parse_slash_command("/save 3").unwrap().question_number(), None);
    }

    #[test]
    fn save_keeps_path_argument() {
        let parsed = parse_slash_command("/save my chats/today.json").unwrap();
        assert_eq!(parsed.command, SlashCommand::Save);
        assert_eq!(parsed.argument(), Some("my chats/today.json"));
    }

    #[test]
    fn help_lists_every_command() {
        let help = get_help_text();
        for (keyword, _) in built_in_slash_commands() {
            assert!(help.contains(&format!("/{keyword} ")));
        }
    }
}
