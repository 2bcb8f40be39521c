use std::str::FromStr;

use strum::{AsRefStr, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// Commands that can be invoked by starting a message with a leading slash.
/// They are handled locally and never sent to the service.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, EnumIter, AsRefStr, IntoStaticStr,
)]
#[strum(serialize_all = "kebab-case")]
pub enum SlashCommand {
    /// Hide the chat panel
    Close,
    /// Exit the application
    Bye,
    /// Show help
    Help,
}

pub fn command_entries() -> Vec<CommandEntry> {
    SlashCommand::iter()
        .map(|command| CommandEntry {
            command,
            keyword: command.command(),
            description: command.description(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub command: SlashCommand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandEntry {
    pub command: SlashCommand,
    pub keyword: &'static str,
    pub description: &'static str,
}

impl SlashCommand {
    /// User-visible description shown in help.
    pub fn description(self) -> &'static str {
        match self {
            SlashCommand::Close => "hide the chat panel (answers keep arriving)",
            SlashCommand::Bye => "exit the application",
            SlashCommand::Help => "show available commands",
        }
    }

    /// Command string without the leading '/'.
    pub fn command(self) -> &'static str {
        self.into()
    }
}

/// Parse a slash command from user input.
///
/// Unknown commands return `None` so the text is submitted as a question.
pub fn parse_slash_command(input: &str) -> Option<ParsedCommand> {
    let rest = input.trim().strip_prefix('/')?;

    let head = rest.split_whitespace().next()?;

    let command = SlashCommand::from_str(head)
        .ok()
        .or_else(|| match head.to_lowercase().as_str() {
            "q" | "quit" | "exit" => Some(SlashCommand::Bye),
            "hide" => Some(SlashCommand::Close),
            "h" | "?" => Some(SlashCommand::Help),
            _ => None,
        })?;

    Some(ParsedCommand { command })
}

/// Get help text for all available commands
pub fn get_help_text() -> String {
    let mut help = String::from("Commands: ");
    let entries: Vec<String> = SlashCommand::iter()
        .map(|command| format!("/{} {}", command.command(), command.description()))
        .collect();
    help.push_str(&entries.join(" · "));
    help.push_str(" · Ctrl+O toggles the panel, Ctrl+C quits");
    help
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_commands_and_aliases() {
        assert_eq!(parse_slash_command("/help").map(|c| c.command), Some(SlashCommand::Help));
        assert_eq!(parse_slash_command(" /close ").map(|c| c.command), Some(SlashCommand::Close));
        assert_eq!(parse_slash_command("/q").map(|c| c.command), Some(SlashCommand::Bye));
        assert_eq!(parse_slash_command("/EXIT").map(|c| c.command), Some(SlashCommand::Bye));
    }

    #[test]
    fn trailing_words_are_ignored() {
        let parsed = parse_slash_command("/help me please").unwrap();
        assert_eq!(parsed.command, SlashCommand::Help);
    }

    #[test]
    fn plain_text_and_unknown_commands_are_questions() {
        assert_eq!(parse_slash_command("what is /tf?"), None);
        assert_eq!(parse_slash_command("/opt/ros/humble is missing"), None);
        assert_eq!(parse_slash_command("/"), None);
    }

    #[test]
    fn entries_cover_every_command() {
        let keywords: Vec<&str> = command_entries().iter().map(|e| e.keyword).collect();
        assert_eq!(keywords, vec!["close", "bye", "help"]);
        assert!(get_help_text().contains("/bye exit the application"));
    }
}
