use std::str::FromStr;

use strum::{EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// Commands that can be invoked by sending exactly `/<keyword>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "kebab-case")]
pub enum SlashCommand {
    /// Start over with a fresh greeting
    Clear,
    /// Open the API key settings
    Settings,
    /// Show help
    Help,
    /// Exit the application
    Quit,
}

pub fn command_entries() -> Vec<CommandEntry> {
    SlashCommand::iter()
        .map(|command| CommandEntry {
            keyword: command.command(),
            description: command.description(),
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandEntry {
    pub keyword: &'static str,
    pub description: &'static str,
}

impl SlashCommand {
    /// User-visible description shown in help.
    pub fn description(self) -> &'static str {
        match self {
            SlashCommand::Clear => "clear the conversation",
            SlashCommand::Settings => "set the API key",
            SlashCommand::Help => "show available commands and keys",
            SlashCommand::Quit => "exit the application",
        }
    }

    /// Command string without the leading '/'.
    pub fn command(self) -> &'static str {
        self.into()
    }
}

/// Parse a slash command from user input.
///
/// Only a lone `/<keyword>` counts; anything with more text is a prompt.
pub fn parse_slash_command(input: &str) -> Option<SlashCommand> {
    let keyword = input.trim().strip_prefix('/')?;
    if keyword.is_empty() || keyword.contains(char::is_whitespace) {
        return None;
    }

    SlashCommand::from_str(&keyword.to_lowercase()).ok()
}

/// Get help text for all available commands
pub fn get_help_text() -> String {
    let mut help = String::from("Available commands:\n");
    for entry in command_entries() {
        help.push_str(&format!("/{} - {}\n", entry.keyword, entry.description));
    }

    help.push_str("\nKeys: Enter sends, Shift+Enter (or Alt+Enter) adds a new line, ");
    help.push_str("Ctrl+L clears, Ctrl+S opens settings, PageUp/PageDown scroll, Esc dismisses errors, Ctrl+C quits.");

    help
}
