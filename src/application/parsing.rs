//! # Parsing Utils
//!
//! Turns the raw text of a chat message into a command: finds the mention of
//! the bot, then splits what follows with shell quoting rules so arguments
//! containing spaces can be quoted.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub name: String,
    pub args: Vec<String>,
}

/// Text after the first mention of the bot, trimmed and lower-cased.
///
/// Returns `None` when the message does not mention the bot.
pub fn extract_mention(text: &str, marker: &str) -> Option<String> {
    if marker.is_empty() {
        return None;
    }
    text.split_once(marker)
        .map(|(_, rest)| rest.trim().to_lowercase())
}

/// Shell-style word splitting.
pub fn split_words(text: &str) -> Result<Vec<String>, shell_words::ParseError> {
    shell_words::split(text)
}

/// First word is the command name, the rest are its arguments.
///
/// `Ok(None)` means there was nothing to run (empty or blank text).
pub fn tokenize(text: &str) -> Result<Option<ParsedCommand>, shell_words::ParseError> {
    let mut words = split_words(text)?.into_iter();
    Ok(words.next().map(|name| ParsedCommand {
        name,
        args: words.collect(),
    }))
}
