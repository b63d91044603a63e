//! Inbound line parser.

use crate::models::task::Task;

/// Separator between the sender and the command text.
pub const SENDER_DELIMITER: &str = ": ";

/// Parse one inbound line into a [`Task`].
///
/// Leading and trailing newlines and spaces are trimmed first. The sender is
/// everything before the first `": "`; the command is the next token up to
/// the first space, and the arguments are the unparsed remainder.
///
/// Returns `None` for lines that are empty after trimming or carry no
/// `": "` delimiter. Such lines are not commands and are dropped silently.
///
/// # Examples
///
/// ```
/// use chat_agent::protocol::parser::parse_line;
///
/// let task = parse_line("bob: echo hello world").unwrap();
/// assert_eq!(task.sender(), "bob");
/// assert_eq!(task.command(), "echo");
/// assert_eq!(task.arguments(), "hello world");
///
/// assert!(parse_line("weird line without colon").is_none());
/// ```
#[must_use]
pub fn parse_line(raw: &str) -> Option<Task> {
    let line = raw.trim_matches(|c| c == '\n' || c == ' ');
    if line.is_empty() {
        return None;
    }

    let (sender, rest) = line.split_once(SENDER_DELIMITER)?;
    let (command, arguments) = rest.split_once(' ').unwrap_or((rest, ""));

    Some(Task::new(sender, command, arguments))
}
