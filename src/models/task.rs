//! Parsed inbound command model.

/// One command received from the chat server.
///
/// Produced by the stream reader for every line of the form
/// `<sender>: <command>[ <arguments>]` and consumed exactly once by the
/// dispatcher. Fields are private so a task cannot change after parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    sender: String,
    command: String,
    arguments: String,
}

impl Task {
    /// Construct a task from its three parsed parts.
    #[must_use]
    pub fn new(
        sender: impl Into<String>,
        command: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            sender: sender.into(),
            command: command.into(),
            arguments: arguments.into(),
        }
    }

    /// Identifier of the user who sent the command.
    #[must_use]
    pub fn sender(&self) -> &str {
        &self.sender
    }

    /// Command name, matched case-sensitively against the registry.
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Raw remainder of the line after the command token; may be empty.
    #[must_use]
    pub fn arguments(&self) -> &str {
        &self.arguments
    }
}
