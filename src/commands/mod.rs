//! Command registry and handler abstraction.
//!
//! A [`Registry`] maps command names to [`Handler`]s. It is assembled with a
//! [`RegistryBuilder`] before the pipeline starts and is immutable afterwards,
//! so the dispatcher can share it without locking.
//!
//! Handlers never return replies directly; they push lines through
//! [`CommandContext::reply`], which feeds the outbound queue.

pub mod builtin;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::models::task::Task;
use crate::pipeline::Outbox;

/// Static facts about the running agent, available to every handler.
#[derive(Debug, Clone)]
pub struct AgentInfo {
    version: String,
    started_at: Instant,
}

impl AgentInfo {
    /// Record the agent version and mark the start time as now.
    #[must_use]
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            started_at: Instant::now(),
        }
    }

    /// Operator-supplied agent version.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Time elapsed since the agent started.
    #[must_use]
    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }
}

/// Everything a handler may touch while processing one task.
pub struct CommandContext<'a> {
    outbox: &'a Outbox,
    registry: &'a Registry,
    info: &'a AgentInfo,
}

impl<'a> CommandContext<'a> {
    /// Bundle the dispatcher's collaborators for one handler invocation.
    #[must_use]
    pub fn new(outbox: &'a Outbox, registry: &'a Registry, info: &'a AgentInfo) -> Self {
        Self {
            outbox,
            registry,
            info,
        }
    }

    /// Queue a reply line for the stream writer.
    pub fn reply(&self, line: impl Into<String>) {
        self.outbox.push(line);
    }

    /// Registered command names in sorted order.
    pub fn command_names(&self) -> impl Iterator<Item = &'a str> {
        self.registry.names()
    }

    /// Agent version and uptime.
    #[must_use]
    pub fn info(&self) -> &'a AgentInfo {
        self.info
    }
}

/// A unit of behavior bound to one command name.
///
/// Handlers run inline on the dispatcher, one task at a time. A slow handler
/// delays later tasks but never the stream reader or writer.
///
/// Any `Fn(&Task, &CommandContext<'_>)` closure or function is a handler.
pub trait Handler: Send + Sync {
    /// Process `task`, replying through `ctx` as needed.
    fn handle(&self, task: &Task, ctx: &CommandContext<'_>);
}

impl<F> Handler for F
where
    F: Fn(&Task, &CommandContext<'_>) + Send + Sync,
{
    fn handle(&self, task: &Task, ctx: &CommandContext<'_>) {
        self(task, ctx);
    }
}

/// Immutable command name → handler table.
#[derive(Clone, Default)]
pub struct Registry {
    handlers: BTreeMap<String, Arc<dyn Handler>>,
}

impl Registry {
    /// Start building a registry.
    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Look up the handler for `command` (case-sensitive).
    #[must_use]
    pub fn get(&self, command: &str) -> Option<&Arc<dyn Handler>> {
        self.handlers.get(command)
    }

    /// Whether a handler is registered for `command`.
    #[must_use]
    pub fn contains(&self, command: &str) -> bool {
        self.handlers.contains_key(command)
    }

    /// Registered command names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    /// Number of registered commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether no commands are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

/// Mutable staging area for a [`Registry`].
#[derive(Default)]
pub struct RegistryBuilder {
    handlers: BTreeMap<String, Arc<dyn Handler>>,
}

impl RegistryBuilder {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `handler` to `name`, replacing any earlier binding.
    ///
    /// Names that are empty or contain a space can never match a parsed
    /// command token; they are rejected with a warning.
    #[must_use]
    pub fn register(mut self, name: impl Into<String>, handler: impl Handler + 'static) -> Self {
        let name = name.into();
        if name.is_empty() || name.contains(' ') {
            warn!(command = %name, "ignoring unreachable command name");
            return self;
        }

        if self.handlers.insert(name.clone(), Arc::new(handler)).is_some() {
            debug!(command = %name, "command handler replaced");
        }
        self
    }

    /// Freeze the table.
    #[must_use]
    pub fn build(self) -> Registry {
        Registry {
            handlers: self.handlers,
        }
    }
}
