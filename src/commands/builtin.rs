//! Commands every agent answers out of the box.

use crate::commands::{CommandContext, RegistryBuilder};
use crate::models::task::Task;

/// Version of the agent core, reported alongside the operator's version.
pub const BASE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Add `hi`, `help`, and `echo` to `builder`.
#[must_use]
pub fn register(builder: RegistryBuilder) -> RegistryBuilder {
    builder
        .register("hi", hi)
        .register("help", help)
        .register("echo", echo)
}

/// Greet the sender and report version and uptime.
pub fn hi(task: &Task, ctx: &CommandContext<'_>) {
    let info = ctx.info();
    ctx.reply(format!(
        "Hi {}! Running agent v{BASE_VERSION}:{} since {:.2} seconds.",
        task.sender(),
        info.version(),
        info.uptime().as_secs_f64(),
    ));
}

/// List registered commands.
pub fn help(_task: &Task, ctx: &CommandContext<'_>) {
    let names: Vec<&str> = ctx.command_names().collect();
    ctx.reply(format!("Available commands: {}", names.join(", ")));
}

/// Repeat the arguments back, addressed to the sender.
pub fn echo(task: &Task, ctx: &CommandContext<'_>) {
    ctx.reply(format!("{}: {}", task.sender(), task.arguments()));
}
