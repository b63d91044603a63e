//! Unit tests for the command registry and its builder.

use std::sync::{Arc, Mutex};

use chat_agent::commands::{AgentInfo, CommandContext, Registry, RegistryBuilder};
use chat_agent::models::task::Task;
use chat_agent::pipeline::Outbox;

fn reply_with(text: &'static str) -> impl Fn(&Task, &CommandContext<'_>) + Send + Sync {
    move |_task: &Task, ctx: &CommandContext<'_>| ctx.reply(text)
}

fn invoke(registry: &Registry, task: &Task) -> Vec<String> {
    let (outbox, mut rx) = Outbox::channel();
    let info = AgentInfo::new("test");
    let ctx = CommandContext::new(&outbox, registry, &info);
    registry
        .get(task.command())
        .expect("handler registered")
        .handle(task, &ctx);

    let mut lines = Vec::new();
    while let Ok(line) = rx.try_recv() {
        lines.push(line);
    }
    lines
}

#[test]
fn empty_builder_yields_empty_registry() {
    let registry = RegistryBuilder::new().build();
    assert!(registry.is_empty());
    assert_eq!(registry.len(), 0);
    assert!(registry.get("hi").is_none());
}

#[test]
fn registered_handler_is_found_by_exact_name() {
    let registry = Registry::builder()
        .register("hi", reply_with("Hi alice!"))
        .build();

    assert!(registry.contains("hi"));
    assert!(!registry.contains("Hi"), "lookup must be case-sensitive");
    assert!(!registry.contains("hi "));

    let lines = invoke(&registry, &Task::new("alice", "hi", ""));
    assert_eq!(lines, vec!["Hi alice!".to_owned()]);
}

#[test]
fn last_registration_wins() {
    let registry = Registry::builder()
        .register("greet", reply_with("first"))
        .register("greet", reply_with("second"))
        .build();

    assert_eq!(registry.len(), 1);
    let lines = invoke(&registry, &Task::new("bob", "greet", ""));
    assert_eq!(lines, vec!["second".to_owned()]);
}

#[test]
fn unreachable_names_are_rejected() {
    let registry = Registry::builder()
        .register("", reply_with("empty"))
        .register("two words", reply_with("spaced"))
        .build();

    assert!(registry.is_empty());
    assert!(!registry.contains(""));
}

#[test]
fn names_are_listed_in_sorted_order() {
    let registry = Registry::builder()
        .register("zeta", reply_with("z"))
        .register("alpha", reply_with("a"))
        .register("mid", reply_with("m"))
        .build();

    let names: Vec<&str> = registry.names().collect();
    assert_eq!(names, vec!["alpha", "mid", "zeta"]);
    assert_eq!(format!("{registry:?}"), r#"{"alpha", "mid", "zeta"}"#);
}

#[test]
fn closures_may_capture_shared_state() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let registry = Registry::builder()
        .register("note", move |task: &Task, _ctx: &CommandContext<'_>| {
            sink.lock().unwrap().push(task.arguments().to_owned());
        })
        .build();

    let lines = invoke(&registry, &Task::new("carol", "note", "remember this"));
    assert!(lines.is_empty(), "handler replied unexpectedly: {lines:?}");
    assert_eq!(*seen.lock().unwrap(), vec!["remember this".to_owned()]);
}

#[test]
fn cloned_registry_shares_handlers() {
    let registry = Registry::builder().register("hi", reply_with("hey")).build();
    let clone = registry.clone();

    let lines = invoke(&clone, &Task::new("dave", "hi", ""));
    assert_eq!(lines, vec!["hey".to_owned()]);
}
