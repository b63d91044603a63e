//! Unit tests for the inbound line parser.

use chat_agent::protocol::parser::parse_line;

#[test]
fn command_with_arguments_splits_on_first_space() {
    let task = parse_line("bob: echo hello world").expect("valid command line");
    assert_eq!(task.sender(), "bob");
    assert_eq!(task.command(), "echo");
    assert_eq!(task.arguments(), "hello world");
}

#[test]
fn command_without_arguments_has_empty_arguments() {
    let task = parse_line("alice: hi").expect("valid command line");
    assert_eq!(task.sender(), "alice");
    assert_eq!(task.command(), "hi");
    assert_eq!(task.arguments(), "");
}

#[test]
fn arguments_are_never_reparsed() {
    let task = parse_line("carol: note a: b  c: d").expect("valid command line");
    assert_eq!(task.command(), "note");
    assert_eq!(
        task.arguments(),
        "a: b  c: d",
        "colons and repeated spaces in arguments must survive untouched"
    );
}

#[test]
fn line_without_delimiter_is_not_a_command() {
    assert!(parse_line("weird line without colon").is_none());
    assert!(parse_line("colon:without-space").is_none());
}

#[test]
fn blank_lines_are_not_commands() {
    assert!(parse_line("").is_none());
    assert!(parse_line("   ").is_none());
    assert!(parse_line("\n").is_none());
    assert!(parse_line(" \n \n").is_none());
}

/// `"carol: "` trims to `"carol:"`, which no longer holds the delimiter.
#[test]
fn trailing_space_after_sender_is_not_a_command() {
    assert!(parse_line("carol: ").is_none());
}

#[test]
fn trailing_spaces_are_trimmed_from_arguments() {
    let task = parse_line("dave: echo padded   ").expect("valid command line");
    assert_eq!(task.arguments(), "padded");
}

#[test]
fn sender_may_contain_spaces() {
    let task = parse_line("Big Server: help").expect("valid command line");
    assert_eq!(task.sender(), "Big Server");
    assert_eq!(task.command(), "help");
}

#[test]
fn command_matching_is_case_preserving() {
    let task = parse_line("erin: HI there").expect("valid command line");
    assert_eq!(task.command(), "HI");
}
