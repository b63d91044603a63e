//! Integration tests for the stream reader task over in-memory pipes.

use tokio::io::AsyncWriteExt;

use chat_agent::models::task::Task;
use chat_agent::pipeline::reader::run_reader;
use chat_agent::pipeline::{inbound_queue, Lifecycle, StopReason};

use super::test_helpers::TEST_TIMEOUT;

fn drain(rx: &mut chat_agent::pipeline::InboundRx) -> Vec<Task> {
    let mut tasks = Vec::new();
    while let Ok(task) = rx.try_recv() {
        tasks.push(task);
    }
    tasks
}

/// Well-formed lines become tasks in arrival order; everything else is
/// dropped without stopping the reader.
#[tokio::test]
async fn parses_valid_lines_and_skips_malformed_ones() {
    let (agent_in, mut remote) = tokio::io::duplex(4096);
    let (tx, mut rx) = inbound_queue();
    let lifecycle = Lifecycle::new();

    let reader = tokio::spawn(run_reader(agent_in, tx, lifecycle.clone(), 64));

    remote.write_all(b"alice: hi\n").await.expect("write");
    remote.write_all(b"weird line without colon\n").await.expect("write");
    remote.write_all(b"\n   \n").await.expect("write");
    remote.write_all(b"x: \xff\xfe\n").await.expect("write");
    remote
        .write_all(format!("long: {}\n", "y".repeat(200)).as_bytes())
        .await
        .expect("write");
    remote
        .write_all(b"bob: echo hello world\n")
        .await
        .expect("write");
    remote.write_all(b"carol: \n").await.expect("write");
    remote.write_all(b"dave: help").await.expect("write");
    drop(remote);

    tokio::time::timeout(TEST_TIMEOUT, reader)
        .await
        .expect("reader stops at EOF")
        .expect("reader task");

    let tasks = drain(&mut rx);
    assert_eq!(
        tasks,
        vec![
            Task::new("alice", "hi", ""),
            Task::new("bob", "echo", "hello world"),
        ],
        "the unterminated final line must be discarded"
    );
}

#[tokio::test]
async fn stream_close_stops_the_run() {
    let (agent_in, remote) = tokio::io::duplex(64);
    let (tx, _rx) = inbound_queue();
    let lifecycle = Lifecycle::new();

    let reader = tokio::spawn(run_reader(agent_in, tx, lifecycle.clone(), 1024));
    drop(remote);

    tokio::time::timeout(TEST_TIMEOUT, reader)
        .await
        .expect("reader stops at EOF")
        .expect("reader task");
    assert_eq!(lifecycle.reason(), Some(StopReason::StreamClosed));
}

/// A reader blocked on an idle stream still observes a stop.
#[tokio::test]
async fn idle_reader_observes_stop() {
    let (agent_in, _remote) = tokio::io::duplex(64);
    let (tx, _rx) = inbound_queue();
    let lifecycle = Lifecycle::new();

    let reader = tokio::spawn(run_reader(agent_in, tx, lifecycle.clone(), 1024));
    tokio::task::yield_now().await;
    lifecycle.stop(StopReason::Interrupted);

    tokio::time::timeout(TEST_TIMEOUT, reader)
        .await
        .expect("reader observes stop")
        .expect("reader task");
    assert_eq!(
        lifecycle.reason(),
        Some(StopReason::Interrupted),
        "the reader must not overwrite an earlier reason"
    );
}

#[tokio::test]
async fn closed_inbound_queue_stops_reader() {
    let (agent_in, mut remote) = tokio::io::duplex(64);
    let (tx, rx) = inbound_queue();
    drop(rx);
    let lifecycle = Lifecycle::new();

    let reader = tokio::spawn(run_reader(agent_in, tx, lifecycle.clone(), 1024));
    remote.write_all(b"alice: hi\n").await.expect("write");

    tokio::time::timeout(TEST_TIMEOUT, reader)
        .await
        .expect("reader stops")
        .expect("reader task");
    assert!(lifecycle.is_stopped());
}
