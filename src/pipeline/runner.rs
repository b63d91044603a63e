//! Top-level run sequence: connect, start the loops, wait, tear down.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use tokio::io::AsyncWriteExt;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::commands::{AgentInfo, Registry};
use crate::config::GlobalConfig;
use crate::pipeline::dispatcher::Dispatcher;
use crate::pipeline::reader::run_reader;
use crate::pipeline::writer::run_writer;
use crate::pipeline::{inbound_queue, Lifecycle, Outbox, StopReason};
use crate::protocol::codec::DEFAULT_MAX_LINE_BYTES;
use crate::transport::{BoxReader, BoxWriter, Connection, ConnectionHandle, Connector};
use crate::Result;

/// Per-run settings that are not part of the connection.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Inbound lines longer than this are discarded.
    pub max_line_bytes: usize,
    /// Version and start time exposed to handlers.
    pub info: AgentInfo,
}

impl RunOptions {
    /// Options with the default line limit.
    #[must_use]
    pub fn new(info: AgentInfo) -> Self {
        Self {
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
            info,
        }
    }

    /// Options taken from the loaded configuration.
    #[must_use]
    pub fn from_config(config: &GlobalConfig, info: AgentInfo) -> Self {
        Self {
            max_line_bytes: config.pipeline.max_line_bytes,
            info,
        }
    }
}

/// Run one agent session to completion.
///
/// Opens the connection, spawns the stream reader and writer, and runs the
/// dispatcher on the current task until the run stops: the stream closes,
/// `interrupt` completes, or a handler panics. Teardown then closes the write
/// side, the read side, and finally the connection handle. It runs exactly
/// once on every path, including a failed setup and a handler panic.
///
/// Returns the reason the run stopped.
///
/// # Errors
///
/// Returns the connector's error if the connection cannot be established.
/// Failures after setup are logged and never surfaced.
pub async fn run<C, I>(
    connector: &C,
    registry: Registry,
    options: RunOptions,
    interrupt: I,
) -> Result<StopReason>
where
    C: Connector + ?Sized,
    I: Future<Output = ()>,
{
    let run_id = Uuid::new_v4();
    run_session(connector, registry, options, interrupt)
        .instrument(info_span!("agent_run", %run_id))
        .await
}

async fn run_session<C, I>(
    connector: &C,
    registry: Registry,
    options: RunOptions,
    interrupt: I,
) -> Result<StopReason>
where
    C: Connector + ?Sized,
    I: Future<Output = ()>,
{
    let lifecycle = Lifecycle::new();
    tokio::pin!(interrupt);
    info!(commands = ?registry, "connecting");

    let setup = tokio::select! {
        biased;

        result = connector.connect() => result,
        () = &mut interrupt => {
            warn!("interrupt received during connection setup");
            lifecycle.stop(StopReason::Interrupted);
            teardown(None, None, None).await;
            return Ok(StopReason::Interrupted);
        }
    };

    let connection = match setup {
        Ok(connection) => connection,
        Err(err) => {
            error!(%err, "connection setup failed");
            lifecycle.stop(StopReason::SetupFailed);
            teardown(None, None, None).await;
            return Err(err);
        }
    };
    let Connection {
        reader,
        writer,
        handle,
    } = connection;

    let (inbound_tx, inbound_rx) = inbound_queue();
    let (outbox, outbound_rx) = Outbox::channel();

    let reader_task = tokio::spawn(
        run_reader(reader, inbound_tx, lifecycle.clone(), options.max_line_bytes)
            .in_current_span(),
    );
    let writer_task =
        tokio::spawn(run_writer(writer, outbound_rx, lifecycle.clone()).in_current_span());

    let dispatcher = Dispatcher::new(Arc::new(registry), outbox, options.info);
    let dispatched = AssertUnwindSafe(dispatcher.run(inbound_rx, &lifecycle, interrupt))
        .catch_unwind()
        .await;
    if let Err(payload) = dispatched {
        error!(
            panic = panic_message(payload.as_ref()),
            "command handler panicked, stopping agent"
        );
        lifecycle.stop(StopReason::HandlerPanicked);
    }
    lifecycle.stop(StopReason::Requested);
    drop(dispatcher);

    let writer = join_loop(writer_task, "stream writer").await;
    let reader = join_loop(reader_task, "stream reader").await;
    teardown(writer, reader, Some(handle)).await;

    let reason = lifecycle.reason().unwrap_or(StopReason::Requested);
    info!(%reason, "agent run finished");
    Ok(reason)
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

async fn join_loop<T>(task: JoinHandle<T>, name: &'static str) -> Option<T> {
    match task.await {
        Ok(half) => Some(half),
        Err(err) => {
            error!(task = name, %err, "pipeline task failed");
            None
        }
    }
}

/// Close the write side, then the read side, then the connection.
async fn teardown(
    writer: Option<BoxWriter>,
    reader: Option<BoxReader>,
    handle: Option<Box<dyn ConnectionHandle>>,
) {
    info!("tearing down connection");

    if let Some(mut writer) = writer {
        match writer.shutdown().await {
            Ok(()) => debug!("write side closed"),
            Err(err) => warn!(%err, "failed to close write side"),
        }
    }

    if let Some(reader) = reader {
        drop(reader);
        debug!("read side closed");
    }

    if let Some(handle) = handle {
        if let Err(err) = handle.close().await {
            warn!(%err, "failed to close connection");
        }
    }

    info!("teardown complete");
}
