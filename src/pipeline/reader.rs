//! Stream reader task.
//!
//! Frames the inbound half of the connection with [`LineCodec`], parses each
//! line with [`parse_line`], and forwards resulting [`Task`]s to the inbound
//! queue.
//!
//! Per-line problems (oversized, invalid UTF-8, transient read errors) are
//! logged and skipped. End-of-stream is the liveness signal: it stops the
//! whole run.

use futures_util::StreamExt;
use tokio::io::AsyncRead;
use tokio_util::codec::FramedRead;
use tracing::{debug, info, warn};

use crate::models::task::Task;
use crate::pipeline::{InboundTx, Lifecycle, StopReason};
use crate::protocol::codec::{InboundLine, LineCodec};
use crate::protocol::parser::parse_line;

/// Read lines until the stream closes or the run is stopped.
///
/// Always leaves `lifecycle` stopped on return (reason
/// [`StopReason::StreamClosed`] unless another reason was recorded first),
/// and hands the read half back so the caller can close it during teardown.
pub async fn run_reader<R>(
    reader: R,
    inbound: InboundTx,
    lifecycle: Lifecycle,
    max_line_bytes: usize,
) -> R
where
    R: AsyncRead + Unpin,
{
    info!("starting stream reader");
    let mut framed = FramedRead::new(reader, LineCodec::with_max_length(max_line_bytes));

    loop {
        tokio::select! {
            biased;

            () = lifecycle.stopped() => {
                debug!("stream reader: stop observed");
                break;
            }

            item = framed.next() => {
                match item {
                    None => {
                        info!("connection lost");
                        break;
                    }

                    Some(Err(err)) => {
                        warn!(error = %err, "stream reader: read failed, continuing");
                    }

                    Some(Ok(InboundLine::Text(line))) => {
                        let Some(task) = parse_line(&line) else {
                            continue;
                        };
                        if !enqueue(&inbound, task) {
                            break;
                        }
                    }

                    Some(Ok(discarded)) => {
                        warn!(
                            kind = discarded.kind(),
                            detail = ?discarded,
                            "stream reader: discarding malformed line"
                        );
                    }
                }
            }
        }
    }

    lifecycle.stop(StopReason::StreamClosed);
    info!("stopping stream reader");
    framed.into_inner()
}

fn enqueue(inbound: &InboundTx, task: Task) -> bool {
    debug!(
        sender = task.sender(),
        command = task.command(),
        "stream reader: task queued"
    );
    if inbound.send(task).is_err() {
        debug!("stream reader: inbound queue closed, stopping");
        return false;
    }
    true
}
