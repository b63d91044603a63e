//! Stream writer task.
//!
//! Drains the outbound queue and writes each entry as one `\n`-terminated
//! line through [`LineCodec`], flushing after every line.
//!
//! The writer never stops the run by itself. Lines still queued when the run
//! stops are dropped.

use futures_util::SinkExt;
use tokio::io::AsyncWrite;
use tokio::sync::mpsc;
use tokio_util::codec::FramedWrite;
use tracing::{debug, info, warn};

use crate::pipeline::Lifecycle;
use crate::protocol::codec::LineCodec;

/// Write queued lines until the run is stopped or every producer is gone.
///
/// Hands the write half back so the caller can shut it down during teardown.
pub async fn run_writer<W>(
    writer: W,
    mut outbound: mpsc::UnboundedReceiver<String>,
    lifecycle: Lifecycle,
) -> W
where
    W: AsyncWrite + Unpin,
{
    info!("starting stream writer");
    let mut framed = FramedWrite::new(writer, LineCodec::new());

    loop {
        tokio::select! {
            biased;

            () = lifecycle.stopped() => {
                debug!("stream writer: stop observed");
                break;
            }

            line = outbound.recv() => {
                let Some(line) = line else {
                    debug!("stream writer: outbound queue closed, stopping");
                    break;
                };

                // `send` flushes once the frame is encoded. A peer that stops
                // reading must not pin the writer past shutdown.
                tokio::select! {
                    biased;

                    () = lifecycle.stopped() => {
                        debug!("stream writer: stop observed mid-write");
                        break;
                    }

                    result = framed.send(line) => {
                        if let Err(err) = result {
                            warn!(error = %err, "stream writer: write failed");
                        }
                    }
                }
            }
        }
    }

    info!("stopping stream writer");
    framed.into_inner()
}
