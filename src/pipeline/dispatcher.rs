//! Command dispatcher (worker loop).

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::commands::{AgentInfo, CommandContext, Registry};
use crate::models::task::Task;
use crate::pipeline::{InboundRx, Lifecycle, Outbox, StopReason};

/// Routes parsed tasks to their registered handlers.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<Registry>,
    outbox: Outbox,
    info: AgentInfo,
}

impl Dispatcher {
    /// Create a dispatcher replying through `outbox`.
    #[must_use]
    pub fn new(registry: Arc<Registry>, outbox: Outbox, info: AgentInfo) -> Self {
        Self {
            registry,
            outbox,
            info,
        }
    }

    /// Invoke the handler registered for `task`, if any.
    ///
    /// Returns whether a handler ran. Unknown commands are ignored without
    /// any reply to the sender.
    pub fn dispatch(&self, task: &Task) -> bool {
        let Some(handler) = self.registry.get(task.command()) else {
            debug!(
                sender = task.sender(),
                command = task.command(),
                "dispatcher: ignoring unknown command"
            );
            return false;
        };

        debug!(
            sender = task.sender(),
            command = task.command(),
            "dispatcher: invoking handler"
        );
        let ctx = CommandContext::new(&self.outbox, &self.registry, &self.info);
        handler.handle(task, &ctx);
        true
    }

    /// Pop and dispatch tasks in FIFO order until the run stops.
    ///
    /// Completion of `interrupt` stops the run with
    /// [`StopReason::Interrupted`] and returns immediately. The loop also
    /// exits when the inbound queue closes, which happens once the reader has
    /// stopped.
    pub async fn run<I>(&self, mut inbound: InboundRx, lifecycle: &Lifecycle, interrupt: I)
    where
        I: Future<Output = ()>,
    {
        info!("starting dispatcher");
        tokio::pin!(interrupt);

        loop {
            tokio::select! {
                biased;

                () = lifecycle.stopped() => {
                    debug!("dispatcher: stop observed");
                    break;
                }

                () = &mut interrupt => {
                    warn!("interrupt received, stopping agent");
                    lifecycle.stop(StopReason::Interrupted);
                    break;
                }

                task = inbound.recv() => {
                    let Some(task) = task else {
                        debug!("dispatcher: inbound queue closed");
                        break;
                    };
                    self.dispatch(&task);
                }
            }
        }

        info!("stopping dispatcher");
    }
}
