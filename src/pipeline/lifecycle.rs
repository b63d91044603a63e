//! Shared stop signal for one agent run.

use std::fmt::{Display, Formatter};
use std::sync::{Arc, OnceLock};

use tokio_util::sync::CancellationToken;

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The remote end closed the stream.
    StreamClosed,
    /// The operator interrupted the agent.
    Interrupted,
    /// The connection could not be established.
    SetupFailed,
    /// A command handler panicked.
    HandlerPanicked,
    /// Stopped programmatically through [`Lifecycle::stop`].
    Requested,
}

impl Display for StopReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::StreamClosed => "stream closed",
            Self::Interrupted => "interrupted",
            Self::SetupFailed => "setup failed",
            Self::HandlerPanicked => "handler panicked",
            Self::Requested => "requested",
        };
        f.write_str(label)
    }
}

/// Observable state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Loops are admitting work.
    Running,
    /// Terminal; loops finish their current iteration and exit.
    Stopped,
}

/// Cloneable handle on the run's stop signal.
///
/// Stopping is one-way: the first [`stop`](Self::stop) records its reason,
/// later calls are no-ops apart from returning `false`.
#[derive(Debug, Clone, Default)]
pub struct Lifecycle {
    token: CancellationToken,
    reason: Arc<OnceLock<StopReason>>,
}

impl Lifecycle {
    /// Create a running lifecycle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Transition to [`LifecycleState::Stopped`].
    ///
    /// Returns `true` if this call performed the transition.
    pub fn stop(&self, reason: StopReason) -> bool {
        let first = self.reason.set(reason).is_ok();
        self.token.cancel();
        first
    }

    /// Whether the run has been stopped.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> LifecycleState {
        if self.is_stopped() {
            LifecycleState::Stopped
        } else {
            LifecycleState::Running
        }
    }

    /// Reason recorded by the first stop, if any.
    #[must_use]
    pub fn reason(&self) -> Option<StopReason> {
        self.reason.get().copied()
    }

    /// Resolve once the run is stopped.
    pub async fn stopped(&self) {
        self.token.cancelled().await;
    }
}
