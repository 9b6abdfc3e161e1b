use tokio::sync::{mpsc, oneshot};

use super::errors::ControllerError;
use super::state::PinState;
use crate::strategy::StrategyKind;
use crate::window::TargetWindowRef;

/// Receives every state transition, in order, on the controller task.
/// Must not block.
pub type StateObserver = Box<dyn Fn(&PinState) + Send + Sync>;

pub(crate) enum Command {
    Pin {
        target: TargetWindowRef,
        reply: oneshot::Sender<()>,
    },
    Unpin {
        reply: oneshot::Sender<()>,
    },
    TogglePin {
        target: Option<TargetWindowRef>,
        reply: oneshot::Sender<()>,
    },
    AddObserver {
        observer: StateObserver,
        reply: oneshot::Sender<()>,
    },
    State {
        reply: oneshot::Sender<PinState>,
    },
    ActiveStrategy {
        reply: oneshot::Sender<Option<StrategyKind>>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Cloneable handle to a running controller. Each call returns once the
/// controller has processed it.
#[derive(Clone)]
pub struct PinHandle {
    tx: mpsc::UnboundedSender<Command>,
}

impl PinHandle {
    pub(crate) fn new(tx: mpsc::UnboundedSender<Command>) -> Self {
        Self { tx }
    }

    /// Pin `target`, replacing whatever is pinned. The overlay/raise-loop
    /// decision continues in the background.
    pub async fn pin(&self, target: TargetWindowRef) -> Result<(), ControllerError> {
        self.request(|reply| Command::Pin { target, reply }).await
    }

    /// Stop the active strategy. Safe when idle.
    pub async fn unpin(&self) -> Result<(), ControllerError> {
        self.request(|reply| Command::Unpin { reply }).await
    }

    /// Unpin when pinning, otherwise pin `target` or the last pinned window.
    pub async fn toggle_pin(&self, target: Option<TargetWindowRef>) -> Result<(), ControllerError> {
        self.request(|reply| Command::TogglePin { target, reply })
            .await
    }

    pub async fn add_state_observer(&self, observer: StateObserver) -> Result<(), ControllerError> {
        self.request(|reply| Command::AddObserver { observer, reply })
            .await
    }

    pub async fn state(&self) -> Result<PinState, ControllerError> {
        self.request(|reply| Command::State { reply }).await
    }

    pub async fn active_strategy(&self) -> Result<Option<StrategyKind>, ControllerError> {
        self.request(|reply| Command::ActiveStrategy { reply }).await
    }

    /// Unpin and stop the controller task.
    pub async fn shutdown(&self) -> Result<(), ControllerError> {
        self.request(|reply| Command::Shutdown { reply }).await
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, ControllerError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(command(reply))
            .map_err(|_| ControllerError::Stopped)?;
        rx.await.map_err(|_| ControllerError::Stopped)
    }
}
