//! Shared plumbing between the controller and its strategies.
//!
//! Strategies never own the controller. They report through a
//! [`StrategySink`], which tags every event with the generation it was
//! created for so the controller can drop reports from a torn-down strategy.

use std::fmt;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::window::WindowBounds;

/// Which strategy is keeping the target on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Overlay,
    RaiseLoop,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::Overlay => write!(f, "overlay"),
            StrategyKind::RaiseLoop => write!(f, "raise-loop"),
        }
    }
}

/// New geometry read from the window after a move/resize notification.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowMove {
    pub bounds: WindowBounds,
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StrategyEvent {
    TargetLost { reason: String },
    TargetMoved(WindowMove),
    HoverTick,
    RaiseTick,
    AppActivated { pid: i32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyReport {
    pub generation: u64,
    pub event: StrategyEvent,
}

/// Non-owning sender back to the controller context.
#[derive(Debug, Clone)]
pub struct StrategySink {
    generation: u64,
    tx: mpsc::UnboundedSender<StrategyReport>,
}

impl StrategySink {
    pub fn new(generation: u64, tx: mpsc::UnboundedSender<StrategyReport>) -> Self {
        Self { generation, tx }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns false once the controller is gone.
    pub fn send(&self, event: StrategyEvent) -> bool {
        self.tx
            .send(StrategyReport {
                generation: self.generation,
                event,
            })
            .is_ok()
    }
}

/// Periodic event source. Stops on [`Ticker::stop`], on drop, or when the
/// controller hangs up.
#[derive(Debug)]
pub struct Ticker {
    token: CancellationToken,
}

impl Ticker {
    pub fn start(period: Duration, sink: StrategySink, event: StrategyEvent) -> Self {
        let token = CancellationToken::new();
        let cancelled = token.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancelled.cancelled() => break,
                    _ = tokio::time::sleep(period) => {
                        if cancelled.is_cancelled() || !sink.send(event.clone()) {
                            break;
                        }
                    }
                }
            }
        });

        Self { token }
    }

    pub fn stop(&self) {
        self.token.cancel();
    }

    pub fn is_running(&self) -> bool {
        !self.token.is_cancelled()
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
