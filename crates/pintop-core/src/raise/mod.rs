//! Raise-Loop Fallback: keeps the target in front by raising it on a timer.
//!
//! Used when screen capture is not available. Each raise revalidates the
//! window handle first; a stale handle is the only target-loss signal in
//! this mode.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::platform::{Platform, Subscription};
use crate::strategy::{StrategyEvent, StrategySink, Ticker, WindowMove};
use crate::tracker::PositionTracker;
use crate::window::TargetWindowRef;

#[derive(Debug, Clone, Copy)]
pub struct RaiseOptions {
    pub interval: Duration,
    pub focus_steal: bool,
    pub debounce: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaiseOutcome {
    Raised,
    TargetLost,
}

pub struct RaiseLoop {
    platform: Platform,
    target: TargetWindowRef,
    options: RaiseOptions,
    sink: StrategySink,
    ticker: Option<Ticker>,
    activations: Option<Box<dyn Subscription>>,
    tracker: PositionTracker,
    debounce_until: Option<Instant>,
    running: bool,
}

impl RaiseLoop {
    pub fn new(
        platform: Platform,
        target: TargetWindowRef,
        options: RaiseOptions,
        sink: StrategySink,
    ) -> Self {
        Self {
            platform,
            target,
            options,
            sink,
            ticker: None,
            activations: None,
            tracker: PositionTracker::idle(),
            debounce_until: None,
            running: false,
        }
    }

    pub fn target(&self) -> &TargetWindowRef {
        &self.target
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_debouncing(&self) -> bool {
        self.debounce_until
            .is_some_and(|until| Instant::now() < until)
    }

    /// Raise once, then start listening and ticking. Returns `TargetLost`
    /// (with nothing left running) when the first raise finds the window gone.
    pub fn start(&mut self) -> RaiseOutcome {
        self.running = true;
        if self.raise() == RaiseOutcome::TargetLost {
            self.stop();
            return RaiseOutcome::TargetLost;
        }

        if self.options.focus_steal {
            let sink = self.sink.clone();
            let on_activated = Box::new(move |pid: i32| {
                sink.send(StrategyEvent::AppActivated { pid });
            });
            match self.platform.workspace.subscribe_activations(on_activated) {
                Ok(subscription) => self.activations = Some(subscription),
                Err(e) => warn!(
                    event = "core.raise.activation_subscribe_failed",
                    error = %e,
                    "Raise loop will not react to app switches"
                ),
            }
        }

        self.tracker = PositionTracker::start(
            self.platform.geometry.as_ref(),
            &self.target,
            self.sink.clone(),
        );
        self.ticker = Some(Ticker::start(
            self.options.interval,
            self.sink.clone(),
            StrategyEvent::RaiseTick,
        ));

        info!(
            event = "core.raise.started",
            pid = self.target.pid,
            interval_ms = self.options.interval.as_millis() as u64,
            focus_steal = self.options.focus_steal
        );
        RaiseOutcome::Raised
    }

    pub fn handle_tick(&mut self) -> RaiseOutcome {
        if !self.running {
            return RaiseOutcome::Raised;
        }
        self.raise_or_stop()
    }

    /// React to another app coming to the front.
    pub fn handle_app_activated(&mut self, pid: i32) -> RaiseOutcome {
        if !self.running || !self.options.focus_steal {
            return RaiseOutcome::Raised;
        }
        if pid == self.target.pid || pid == self.platform.workspace.own_pid() {
            return RaiseOutcome::Raised;
        }
        if self.is_debouncing() {
            debug!(event = "core.raise.activation_debounced", pid = pid);
            return RaiseOutcome::Raised;
        }
        self.raise_or_stop()
    }

    pub fn handle_moved(&mut self, moved: &WindowMove) {
        self.target.bounds = moved.bounds;
        if let Some(title) = &moved.title {
            self.target.title = title.clone();
        }
    }

    /// Cancel the timer, unsubscribe and clear the debounce. Idempotent.
    pub fn stop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.stop();
        }
        if let Some(mut subscription) = self.activations.take() {
            subscription.cancel();
        }
        self.tracker.stop();
        self.debounce_until = None;

        if self.running {
            self.running = false;
            info!(event = "core.raise.stopped", pid = self.target.pid);
        }
    }

    fn raise_or_stop(&mut self) -> RaiseOutcome {
        let outcome = self.raise();
        if outcome == RaiseOutcome::TargetLost {
            self.stop();
        }
        outcome
    }

    fn raise(&mut self) -> RaiseOutcome {
        if !self.target.handle.is_valid() {
            warn!(event = "core.raise.target_invalid", pid = self.target.pid);
            return RaiseOutcome::TargetLost;
        }

        if !self.target.handle.raise() {
            debug!(event = "core.raise.rejected", pid = self.target.pid);
        }

        if self.options.focus_steal {
            self.platform.workspace.activate(self.target.pid);
            self.debounce_until = Some(Instant::now() + self.options.debounce);
        }

        RaiseOutcome::Raised
    }
}

impl Drop for RaiseLoop {
    fn drop(&mut self) {
        self.stop();
    }
}
