use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::decision::{
    Decision, DecisionContext, FallbackReason, GenerationToken, Mode, decide, overlay_options,
    start_overlay,
};
use super::handle::{Command, PinHandle, StateObserver};
use super::state::{PinState, TARGET_LOST_MESSAGE};
use crate::capture::LocatedWindow;
use crate::config::PintopConfig;
use crate::identity::PinnedIdentity;
use crate::overlay::OverlaySurface;
use crate::platform::Platform;
use crate::raise::{RaiseLoop, RaiseOptions, RaiseOutcome};
use crate::settings::SettingsStore;
use crate::strategy::{StrategyEvent, StrategyKind, StrategyReport, StrategySink, WindowMove};
use crate::window::TargetWindowRef;

enum ActiveStrategy {
    Overlay(Box<OverlaySurface>),
    RaiseLoop(RaiseLoop),
}

impl ActiveStrategy {
    fn kind(&self) -> StrategyKind {
        match self {
            ActiveStrategy::Overlay(_) => StrategyKind::Overlay,
            ActiveStrategy::RaiseLoop(_) => StrategyKind::RaiseLoop,
        }
    }

    fn stop(&mut self) {
        match self {
            ActiveStrategy::Overlay(overlay) => overlay.stop_capture(),
            ActiveStrategy::RaiseLoop(raise_loop) => raise_loop.stop(),
        }
    }

    fn handle_moved(&mut self, moved: &WindowMove) {
        match self {
            ActiveStrategy::Overlay(overlay) => overlay.handle_moved(moved),
            ActiveStrategy::RaiseLoop(raise_loop) => raise_loop.handle_moved(moved),
        }
    }
}

pub struct PinController {
    platform: Platform,
    settings: Arc<SettingsStore>,
    config: PintopConfig,
    state: PinState,
    strategy: Option<ActiveStrategy>,
    last_target: Option<TargetWindowRef>,
    observers: Vec<StateObserver>,
    generation: Arc<AtomicU64>,
    report_tx: mpsc::UnboundedSender<StrategyReport>,
    decision_tx: mpsc::UnboundedSender<Decision>,
}

impl PinController {
    /// Start the controller task on the current tokio runtime.
    pub fn spawn(
        platform: Platform,
        settings: Arc<SettingsStore>,
        config: PintopConfig,
    ) -> PinHandle {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (report_tx, report_rx) = mpsc::unbounded_channel();
        let (decision_tx, decision_rx) = mpsc::unbounded_channel();

        let controller = Self {
            platform,
            settings,
            config,
            state: PinState::Idle,
            strategy: None,
            last_target: None,
            observers: Vec::new(),
            generation: Arc::new(AtomicU64::new(0)),
            report_tx,
            decision_tx,
        };

        tokio::spawn(controller.run(command_rx, report_rx, decision_rx));
        PinHandle::new(command_tx)
    }

    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut reports: mpsc::UnboundedReceiver<StrategyReport>,
        mut decisions: mpsc::UnboundedReceiver<Decision>,
    ) {
        info!(event = "core.controller.started");

        loop {
            tokio::select! {
                biased;
                command = commands.recv() => match command {
                    Some(Command::Shutdown { reply }) => {
                        self.shutdown();
                        let _ = reply.send(());
                        break;
                    }
                    Some(command) => self.handle_command(command),
                    None => {
                        self.shutdown();
                        break;
                    }
                },
                Some(report) = reports.recv() => self.handle_report(report),
                Some(decision) = decisions.recv() => self.handle_decision(decision),
            }
        }

        info!(event = "core.controller.stopped");
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Pin { target, reply } => {
                self.pin(target);
                let _ = reply.send(());
            }
            Command::Unpin { reply } => {
                self.unpin();
                let _ = reply.send(());
            }
            Command::TogglePin { target, reply } => {
                self.toggle_pin(target);
                let _ = reply.send(());
            }
            Command::AddObserver { observer, reply } => {
                self.observers.push(observer);
                let _ = reply.send(());
            }
            Command::State { reply } => {
                let _ = reply.send(self.state.clone());
            }
            Command::ActiveStrategy { reply } => {
                let _ = reply.send(self.strategy.as_ref().map(ActiveStrategy::kind));
            }
            // Handled by the run loop
            Command::Shutdown { reply } => {
                let _ = reply.send(());
            }
        }
    }

    fn pin(&mut self, target: TargetWindowRef) {
        let generation = self.bump_generation();
        self.teardown();

        info!(
            event = "core.pin.started",
            pid = target.pid,
            process = %target.process_name,
            generation = generation
        );

        self.last_target = Some(target.clone());
        self.transition(PinState::Pinning(target.clone()));

        if let Err(e) = self
            .settings
            .set_last_pinned_identity(PinnedIdentity::from_target(&target))
        {
            warn!(
                event = "core.pin.identity_save_failed",
                error = %e,
                "Pin continues without persisting the window identity"
            );
        }

        let context = DecisionContext {
            platform: self.platform.clone(),
            config: self.config.clone(),
            token: self.token(generation),
        };
        self.spawn_step(decide(context, target));
    }

    /// Run one async step off the actor; its result comes back as a decision.
    fn spawn_step(&self, step: impl Future<Output = Option<Decision>> + Send + 'static) {
        let decision_tx = self.decision_tx.clone();
        tokio::spawn(async move {
            if let Some(decision) = step.await {
                let _ = decision_tx.send(decision);
            }
        });
    }

    fn unpin(&mut self) {
        self.bump_generation();
        self.teardown();

        if self.state.is_pinning() {
            info!(event = "core.pin.unpinned");
            self.transition(PinState::Idle);
        }
    }

    fn toggle_pin(&mut self, target: Option<TargetWindowRef>) {
        if self.state.is_pinning() {
            self.unpin();
            return;
        }

        match target.or_else(|| self.last_target.clone()) {
            Some(target) => self.pin(target),
            None => debug!(event = "core.pin.toggle_without_target"),
        }
    }

    fn shutdown(&mut self) {
        self.unpin();
    }

    fn handle_decision(&mut self, decision: Decision) {
        if decision.generation != self.current_generation() || !self.state.is_pinning() {
            // Dropping the decision releases anything it opened.
            debug!(
                event = "core.pin.stale_decision_dropped",
                generation = decision.generation
            );
            return;
        }

        self.teardown();

        match decision.mode {
            Mode::Overlay(located) => self.begin_overlay(decision.generation, located),
            Mode::OverlayReady(overlay) => {
                info!(event = "core.pin.overlay_active", pid = overlay.target().pid);
                self.strategy = Some(ActiveStrategy::Overlay(overlay));
            }
            Mode::RaiseLoop(reason) => self.start_raise_loop(decision.generation, reason),
        }
    }

    fn begin_overlay(&mut self, generation: u64, located: LocatedWindow) {
        let Some(target) = self.state.target().cloned() else {
            return;
        };

        let sink = StrategySink::new(generation, self.report_tx.clone());
        match OverlaySurface::new(
            self.platform.clone(),
            target,
            overlay_options(&self.config),
            sink,
        ) {
            Ok(overlay) => {
                debug!(event = "core.pin.overlay_starting", generation = generation);
                self.spawn_step(start_overlay(overlay, located, self.token(generation)));
            }
            Err(e) => {
                warn!(event = "core.pin.surface_failed", error = %e);
                self.start_raise_loop(generation, FallbackReason::OverlayFailed(e.to_string()));
            }
        }
    }

    fn start_raise_loop(&mut self, generation: u64, reason: FallbackReason) {
        let Some(target) = self.state.target().cloned() else {
            return;
        };

        let options = RaiseOptions {
            interval: self.settings.raise_interval(),
            focus_steal: self.settings.allow_focus_steal(),
            debounce: self.config.raise.focus_debounce(),
        };
        info!(
            event = "core.pin.raise_loop_selected",
            pid = target.pid,
            reason = ?reason
        );

        let mut raise_loop = RaiseLoop::new(
            self.platform.clone(),
            target,
            options,
            StrategySink::new(generation, self.report_tx.clone()),
        );
        match raise_loop.start() {
            RaiseOutcome::Raised => self.strategy = Some(ActiveStrategy::RaiseLoop(raise_loop)),
            RaiseOutcome::TargetLost => self.fail_target_lost("window gone before first raise"),
        }
    }

    fn handle_report(&mut self, report: StrategyReport) {
        if report.generation != self.current_generation() || !self.state.is_pinning() {
            debug!(
                event = "core.pin.stale_report_dropped",
                generation = report.generation
            );
            return;
        }

        match report.event {
            StrategyEvent::TargetLost { reason } => self.fail_target_lost(&reason),
            StrategyEvent::TargetMoved(moved) => self.handle_moved(moved),
            StrategyEvent::HoverTick => {
                if let Some(ActiveStrategy::Overlay(overlay)) = &mut self.strategy {
                    overlay.handle_hover_tick();
                }
            }
            StrategyEvent::RaiseTick => {
                let outcome = match &mut self.strategy {
                    Some(ActiveStrategy::RaiseLoop(raise_loop)) => raise_loop.handle_tick(),
                    _ => RaiseOutcome::Raised,
                };
                if outcome == RaiseOutcome::TargetLost {
                    self.fail_target_lost("window handle no longer valid");
                }
            }
            StrategyEvent::AppActivated { pid } => {
                let outcome = match &mut self.strategy {
                    Some(ActiveStrategy::RaiseLoop(raise_loop)) => {
                        raise_loop.handle_app_activated(pid)
                    }
                    _ => RaiseOutcome::Raised,
                };
                if outcome == RaiseOutcome::TargetLost {
                    self.fail_target_lost("window handle no longer valid");
                }
            }
        }
    }

    fn handle_moved(&mut self, moved: WindowMove) {
        if let Some(target) = self.state.target_mut() {
            target.bounds = moved.bounds;
            if let Some(title) = &moved.title {
                target.title = title.clone();
            }
            self.last_target = Some(target.clone());
        }
        if let Some(strategy) = &mut self.strategy {
            strategy.handle_moved(&moved);
        }
    }

    fn fail_target_lost(&mut self, reason: &str) {
        self.bump_generation();
        self.teardown();
        warn!(event = "core.pin.target_lost", reason = reason);
        self.transition(PinState::Error(TARGET_LOST_MESSAGE.to_string()));
    }

    fn teardown(&mut self) {
        if let Some(mut strategy) = self.strategy.take() {
            debug!(event = "core.pin.strategy_teardown", kind = %strategy.kind());
            strategy.stop();
        }
    }

    fn transition(&mut self, state: PinState) {
        debug!(
            event = "core.pin.state_changed",
            from = self.state.name(),
            to = state.name()
        );
        self.state = state;
        for observer in &self.observers {
            observer(&self.state);
        }
    }

    fn bump_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn token(&self, generation: u64) -> GenerationToken {
        GenerationToken::new(Arc::clone(&self.generation), generation)
    }

    fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}
