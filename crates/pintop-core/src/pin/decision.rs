use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, info, warn};

use crate::capture::{CaptureError, CaptureOptions, LocatedWindow, locate_window};
use crate::config::PintopConfig;
use crate::overlay::{OverlayOptions, OverlaySurface};
use crate::platform::Platform;
use crate::window::TargetWindowRef;

/// A snapshot of the controller generation taken when a pin started.
#[derive(Debug, Clone)]
pub(crate) struct GenerationToken {
    current: Arc<AtomicU64>,
    mine: u64,
}

impl GenerationToken {
    pub(crate) fn new(current: Arc<AtomicU64>, mine: u64) -> Self {
        Self { current, mine }
    }

    pub(crate) fn generation(&self) -> u64 {
        self.mine
    }

    pub(crate) fn is_current(&self) -> bool {
        self.current.load(Ordering::SeqCst) == self.mine
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum FallbackReason {
    PermissionDenied,
    OverlayFailed(String),
}

pub(crate) enum Mode {
    /// Capture is possible; the controller builds the overlay.
    Overlay(LocatedWindow),
    /// The overlay's stream is open and its surface shown.
    OverlayReady(Box<OverlaySurface>),
    RaiseLoop(FallbackReason),
}

pub(crate) struct Decision {
    pub(crate) generation: u64,
    pub(crate) mode: Mode,
}

pub(crate) struct DecisionContext {
    pub(crate) platform: Platform,
    pub(crate) config: PintopConfig,
    pub(crate) token: GenerationToken,
}

pub(crate) fn overlay_options(config: &PintopConfig) -> OverlayOptions {
    OverlayOptions {
        capture: CaptureOptions {
            fps: config.overlay.capture_fps(),
            start_timeout: config.overlay.start_timeout(),
        },
        hover_poll: config.overlay.hover_poll_interval(),
    }
}

/// Pick overlay or raise loop for one pin. Only queries the platform: no
/// surface or stream is opened here. Returns `None` once superseded.
pub(crate) async fn decide(context: DecisionContext, target: TargetWindowRef) -> Option<Decision> {
    let DecisionContext {
        platform,
        config,
        token,
    } = context;
    let generation = token.generation();

    // Back-to-back pins get in before anything is queried for this one.
    tokio::task::yield_now().await;
    if !token.is_current() {
        debug!(event = "core.pin.decision_superseded", generation = generation);
        return None;
    }

    let granted = if platform.capability.has_permission() {
        true
    } else {
        info!(event = "core.pin.permission_prompted", pid = target.pid);
        platform.capability.request_permission();
        tokio::time::sleep(config.permission.prompt_grace()).await;
        if !token.is_current() {
            debug!(event = "core.pin.decision_superseded", generation = generation);
            return None;
        }
        platform.capability.has_permission()
    };

    if !granted {
        return Some(Decision {
            generation,
            mode: Mode::RaiseLoop(FallbackReason::PermissionDenied),
        });
    }

    let located = locate_window(
        platform.capture.as_ref(),
        &target,
        overlay_options(&config).capture,
    )
    .await;
    if !token.is_current() {
        debug!(event = "core.pin.decision_superseded", generation = generation);
        return None;
    }

    let mode = match located {
        Ok(located) => Mode::Overlay(located),
        Err(e) => overlay_failed(&e),
    };
    Some(Decision { generation, mode })
}

/// Open the capture stream for an overlay the controller already built.
/// A superseded start closes the overlay and returns `None`.
pub(crate) async fn start_overlay(
    mut overlay: OverlaySurface,
    located: LocatedWindow,
    token: GenerationToken,
) -> Option<Decision> {
    let generation = token.generation();
    let still_wanted = {
        let token = token.clone();
        move || token.is_current()
    };

    match overlay.start_capture(located, &still_wanted).await {
        Ok(()) if token.is_current() => Some(Decision {
            generation,
            mode: Mode::OverlayReady(Box::new(overlay)),
        }),
        Ok(()) | Err(CaptureError::Superseded) => {
            overlay.stop_capture();
            debug!(event = "core.pin.decision_superseded", generation = generation);
            None
        }
        Err(e) => {
            overlay.stop_capture();
            if !token.is_current() {
                return None;
            }
            Some(Decision {
                generation,
                mode: overlay_failed(&e),
            })
        }
    }
}

fn overlay_failed(error: &CaptureError) -> Mode {
    warn!(
        event = "core.pin.overlay_failed",
        error = %error,
        error_code = crate::errors::PintopError::error_code(error),
        "Falling back to raise loop"
    );
    Mode::RaiseLoop(FallbackReason::OverlayFailed(error.to_string()))
}
