//! Position Tracker: follows a window's move/resize notifications.

use tracing::{debug, warn};

use crate::platform::{GeometryObserver, Subscription};
use crate::strategy::{StrategyEvent, StrategySink, WindowMove};
use crate::window::TargetWindowRef;

/// Owns the geometry subscription for one window.
///
/// Attaching can fail (the app may not expose accessibility notifications).
/// That leaves the tracker idle; the overlay keeps working without
/// following moves.
pub struct PositionTracker {
    subscription: Option<Box<dyn Subscription>>,
}

impl PositionTracker {
    pub fn start(
        observer: &dyn GeometryObserver,
        target: &TargetWindowRef,
        sink: StrategySink,
    ) -> Self {
        let handle = target.handle.clone();
        let on_changed = Box::new(move || {
            // Read geometry on the notification thread; deliver on the controller.
            let Some(bounds) = handle.bounds() else {
                return;
            };
            sink.send(StrategyEvent::TargetMoved(WindowMove {
                bounds,
                title: handle.title(),
            }));
        });

        match observer.observe_geometry(&target.handle, target.pid, on_changed) {
            Ok(subscription) => {
                debug!(event = "core.tracker.attached", pid = target.pid);
                Self {
                    subscription: Some(subscription),
                }
            }
            Err(e) => {
                warn!(
                    event = "core.tracker.attach_failed",
                    pid = target.pid,
                    error = %e,
                    "Overlay will not follow window moves"
                );
                Self::idle()
            }
        }
    }

    pub fn idle() -> Self {
        Self { subscription: None }
    }

    pub fn is_tracking(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn stop(&mut self) {
        if let Some(mut subscription) = self.subscription.take() {
            subscription.cancel();
            debug!(event = "core.tracker.detached");
        }
    }
}

impl Drop for PositionTracker {
    fn drop(&mut self) {
        self.stop();
    }
}
