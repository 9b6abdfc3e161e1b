use std::sync::mpsc;
use std::time::Duration;

use core_graphics::display::CGDisplay;
use core_graphics::event::CGEvent;
use core_graphics::event_source::{CGEventSource, CGEventSourceStateID};
use objc2_app_kit::{NSApplicationActivationOptions, NSRunningApplication, NSScreen, NSWorkspace};
use pintop_core::platform::{ActivationCallback, PlatformError, Subscription, Workspace};
use pintop_core::window::Point;
use tracing::{debug, warn};

use crate::activation::ActivationObserver;
use crate::main_thread::run_on_main;

/// How long a worker waits for the main thread to read the screen scale.
const SCREEN_QUERY_TIMEOUT: Duration = Duration::from_millis(500);

/// NSWorkspace and CoreGraphics queries.
pub(crate) struct MacWorkspace;

pub(crate) fn frontmost_pid() -> Option<i32> {
    NSWorkspace::sharedWorkspace()
        .frontmostApplication()
        .map(|app| app.processIdentifier())
}

impl Workspace for MacWorkspace {
    fn own_pid(&self) -> i32 {
        std::process::id() as i32
    }

    fn frontmost_pid(&self) -> Option<i32> {
        frontmost_pid()
    }

    fn activate(&self, pid: i32) -> bool {
        let Some(app) = NSRunningApplication::runningApplicationWithProcessIdentifier(pid) else {
            debug!(event = "macos.workspace.activate_no_app", pid = pid);
            return false;
        };
        app.activateWithOptions(NSApplicationActivationOptions::empty())
    }

    fn cursor_location(&self) -> Option<Point> {
        let source = CGEventSource::new(CGEventSourceStateID::HIDSystemState).ok()?;
        let event = CGEvent::new(source).ok()?;
        let location = event.location();
        // CGEvent reports top-left-origin global coordinates.
        Some(Point::new(
            location.x,
            self.primary_display_height() - location.y,
        ))
    }

    fn primary_display_height(&self) -> f64 {
        CGDisplay::main().bounds().size.height
    }

    fn backing_scale(&self) -> f64 {
        let (tx, rx) = mpsc::sync_channel(1);
        run_on_main(move |mtm| {
            let scale = NSScreen::mainScreen(mtm).map(|screen| screen.backingScaleFactor());
            let _ = tx.send(scale);
        });

        match rx.recv_timeout(SCREEN_QUERY_TIMEOUT) {
            Ok(Some(scale)) if scale > 0.0 => scale,
            Ok(_) => 1.0,
            Err(e) => {
                warn!(event = "macos.workspace.backing_scale_unavailable", error = %e);
                1.0
            }
        }
    }

    fn subscribe_activations(
        &self,
        on_activated: ActivationCallback,
    ) -> Result<Box<dyn Subscription>, PlatformError> {
        Ok(Box::new(ActivationObserver::start(on_activated)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backing_scale_is_a_usable_factor() {
        // Off the main thread with no run loop pumping this takes the fallback.
        let scale = MacWorkspace.backing_scale();
        assert!(scale.is_finite());
        assert!(scale >= 1.0);
    }
}
