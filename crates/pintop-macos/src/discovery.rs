use std::sync::Arc;

use objc2_app_kit::NSRunningApplication;
use pintop_core::platform::{DiscoveryError, WindowDiscovery};
use pintop_core::window::{TargetWindowRef, WindowBounds, WindowHandle};
use tracing::{debug, info, warn};

use crate::ax::{self, AxWindow};

/// Windows smaller than this are status items and other invisible chrome.
const MIN_WINDOW_EXTENT: u32 = 10;

/// Window enumeration via xcap, resolved to AX elements.
pub(crate) struct MacDiscovery;

impl WindowDiscovery for MacDiscovery {
    fn enumerate(&self) -> Result<Vec<TargetWindowRef>, DiscoveryError> {
        info!(event = "macos.discovery.enumerate_started");

        if !ax::is_process_trusted() {
            warn!(event = "macos.discovery.accessibility_denied");
            return Err(DiscoveryError::AccessibilityDenied);
        }

        let windows = xcap::Window::all().map_err(|e| DiscoveryError::EnumerationFailed {
            message: e.to_string(),
        })?;

        let own_pid = std::process::id() as i32;
        let mut skipped_count = 0;

        let result: Vec<TargetWindowRef> = windows
            .into_iter()
            .filter_map(|w| {
                let target = describe_window(&w, own_pid);
                if target.is_none() {
                    skipped_count += 1;
                }
                target
            })
            .collect();

        info!(
            event = "macos.discovery.enumerate_completed",
            count = result.len(),
            skipped = skipped_count
        );
        Ok(result)
    }
}

fn describe_window(w: &xcap::Window, own_pid: i32) -> Option<TargetWindowRef> {
    let id = property(w.id(), "id")?;
    let pid = property(w.pid(), "pid")? as i32;
    if pid == own_pid {
        return None;
    }
    if property(w.is_minimized(), "is_minimized")? {
        return None;
    }

    let width = property(w.width(), "width")?;
    let height = property(w.height(), "height")?;
    if width < MIN_WINDOW_EXTENT || height < MIN_WINDOW_EXTENT {
        return None;
    }
    let x = property(w.x(), "x")?;
    let y = property(w.y(), "y")?;
    let bounds = WindowBounds::new(x as f64, y as f64, width as f64, height as f64);

    let process_name = property(w.app_name(), "app_name")?;
    let title = w.title().unwrap_or_default();

    let element = AxWindow::resolve(id as u64, pid, &bounds, &title)?;

    Some(TargetWindowRef {
        pid,
        process_name,
        bundle_id: bundle_identifier(pid),
        handle: WindowHandle::new(Arc::new(element)),
        title,
        bounds,
    })
}

fn property<T>(value: Result<T, xcap::XCapError>, name: &'static str) -> Option<T> {
    match value {
        Ok(v) => Some(v),
        Err(e) => {
            debug!(
                event = "macos.discovery.property_access_failed",
                property = name,
                error = %e
            );
            None
        }
    }
}

fn bundle_identifier(pid: i32) -> Option<String> {
    NSRunningApplication::runningApplicationWithProcessIdentifier(pid)
        .and_then(|app| app.bundleIdentifier())
        .map(|id| id.to_string())
}
