//! pintop-macos: macOS backends for pintop-core
//!
//! Implements every collaborator trait in [`pintop_core::platform`] on top of
//! AppKit, Accessibility, CoreGraphics and ScreenCaptureKit. On other targets
//! [`platform`] reports an unsupported-platform error.
//!
//! AppKit objects are only touched on the main thread. Callers that create
//! overlay surfaces must keep the main thread inside [`run_main_loop`].

#[cfg(target_os = "macos")]
mod activation;
#[cfg(target_os = "macos")]
mod ax;
#[cfg(target_os = "macos")]
mod capability;
#[cfg(target_os = "macos")]
mod capture;
#[cfg(target_os = "macos")]
mod discovery;
#[cfg(target_os = "macos")]
mod main_thread;
#[cfg(target_os = "macos")]
mod observer;
#[cfg(target_os = "macos")]
mod surface;
#[cfg(target_os = "macos")]
mod workspace;

use std::sync::atomic::AtomicBool;

use pintop_core::platform::{Platform, PlatformError};

/// Build the macOS [`Platform`].
#[cfg(target_os = "macos")]
pub fn platform() -> Result<Platform, PlatformError> {
    use std::sync::Arc;

    tracing::debug!(event = "macos.platform.init_started");

    Ok(Platform {
        discovery: Arc::new(discovery::MacDiscovery),
        capability: Arc::new(capability::MacCapability),
        workspace: Arc::new(workspace::MacWorkspace),
        geometry: Arc::new(observer::AxGeometryObserver),
        capture: Arc::new(capture::ScreenCaptureBackend),
        surfaces: Arc::new(surface::PanelSurfaceBackend::default()),
    })
}

#[cfg(not(target_os = "macos"))]
pub fn platform() -> Result<Platform, PlatformError> {
    Err(PlatformError::Unsupported {
        operation: "window pinning",
    })
}

/// Pump the main run loop until `done` is set.
///
/// Must be called from the process main thread.
#[cfg(target_os = "macos")]
pub fn run_main_loop(done: &AtomicBool) {
    main_thread::run_until(done);
}

#[cfg(not(target_os = "macos"))]
pub fn run_main_loop(done: &AtomicBool) {
    use std::sync::atomic::Ordering;

    while !done.load(Ordering::Acquire) {
        std::thread::sleep(std::time::Duration::from_millis(50));
    }
}

#[cfg(all(test, not(target_os = "macos")))]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;

    #[test]
    fn test_platform_unsupported_off_macos() {
        let error = platform().err().map(|e| e.to_string());
        assert_eq!(
            error.as_deref(),
            Some("Unsupported platform: window pinning requires macOS")
        );
    }

    #[test]
    fn test_main_loop_returns_when_done() {
        let done = AtomicBool::new(true);
        run_main_loop(&done);
        assert!(done.load(Ordering::Acquire));
    }
}
