use pintop_core::platform::CapabilityService;
use tracing::info;

// SAFETY: FFI declarations for the CoreGraphics screen-capture access API.
// Both are available since macOS 10.15 and take no arguments.
#[link(name = "CoreGraphics", kind = "framework")]
unsafe extern "C" {
    fn CGPreflightScreenCaptureAccess() -> bool;
    fn CGRequestScreenCaptureAccess() -> bool;
}

/// Screen Recording permission via CoreGraphics.
pub(crate) struct MacCapability;

impl CapabilityService for MacCapability {
    fn has_permission(&self) -> bool {
        // SAFETY: no arguments, no side effects.
        unsafe { CGPreflightScreenCaptureAccess() }
    }

    fn request_permission(&self) {
        // SAFETY: shows the system prompt at most once per process.
        let granted = unsafe { CGRequestScreenCaptureAccess() };
        info!(event = "macos.permission.requested", granted_immediately = granted);
    }
}
