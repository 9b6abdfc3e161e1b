use crate::errors::PintopError;

#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("Unsupported platform: {operation} requires macOS")]
    Unsupported { operation: &'static str },

    #[error("Failed to subscribe to {kind} notifications: {message}")]
    SubscriptionFailed { kind: &'static str, message: String },

    #[error("Failed to create overlay surface: {message}")]
    SurfaceFailed { message: String },
}

impl PintopError for PlatformError {
    fn error_code(&self) -> &'static str {
        match self {
            PlatformError::Unsupported { .. } => "PLATFORM_UNSUPPORTED",
            PlatformError::SubscriptionFailed { .. } => "PLATFORM_SUBSCRIPTION_FAILED",
            PlatformError::SurfaceFailed { .. } => "PLATFORM_SURFACE_FAILED",
        }
    }

    fn is_user_error(&self) -> bool {
        matches!(self, PlatformError::Unsupported { .. })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("Window enumeration failed: {message}")]
    EnumerationFailed { message: String },

    #[error("Accessibility permission is required to act on windows")]
    AccessibilityDenied,

    #[error("Unsupported platform: window discovery requires macOS")]
    Unsupported,
}

impl PintopError for DiscoveryError {
    fn error_code(&self) -> &'static str {
        match self {
            DiscoveryError::EnumerationFailed { .. } => "DISCOVERY_ENUMERATION_FAILED",
            DiscoveryError::AccessibilityDenied => "DISCOVERY_ACCESSIBILITY_DENIED",
            DiscoveryError::Unsupported => "DISCOVERY_UNSUPPORTED",
        }
    }

    fn is_user_error(&self) -> bool {
        matches!(
            self,
            DiscoveryError::AccessibilityDenied | DiscoveryError::Unsupported
        )
    }
}
