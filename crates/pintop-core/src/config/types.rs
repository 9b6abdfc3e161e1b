//! Configuration type definitions.
//!
//! Every field is optional in the file; accessors resolve the default so a
//! partially written config still produces a complete set of tunables.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::defaults;

/// Tunables loaded from TOML config files.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct PintopConfig {
    #[serde(default)]
    pub overlay: OverlayConfig,

    #[serde(default)]
    pub permission: PermissionConfig,

    #[serde(default)]
    pub raise: RaiseConfig,
}

/// Overlay (live capture) tunables.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct OverlayConfig {
    /// Frames per second requested from the capture stream.
    /// Default: 30. Valid range: 1..=120.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capture_fps: Option<u32>,

    /// Interval between cursor hover checks.
    /// Default: 50ms. Minimum: 10ms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hover_poll_ms: Option<u64>,

    /// Upper bound on capture stream startup before falling back.
    /// Default: 5000ms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_timeout_ms: Option<u64>,
}

impl OverlayConfig {
    pub fn capture_fps(&self) -> u32 {
        self.capture_fps.unwrap_or(defaults::DEFAULT_CAPTURE_FPS)
    }

    pub fn hover_poll_interval(&self) -> Duration {
        Duration::from_millis(self.hover_poll_ms.unwrap_or(defaults::DEFAULT_HOVER_POLL_MS))
    }

    pub fn start_timeout(&self) -> Duration {
        Duration::from_millis(
            self.start_timeout_ms
                .unwrap_or(defaults::DEFAULT_START_TIMEOUT_MS),
        )
    }
}

/// Screen-capture permission tunables.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct PermissionConfig {
    /// How long to wait after prompting before re-checking the permission.
    /// Default: 1500ms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_grace_ms: Option<u64>,
}

impl PermissionConfig {
    pub fn prompt_grace(&self) -> Duration {
        Duration::from_millis(
            self.prompt_grace_ms
                .unwrap_or(defaults::DEFAULT_PROMPT_GRACE_MS),
        )
    }
}

/// Raise-loop tunables.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct RaiseConfig {
    /// Minimum gap between two activations of the target app.
    /// Default: 500ms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus_debounce_ms: Option<u64>,
}

impl RaiseConfig {
    pub fn focus_debounce(&self) -> Duration {
        Duration::from_millis(
            self.focus_debounce_ms
                .unwrap_or(defaults::DEFAULT_FOCUS_DEBOUNCE_MS),
        )
    }
}
