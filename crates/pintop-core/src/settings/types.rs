use serde::{Deserialize, Serialize};

use crate::identity::PinnedIdentity;

pub const MIN_RAISE_INTERVAL_SECS: f64 = 0.2;
pub const MAX_RAISE_INTERVAL_SECS: f64 = 1.5;
pub const DEFAULT_RAISE_INTERVAL_SECS: f64 = 0.4;

/// The persisted settings record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_pinned_identity: Option<PinnedIdentity>,

    /// Seconds between raises in the fallback loop. Unset means the default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raise_interval_secs: Option<f64>,

    /// Also activate the target app on each raise.
    #[serde(default)]
    pub allow_focus_steal: bool,
}

impl Settings {
    pub fn raise_interval_secs(&self) -> f64 {
        self.raise_interval_secs
            .map(clamp_raise_interval)
            .unwrap_or(DEFAULT_RAISE_INTERVAL_SECS)
    }
}

/// Clamp a raise interval into the supported range. NaN and infinities map
/// to the default.
pub fn clamp_raise_interval(secs: f64) -> f64 {
    if !secs.is_finite() {
        return DEFAULT_RAISE_INTERVAL_SECS;
    }
    secs.clamp(MIN_RAISE_INTERVAL_SECS, MAX_RAISE_INTERVAL_SECS)
}
