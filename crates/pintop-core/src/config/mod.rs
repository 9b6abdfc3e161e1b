//! # Configuration System
//!
//! Hierarchical TOML configuration for pintop tunables.
//!
//! ## Configuration Hierarchy
//!
//! Configuration is loaded in the following order (later sources override earlier ones):
//! 1. **Hardcoded defaults** - Built-in fallback values
//! 2. **User config** - `~/.pintop/config.toml`
//! 3. **Explicit file** - `pintop --config <FILE>` (highest priority)
//!
//! ## Usage Example
//!
//! ```toml
//! # ~/.pintop/config.toml
//! [overlay]
//! capture_fps = 30
//! hover_poll_ms = 50
//! start_timeout_ms = 5000
//!
//! [permission]
//! prompt_grace_ms = 1500
//!
//! [raise]
//! focus_debounce_ms = 500
//! ```
//!
//! User-facing preferences that change at runtime (raise interval, focus
//! stealing, the last pinned window) live in [`crate::settings`] instead.

pub mod defaults;
pub mod loading;
pub mod types;
pub mod validation;

pub use types::{OverlayConfig, PermissionConfig, PintopConfig, RaiseConfig};
pub use validation::validate_config;

impl PintopConfig {
    /// Load configuration from the hierarchy of config files.
    ///
    /// See [`loading::load_hierarchy`] for details.
    pub fn load_hierarchy(
        explicit: Option<&std::path::Path>,
    ) -> Result<Self, crate::errors::ConfigError> {
        loading::load_hierarchy(explicit)
    }

    /// Validate the configuration.
    ///
    /// See [`validation::validate_config`] for details.
    pub fn validate(&self) -> Result<(), crate::errors::ConfigError> {
        validation::validate_config(self)
    }
}
