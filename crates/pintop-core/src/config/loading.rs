//! Configuration loading and merging logic.
//!
//! # Configuration Hierarchy
//!
//! 1. **Hardcoded defaults** - Built-in fallback values
//! 2. **User config** - `~/.pintop/config.toml`
//! 3. **Explicit file** - passed on the command line

use crate::config::types::{OverlayConfig, PermissionConfig, PintopConfig, RaiseConfig};
use crate::config::validation::validate_config;
use crate::errors::ConfigError;
use std::fs;
use std::path::{Path, PathBuf};

/// Load configuration from the hierarchy of config files.
///
/// # Errors
///
/// A missing user config is not an error. A missing explicit file, any parse
/// error and any validation failure are.
pub fn load_hierarchy(explicit: Option<&Path>) -> Result<PintopConfig, ConfigError> {
    load_from_sources(user_config_path().as_deref(), explicit)
}

fn load_from_sources(
    user_path: Option<&Path>,
    explicit: Option<&Path>,
) -> Result<PintopConfig, ConfigError> {
    let mut config = PintopConfig::default();

    if let Some(path) = user_path
        && let Some(user_config) = load_optional_config_file(path)?
    {
        config = merge_configs(config, user_config);
    }

    if let Some(path) = explicit {
        let explicit_config = load_config_file(path)?;
        config = merge_configs(config, explicit_config);
    }

    validate_config(&config)?;

    tracing::debug!(
        event = "core.config.loaded",
        capture_fps = config.overlay.capture_fps(),
        explicit = explicit.is_some()
    );

    Ok(config)
}

fn user_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".pintop").join("config.toml"))
}

/// Load a config file that is allowed to be absent.
fn load_optional_config_file(path: &Path) -> Result<Option<PintopConfig>, ConfigError> {
    match load_config_file(path) {
        Ok(config) => Ok(Some(config)),
        Err(ConfigError::IoError { source, .. })
            if source.kind() == std::io::ErrorKind::NotFound =>
        {
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Load a configuration file from the given path.
pub fn load_config_file(path: &Path) -> Result<PintopConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::IoError {
        path: path.display().to_string(),
        source,
    })?;
    toml::from_str(&content).map_err(|e| ConfigError::ConfigParseError {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

/// Merge two configurations, with override_config taking precedence.
///
/// Override values replace base values only if present.
pub fn merge_configs(base: PintopConfig, override_config: PintopConfig) -> PintopConfig {
    PintopConfig {
        overlay: OverlayConfig {
            capture_fps: override_config
                .overlay
                .capture_fps
                .or(base.overlay.capture_fps),
            hover_poll_ms: override_config
                .overlay
                .hover_poll_ms
                .or(base.overlay.hover_poll_ms),
            start_timeout_ms: override_config
                .overlay
                .start_timeout_ms
                .or(base.overlay.start_timeout_ms),
        },
        permission: PermissionConfig {
            prompt_grace_ms: override_config
                .permission
                .prompt_grace_ms
                .or(base.permission.prompt_grace_ms),
        },
        raise: RaiseConfig {
            focus_debounce_ms: override_config
                .raise
                .focus_debounce_ms
                .or(base.raise.focus_debounce_ms),
        },
    }
}
