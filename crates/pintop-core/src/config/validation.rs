//! Configuration validation.

use crate::config::defaults::{MAX_CAPTURE_FPS, MIN_HOVER_POLL_MS};
use crate::config::types::PintopConfig;
use crate::errors::ConfigError;

/// Validate a merged configuration.
///
/// # Errors
///
/// Returns `ConfigError::InvalidConfiguration` naming the first offending key.
pub fn validate_config(config: &PintopConfig) -> Result<(), ConfigError> {
    if let Some(fps) = config.overlay.capture_fps
        && !(1..=MAX_CAPTURE_FPS).contains(&fps)
    {
        return Err(ConfigError::InvalidConfiguration {
            message: format!(
                "overlay.capture_fps must be between 1 and {}, got {}",
                MAX_CAPTURE_FPS, fps
            ),
        });
    }

    if let Some(ms) = config.overlay.hover_poll_ms
        && ms < MIN_HOVER_POLL_MS
    {
        return Err(ConfigError::InvalidConfiguration {
            message: format!(
                "overlay.hover_poll_ms must be at least {}, got {}",
                MIN_HOVER_POLL_MS, ms
            ),
        });
    }

    if config.overlay.start_timeout_ms == Some(0) {
        return Err(ConfigError::InvalidConfiguration {
            message: "overlay.start_timeout_ms must be greater than 0".to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::OverlayConfig;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&PintopConfig::default()).is_ok());
    }

    #[test]
    fn test_capture_fps_out_of_range() {
        for fps in [0, 121] {
            let config = PintopConfig {
                overlay: OverlayConfig {
                    capture_fps: Some(fps),
                    ..Default::default()
                },
                ..Default::default()
            };
            let err = validate_config(&config).unwrap_err();
            assert!(err.to_string().contains("overlay.capture_fps"));
        }
    }

    #[test]
    fn test_hover_poll_too_fast() {
        let config = PintopConfig {
            overlay: OverlayConfig {
                hover_poll_ms: Some(5),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_zero_start_timeout_rejected() {
        let config = PintopConfig {
            overlay: OverlayConfig {
                start_timeout_ms: Some(0),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(validate_config(&config).is_err());
    }
}
