use crate::errors::PintopError;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Failed to save settings: {message}")]
    SaveFailed { message: String },
}

impl PintopError for SettingsError {
    fn error_code(&self) -> &'static str {
        match self {
            SettingsError::SaveFailed { .. } => "SETTINGS_SAVE_FAILED",
        }
    }

    fn is_user_error(&self) -> bool {
        false
    }
}
