use crate::errors::PintopError;

#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error("Pin controller has stopped")]
    Stopped,
}

impl PintopError for ControllerError {
    fn error_code(&self) -> &'static str {
        match self {
            ControllerError::Stopped => "CONTROLLER_STOPPED",
        }
    }
}
