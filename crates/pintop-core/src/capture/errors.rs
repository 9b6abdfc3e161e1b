use crate::errors::PintopError;

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("No shareable window found for pid {pid}")]
    TargetNotFound { pid: i32 },

    #[error("Shareable content unavailable: {message}")]
    ContentUnavailable { message: String },

    #[error("Capture stream failed to start: {message}")]
    StreamStartFailed { message: String },

    #[error("Capture stream did not start within {timeout_ms}ms")]
    StartTimedOut { timeout_ms: u64 },

    #[error("Capture start superseded by a newer request")]
    Superseded,
}

impl PintopError for CaptureError {
    fn error_code(&self) -> &'static str {
        match self {
            CaptureError::TargetNotFound { .. } => "CAPTURE_TARGET_NOT_FOUND",
            CaptureError::ContentUnavailable { .. } => "CAPTURE_CONTENT_UNAVAILABLE",
            CaptureError::StreamStartFailed { .. } => "CAPTURE_STREAM_START_FAILED",
            CaptureError::StartTimedOut { .. } => "CAPTURE_START_TIMED_OUT",
            CaptureError::Superseded => "CAPTURE_SUPERSEDED",
        }
    }
}
