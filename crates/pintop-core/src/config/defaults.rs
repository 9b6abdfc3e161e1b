//! Default values for configuration tunables.

/// Capture stream frame rate.
pub const DEFAULT_CAPTURE_FPS: u32 = 30;

/// Cursor hover poll period in milliseconds.
pub const DEFAULT_HOVER_POLL_MS: u64 = 50;

/// Capture startup bound in milliseconds. A start that takes longer counts
/// as a failed overlay attempt.
pub const DEFAULT_START_TIMEOUT_MS: u64 = 5000;

/// Wait after the one-shot permission prompt before re-checking.
pub const DEFAULT_PROMPT_GRACE_MS: u64 = 1500;

/// Focus-steal debounce in milliseconds.
pub const DEFAULT_FOCUS_DEBOUNCE_MS: u64 = 500;

pub const MAX_CAPTURE_FPS: u32 = 120;
pub const MIN_HOVER_POLL_MS: u64 = 10;
