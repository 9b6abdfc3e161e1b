use std::fmt;

use crate::window::TargetWindowRef;

pub const TARGET_LOST_MESSAGE: &str = "Target window no longer exists";

/// Controller state. Starts `Idle`; `Error` only leaves on a new pin.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PinState {
    #[default]
    Idle,
    Pinning(TargetWindowRef),
    Error(String),
}

impl PinState {
    pub fn is_pinning(&self) -> bool {
        matches!(self, PinState::Pinning(_))
    }

    pub fn target(&self) -> Option<&TargetWindowRef> {
        match self {
            PinState::Pinning(target) => Some(target),
            _ => None,
        }
    }

    pub(crate) fn target_mut(&mut self) -> Option<&mut TargetWindowRef> {
        match self {
            PinState::Pinning(target) => Some(target),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PinState::Idle => "idle",
            PinState::Pinning(_) => "pinning",
            PinState::Error(_) => "error",
        }
    }
}

impl fmt::Display for PinState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PinState::Idle => write!(f, "idle"),
            PinState::Pinning(target) => write!(f, "pinning {}", target),
            PinState::Error(message) => write!(f, "error: {}", message),
        }
    }
}
