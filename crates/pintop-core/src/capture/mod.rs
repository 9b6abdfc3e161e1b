//! Capture Session: one live frame stream scoped to a single window.

pub mod errors;
pub mod session;
pub mod types;

pub use errors::CaptureError;
pub use session::{
    CaptureOptions, CaptureSession, LocatedWindow, locate_target, locate_window, stream_dimensions,
};
pub use types::{Frame, FrameSink, ShareableWindow, StopSink, StreamRequest};
