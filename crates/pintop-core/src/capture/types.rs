use std::fmt;
use std::sync::Arc;

use crate::window::WindowBounds;

/// A window as seen by the capture backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ShareableWindow {
    pub window_id: u32,
    pub pid: i32,
    pub title: String,
    pub bounds: WindowBounds,
}

/// One captured frame, BGRA, rows padded to `bytes_per_row`.
#[derive(Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub bytes_per_row: usize,
    pub pixels: Arc<Vec<u8>>,
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes_per_row", &self.bytes_per_row)
            .finish_non_exhaustive()
    }
}

/// Receives frames on the backend's delivery thread.
pub type FrameSink = Arc<dyn Fn(Frame) + Send + Sync>;

/// Receives the reason when a stream ends without being asked to.
pub type StopSink = Arc<dyn Fn(String) + Send + Sync>;

pub struct StreamRequest {
    pub window: ShareableWindow,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub on_frame: FrameSink,
    pub on_stopped: StopSink,
}
