use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::errors::CaptureError;
use super::types::{FrameSink, ShareableWindow, StopSink, StreamRequest};
use crate::platform::{CaptureBackend, CaptureStream};
use crate::window::{TargetWindowRef, WindowBounds};

#[derive(Debug, Clone, Copy)]
pub struct CaptureOptions {
    pub fps: u32,
    pub start_timeout: Duration,
}

/// The shareable window picked for a target, plus the deadline its stream
/// has to open by.
#[derive(Debug, Clone)]
pub struct LocatedWindow {
    pub window: ShareableWindow,
    pub deadline: Instant,
}

/// Snapshot the shareable windows and pick the one showing `target`.
///
/// Opens nothing. The start timeout begins here and the returned deadline
/// also bounds [`CaptureSession::start`].
pub async fn locate_window(
    backend: &dyn CaptureBackend,
    target: &TargetWindowRef,
    options: CaptureOptions,
) -> Result<LocatedWindow, CaptureError> {
    let deadline = Instant::now() + options.start_timeout;
    let windows = match tokio::time::timeout_at(deadline, backend.shareable_windows()).await {
        Ok(result) => result?,
        Err(_) => return Err(start_timed_out(target, options.start_timeout)),
    };

    let window = locate_target(&windows, target)
        .cloned()
        .ok_or(CaptureError::TargetNotFound { pid: target.pid })?;
    debug!(
        event = "core.capture.window_located",
        window_id = window.window_id,
        pid = target.pid
    );
    Ok(LocatedWindow { window, deadline })
}

fn start_timed_out(target: &TargetWindowRef, timeout: Duration) -> CaptureError {
    let timeout_ms = timeout.as_millis() as u64;
    warn!(
        event = "core.capture.start_timed_out",
        pid = target.pid,
        timeout_ms = timeout_ms
    );
    CaptureError::StartTimedOut { timeout_ms }
}

/// Owns at most one live capture stream.
pub struct CaptureSession {
    backend: Arc<dyn CaptureBackend>,
    options: CaptureOptions,
    stream: Option<Box<dyn CaptureStream>>,
}

impl CaptureSession {
    pub fn new(backend: Arc<dyn CaptureBackend>, options: CaptureOptions) -> Self {
        Self {
            backend,
            options,
            stream: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.stream.is_some()
    }

    /// Open a stream on a located window, sized to `target`'s bounds.
    ///
    /// `still_wanted` is consulted before the open and after it; a `false`
    /// answer abandons the start and releases anything opened.
    pub async fn start(
        &mut self,
        target: &TargetWindowRef,
        located: LocatedWindow,
        backing_scale: f64,
        on_frame: FrameSink,
        on_stopped: StopSink,
        still_wanted: &(dyn Fn() -> bool + Send + Sync),
    ) -> Result<(), CaptureError> {
        self.stop();
        if !still_wanted() {
            return Err(CaptureError::Superseded);
        }

        let (width, height) = stream_dimensions(target.bounds, backing_scale);
        debug!(
            event = "core.capture.stream_start_started",
            window_id = located.window.window_id,
            pid = target.pid,
            width = width,
            height = height,
            fps = self.options.fps
        );

        let request = StreamRequest {
            window: located.window,
            width,
            height,
            fps: self.options.fps,
            on_frame,
            on_stopped,
        };
        let opened =
            tokio::time::timeout_at(located.deadline, self.backend.start_stream(request)).await;

        let mut stream = match opened {
            Ok(result) => result?,
            Err(_) => return Err(start_timed_out(target, self.options.start_timeout)),
        };

        if !still_wanted() {
            stream.stop();
            return Err(CaptureError::Superseded);
        }

        info!(event = "core.capture.started", pid = target.pid);
        self.stream = Some(stream);
        Ok(())
    }

    pub fn stop(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
            info!(event = "core.capture.stopped");
        }
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Pick the shareable window for `target`: same pid and exact title first,
/// then any window of that pid.
pub fn locate_target<'a>(
    windows: &'a [ShareableWindow],
    target: &TargetWindowRef,
) -> Option<&'a ShareableWindow> {
    windows
        .iter()
        .find(|w| w.pid == target.pid && w.title == target.title)
        .or_else(|| windows.iter().find(|w| w.pid == target.pid))
}

/// Stream resolution in pixels for the given bounds.
pub fn stream_dimensions(bounds: WindowBounds, backing_scale: f64) -> (u32, u32) {
    let scale = if backing_scale.is_finite() && backing_scale > 0.0 {
        backing_scale
    } else {
        1.0
    };
    let width = (bounds.width * scale).round().max(1.0) as u32;
    let height = (bounds.height * scale).round().max(1.0) as u32;
    (width, height)
}
