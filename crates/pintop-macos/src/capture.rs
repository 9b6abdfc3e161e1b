//! ScreenCaptureKit window streams.
//!
//! ScreenCaptureKit keeps a stream alive after its window closes and just
//! stops delivering frames, so every stream also runs a CGWindowList
//! watchdog that reports the window's disappearance through `on_stopped`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use core_foundation::array::CFArrayGetCount;
use core_foundation::base::CFRelease;
use core_graphics::window::{CGWindowListCopyWindowInfo, kCGWindowListOptionIncludingWindow};
use futures::FutureExt;
use futures::future::BoxFuture;
use pintop_core::capture::{CaptureError, Frame, ShareableWindow, StopSink, StreamRequest};
use pintop_core::platform::{CaptureBackend, CaptureStream};
use pintop_core::window::WindowBounds;
use screencapturekit::prelude::{
    PixelFormat, SCContentFilter, SCShareableContent, SCStream, SCStreamConfiguration,
    SCStreamOutputType,
};
use tracing::{debug, info, warn};

const WATCHDOG_INTERVAL: Duration = Duration::from_millis(500);
const QUEUE_DEPTH: u32 = 3;

pub(crate) struct ScreenCaptureBackend;

impl CaptureBackend for ScreenCaptureBackend {
    fn shareable_windows(&self) -> BoxFuture<'static, Result<Vec<ShareableWindow>, CaptureError>> {
        async {
            tokio::task::spawn_blocking(snapshot_windows)
                .await
                .map_err(|e| CaptureError::ContentUnavailable {
                    message: e.to_string(),
                })?
        }
        .boxed()
    }

    fn start_stream(
        &self,
        request: StreamRequest,
    ) -> BoxFuture<'static, Result<Box<dyn CaptureStream>, CaptureError>> {
        async move {
            let stream = tokio::task::spawn_blocking(move || open_stream(request))
                .await
                .map_err(|e| CaptureError::StreamStartFailed {
                    message: e.to_string(),
                })??;
            Ok(Box::new(stream) as Box<dyn CaptureStream>)
        }
        .boxed()
    }
}

fn snapshot_windows() -> Result<Vec<ShareableWindow>, CaptureError> {
    let content = SCShareableContent::get().map_err(|e| CaptureError::ContentUnavailable {
        message: e.to_string(),
    })?;

    let windows: Vec<ShareableWindow> = content
        .windows()
        .into_iter()
        .filter_map(|w| {
            let pid = w.owning_application()?.process_id();
            let frame = w.frame();
            Some(ShareableWindow {
                window_id: w.window_id(),
                pid,
                title: w.title().unwrap_or_default(),
                bounds: WindowBounds::new(frame.x, frame.y, frame.width, frame.height),
            })
        })
        .collect();

    debug!(event = "macos.capture.snapshot_completed", count = windows.len());
    Ok(windows)
}

fn open_stream(request: StreamRequest) -> Result<WindowStream, CaptureError> {
    let content = SCShareableContent::get().map_err(|e| CaptureError::ContentUnavailable {
        message: e.to_string(),
    })?;
    let window = content
        .windows()
        .into_iter()
        .find(|w| w.window_id() == request.window.window_id)
        .ok_or(CaptureError::TargetNotFound {
            pid: request.window.pid,
        })?;

    let filter = SCContentFilter::create().with_window(&window).build();
    let config = SCStreamConfiguration::new()
        .with_width(request.width)
        .with_height(request.height)
        .with_pixel_format(PixelFormat::BGRA)
        .with_queue_depth(QUEUE_DEPTH)
        .with_fps(request.fps)
        .with_shows_cursor(false)
        .with_captures_audio(false);

    let on_frame = Arc::clone(&request.on_frame);
    let mut stream = SCStream::new(&filter, &config);
    stream.add_output_handler(
        move |sample: screencapturekit::cm::CMSampleBuffer, output_type| {
            if output_type != SCStreamOutputType::Screen {
                return;
            }
            if sample
                .frame_status()
                .map(|status| !status.has_content())
                .unwrap_or(false)
            {
                return;
            }
            let Some(pixel_buffer) = sample.image_buffer() else {
                return;
            };
            let Ok(guard) = pixel_buffer.lock_read_only() else {
                return;
            };

            let width = guard.width();
            let height = guard.height();
            let bytes_per_row = guard.bytes_per_row();
            if width == 0 || height == 0 || bytes_per_row < width.saturating_mul(4) {
                return;
            }
            let raw = guard.as_slice();
            let needed = bytes_per_row.saturating_mul(height);
            if raw.len() < needed {
                return;
            }

            on_frame(Frame {
                width: width as u32,
                height: height as u32,
                bytes_per_row,
                pixels: Arc::new(raw[..needed].to_vec()),
            });
        },
        SCStreamOutputType::Screen,
    );

    stream
        .start_capture()
        .map_err(|e| CaptureError::StreamStartFailed {
            message: e.to_string(),
        })?;

    let live = Arc::new(AtomicBool::new(true));
    spawn_watchdog(
        request.window.window_id,
        Arc::clone(&live),
        Arc::clone(&request.on_stopped),
    );

    info!(
        event = "macos.capture.stream_started",
        window_id = request.window.window_id,
        width = request.width,
        height = request.height,
        fps = request.fps
    );

    Ok(WindowStream {
        stream: Some(stream),
        live,
    })
}

/// Whether CoreGraphics still knows the window.
fn window_exists(window_id: u32) -> bool {
    // SAFETY: returns a +1 CFArray or null; released below.
    unsafe {
        let list = CGWindowListCopyWindowInfo(kCGWindowListOptionIncludingWindow, window_id);
        if list.is_null() {
            return false;
        }
        let count = CFArrayGetCount(list);
        CFRelease(list as _);
        count > 0
    }
}

fn spawn_watchdog(window_id: u32, live: Arc<AtomicBool>, on_stopped: StopSink) {
    let spawned = thread::Builder::new()
        .name("pintop-capture-watchdog".to_string())
        .spawn(move || {
            while live.load(Ordering::Acquire) {
                thread::sleep(WATCHDOG_INTERVAL);
                if window_exists(window_id) {
                    continue;
                }
                // Only report if nobody stopped the stream in the meantime.
                if live.swap(false, Ordering::AcqRel) {
                    info!(event = "macos.capture.window_gone", window_id = window_id);
                    on_stopped("captured window closed".to_string());
                }
            }
        });
    if let Err(e) = spawned {
        warn!(event = "macos.capture.watchdog_spawn_failed", error = %e);
    }
}

struct WindowStream {
    stream: Option<SCStream>,
    live: Arc<AtomicBool>,
}

impl CaptureStream for WindowStream {
    fn stop(&mut self) {
        self.live.store(false, Ordering::Release);
        if let Some(stream) = self.stream.take() {
            if let Err(e) = stream.stop_capture() {
                debug!(event = "macos.capture.stop_failed", error = %e);
            }
            debug!(event = "macos.capture.stream_stopped");
        }
    }
}

impl Drop for WindowStream {
    fn drop(&mut self) {
        self.stop();
    }
}
