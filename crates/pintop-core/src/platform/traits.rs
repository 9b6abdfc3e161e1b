use std::sync::Arc;

use futures::future::BoxFuture;

use super::errors::{DiscoveryError, PlatformError};
use crate::capture::{CaptureError, Frame, ShareableWindow, StreamRequest};
use crate::window::{Point, SurfaceRect, TargetWindowRef, WindowHandle};

/// Called with the pid of the newly frontmost application.
pub type ActivationCallback = Box<dyn Fn(i32) + Send + Sync>;

/// Called after a window moved or resized. The receiver reads the new
/// geometry itself.
pub type GeometryCallback = Box<dyn Fn() + Send + Sync>;

/// Enumerates windows that can be pinned.
pub trait WindowDiscovery: Send + Sync {
    fn enumerate(&self) -> Result<Vec<TargetWindowRef>, DiscoveryError>;

    fn windows_for_process(&self, pid: i32) -> Result<Vec<TargetWindowRef>, DiscoveryError> {
        Ok(self
            .enumerate()?
            .into_iter()
            .filter(|w| w.pid == pid)
            .collect())
    }
}

/// Screen-capture permission.
pub trait CapabilityService: Send + Sync {
    fn has_permission(&self) -> bool;

    /// Show the system prompt once. There is no completion callback; callers
    /// re-check with [`CapabilityService::has_permission`].
    fn request_permission(&self);
}

/// Application-level workspace queries and actions.
pub trait Workspace: Send + Sync {
    fn own_pid(&self) -> i32;

    fn frontmost_pid(&self) -> Option<i32>;

    /// Activate the application owning `pid`. Returns whether the platform
    /// accepted the request.
    fn activate(&self, pid: i32) -> bool;

    /// Cursor position in bottom-left-origin screen coordinates.
    fn cursor_location(&self) -> Option<Point>;

    fn primary_display_height(&self) -> f64;

    fn backing_scale(&self) -> f64;

    fn subscribe_activations(
        &self,
        on_activated: ActivationCallback,
    ) -> Result<Box<dyn Subscription>, PlatformError>;
}

/// Move/resize notifications for one window.
pub trait GeometryObserver: Send + Sync {
    fn observe_geometry(
        &self,
        handle: &WindowHandle,
        pid: i32,
        on_changed: GeometryCallback,
    ) -> Result<Box<dyn Subscription>, PlatformError>;
}

/// A live platform subscription. `cancel` is idempotent and implementations
/// also cancel on drop.
pub trait Subscription: Send {
    fn cancel(&mut self);
}

/// Live window capture.
pub trait CaptureBackend: Send + Sync {
    fn shareable_windows(&self) -> BoxFuture<'static, Result<Vec<ShareableWindow>, CaptureError>>;

    fn start_stream(
        &self,
        request: StreamRequest,
    ) -> BoxFuture<'static, Result<Box<dyn CaptureStream>, CaptureError>>;
}

/// A running capture stream. `stop` is idempotent and never reports
/// through the stream's stop callback.
pub trait CaptureStream: Send {
    fn stop(&mut self);
}

pub trait SurfaceBackend: Send + Sync {
    fn create_surface(&self, rect: SurfaceRect) -> Result<Arc<dyn RenderSurface>, PlatformError>;
}

/// An always-on-top, click-through, non-activating surface.
pub trait RenderSurface: Send + Sync {
    fn set_frame(&self, rect: SurfaceRect);

    fn present(&self, frame: &Frame);

    fn show(&self);

    fn close(&self);
}
