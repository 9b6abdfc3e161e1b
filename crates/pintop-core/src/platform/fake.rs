//! In-process platform for tests. Records every capture start/stop, raise,
//! activation and subscription so tests can assert on resource lifetimes.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::BoxFuture;

use super::errors::{DiscoveryError, PlatformError};
use super::traits::{
    ActivationCallback, CapabilityService, CaptureBackend, CaptureStream, GeometryCallback,
    GeometryObserver, RenderSurface, Subscription, SurfaceBackend, WindowDiscovery, Workspace,
};
use super::Platform;
use crate::capture::{CaptureError, Frame, ShareableWindow, StopSink, StreamRequest};
use crate::window::{
    Point, SurfaceRect, TargetWindowRef, WindowBounds, WindowElement, WindowHandle,
};

pub const OWN_PID: i32 = 1;
pub const PRIMARY_HEIGHT: f64 = 1000.0;

pub struct FakeWindow {
    id: u64,
    valid: AtomicBool,
    raises: AtomicUsize,
    bounds: Mutex<WindowBounds>,
    title: Mutex<String>,
}

impl FakeWindow {
    pub fn invalidate(&self) {
        self.valid.store(false, Ordering::SeqCst);
    }

    pub fn raise_count(&self) -> usize {
        self.raises.load(Ordering::SeqCst)
    }

    pub fn set_bounds(&self, bounds: WindowBounds) {
        *self.bounds.lock().unwrap() = bounds;
    }

    pub fn set_title(&self, title: &str) {
        *self.title.lock().unwrap() = title.to_string();
    }
}

impl WindowElement for FakeWindow {
    fn id(&self) -> u64 {
        self.id
    }

    fn is_valid(&self) -> bool {
        self.valid.load(Ordering::SeqCst)
    }

    fn raise(&self) -> bool {
        self.raises.fetch_add(1, Ordering::SeqCst);
        self.is_valid()
    }

    fn bounds(&self) -> Option<WindowBounds> {
        self.is_valid().then(|| *self.bounds.lock().unwrap())
    }

    fn title(&self) -> Option<String> {
        self.is_valid().then(|| self.title.lock().unwrap().clone())
    }
}

#[derive(Default)]
pub struct FakeSurface {
    rect: Mutex<SurfaceRect>,
    frames: AtomicUsize,
    shown: AtomicBool,
    closed: AtomicBool,
}

impl FakeSurface {
    pub fn rect(&self) -> SurfaceRect {
        *self.rect.lock().unwrap()
    }

    pub fn frames_presented(&self) -> usize {
        self.frames.load(Ordering::SeqCst)
    }

    pub fn is_shown(&self) -> bool {
        self.shown.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl RenderSurface for FakeSurface {
    fn set_frame(&self, rect: SurfaceRect) {
        *self.rect.lock().unwrap() = rect;
    }

    fn present(&self, _frame: &Frame) {
        self.frames.fetch_add(1, Ordering::SeqCst);
    }

    fn show(&self) {
        self.shown.store(true, Ordering::SeqCst);
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

struct Registration<F: ?Sized> {
    live: Arc<AtomicBool>,
    callback: Arc<F>,
}

struct FakeSubscription {
    live: Arc<AtomicBool>,
}

impl Subscription for FakeSubscription {
    fn cancel(&mut self) {
        self.live.store(false, Ordering::SeqCst);
    }
}

impl Drop for FakeSubscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

struct FakeStream {
    live: Arc<AtomicBool>,
    stopped: bool,
    stops: Arc<AtomicUsize>,
}

impl CaptureStream for FakeStream {
    fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.live.store(false, Ordering::SeqCst);
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
    }
}

impl Drop for FakeStream {
    fn drop(&mut self) {
        self.stop();
    }
}

#[derive(Default)]
struct FakeState {
    next_window_id: AtomicU64,
    windows: Mutex<Vec<TargetWindowRef>>,
    shareable: Mutex<Vec<ShareableWindow>>,

    permission: AtomicBool,
    grant_on_request: AtomicBool,
    permission_requests: AtomicUsize,

    frontmost: Mutex<Option<i32>>,
    cursor: Mutex<Option<Point>>,
    activations: Mutex<Vec<i32>>,
    activation_subscribers: Mutex<Vec<Registration<dyn Fn(i32) + Send + Sync>>>,

    geometry_subscribers: Mutex<Vec<Registration<dyn Fn() + Send + Sync>>>,
    fail_geometry: AtomicBool,

    snapshot_delay: Mutex<Duration>,
    stream_start_delay: Mutex<Duration>,
    fail_stream: AtomicBool,
    emit_frame_on_start: AtomicBool,
    streams_started: AtomicUsize,
    streams_stopped: Arc<AtomicUsize>,
    stream_sizes: Mutex<Vec<(u32, u32)>>,
    streams: Mutex<Vec<Registration<dyn Fn(String) + Send + Sync>>>,

    surfaces: Mutex<Vec<Arc<FakeSurface>>>,
}

/// A scriptable [`Platform`]. Clones share state.
#[derive(Clone, Default)]
pub struct FakePlatform {
    state: Arc<FakeState>,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn platform(&self) -> Platform {
        Platform {
            discovery: Arc::new(self.clone()),
            capability: Arc::new(self.clone()),
            workspace: Arc::new(self.clone()),
            geometry: Arc::new(self.clone()),
            capture: Arc::new(self.clone()),
            surfaces: Arc::new(self.clone()),
        }
    }

    /// Register a window both for discovery and as shareable content.
    pub fn add_window(
        &self,
        pid: i32,
        process_name: &str,
        title: &str,
        bounds: WindowBounds,
    ) -> (TargetWindowRef, Arc<FakeWindow>) {
        let id = self.state.next_window_id.fetch_add(1, Ordering::SeqCst) + 1;
        let window = Arc::new(FakeWindow {
            id,
            valid: AtomicBool::new(true),
            raises: AtomicUsize::new(0),
            bounds: Mutex::new(bounds),
            title: Mutex::new(title.to_string()),
        });
        let target = TargetWindowRef {
            pid,
            process_name: process_name.to_string(),
            bundle_id: Some(format!("com.example.{}", process_name.to_lowercase())),
            handle: WindowHandle::new(window.clone()),
            title: title.to_string(),
            bounds,
        };
        self.state.windows.lock().unwrap().push(target.clone());
        self.state.shareable.lock().unwrap().push(ShareableWindow {
            window_id: id as u32,
            pid,
            title: title.to_string(),
            bounds,
        });
        (target, window)
    }

    pub fn remove_shareable(&self, pid: i32) {
        self.state.shareable.lock().unwrap().retain(|w| w.pid != pid);
    }

    // Capability

    pub fn set_permission(&self, granted: bool) {
        self.state.permission.store(granted, Ordering::SeqCst);
    }

    pub fn set_grant_on_request(&self, grant: bool) {
        self.state.grant_on_request.store(grant, Ordering::SeqCst);
    }

    pub fn permission_requests(&self) -> usize {
        self.state.permission_requests.load(Ordering::SeqCst)
    }

    // Workspace

    pub fn set_frontmost(&self, pid: Option<i32>) {
        *self.state.frontmost.lock().unwrap() = pid;
    }

    pub fn set_cursor(&self, point: Option<Point>) {
        *self.state.cursor.lock().unwrap() = point;
    }

    pub fn activations(&self) -> Vec<i32> {
        self.state.activations.lock().unwrap().clone()
    }

    /// Make `pid` frontmost and notify activation subscribers.
    pub fn fire_activation(&self, pid: i32) {
        self.set_frontmost(Some(pid));
        let callbacks = live_callbacks(&self.state.activation_subscribers);
        for callback in callbacks {
            callback(pid);
        }
    }

    pub fn active_activation_subscriptions(&self) -> usize {
        live_count(&self.state.activation_subscribers)
    }

    // Geometry

    pub fn set_fail_geometry(&self, fail: bool) {
        self.state.fail_geometry.store(fail, Ordering::SeqCst);
    }

    pub fn fire_geometry_change(&self) {
        let callbacks = live_callbacks(&self.state.geometry_subscribers);
        for callback in callbacks {
            callback();
        }
    }

    pub fn active_geometry_subscriptions(&self) -> usize {
        live_count(&self.state.geometry_subscribers)
    }

    // Capture

    pub fn set_snapshot_delay(&self, delay: Duration) {
        *self.state.snapshot_delay.lock().unwrap() = delay;
    }

    pub fn set_stream_start_delay(&self, delay: Duration) {
        *self.state.stream_start_delay.lock().unwrap() = delay;
    }

    pub fn set_fail_stream(&self, fail: bool) {
        self.state.fail_stream.store(fail, Ordering::SeqCst);
    }

    pub fn emit_frame_on_start(&self, emit: bool) {
        self.state.emit_frame_on_start.store(emit, Ordering::SeqCst);
    }

    pub fn streams_started(&self) -> usize {
        self.state.streams_started.load(Ordering::SeqCst)
    }

    pub fn streams_stopped(&self) -> usize {
        self.state.streams_stopped.load(Ordering::SeqCst)
    }

    pub fn active_streams(&self) -> usize {
        live_count(&self.state.streams)
    }

    pub fn last_stream_size(&self) -> Option<(u32, u32)> {
        self.state.stream_sizes.lock().unwrap().last().copied()
    }

    /// End every live stream abnormally, as when the window closes.
    pub fn terminate_streams(&self, reason: &str) {
        let callbacks: Vec<Arc<dyn Fn(String) + Send + Sync>> = {
            let streams = self.state.streams.lock().unwrap();
            streams
                .iter()
                .filter(|r| r.live.swap(false, Ordering::SeqCst))
                .map(|r| Arc::clone(&r.callback))
                .collect()
        };
        for callback in callbacks {
            callback(reason.to_string());
        }
    }

    /// Deliver a stop to every stream ever started, live or not, as a
    /// backend might when callbacks arrive late.
    pub fn replay_stream_stops(&self, reason: &str) {
        let callbacks: Vec<Arc<dyn Fn(String) + Send + Sync>> = self
            .state
            .streams
            .lock()
            .unwrap()
            .iter()
            .map(|r| Arc::clone(&r.callback))
            .collect();
        for callback in callbacks {
            callback(reason.to_string());
        }
    }

    // Surfaces

    pub fn surfaces_created(&self) -> usize {
        self.state.surfaces.lock().unwrap().len()
    }

    pub fn open_surfaces(&self) -> usize {
        self.state
            .surfaces
            .lock()
            .unwrap()
            .iter()
            .filter(|s| !s.is_closed())
            .count()
    }

    pub fn last_surface(&self) -> Option<Arc<FakeSurface>> {
        self.state.surfaces.lock().unwrap().last().cloned()
    }
}

fn live_callbacks<F: ?Sized>(registry: &Mutex<Vec<Registration<F>>>) -> Vec<Arc<F>> {
    registry
        .lock()
        .unwrap()
        .iter()
        .filter(|r| r.live.load(Ordering::SeqCst))
        .map(|r| Arc::clone(&r.callback))
        .collect()
}

fn live_count<F: ?Sized>(registry: &Mutex<Vec<Registration<F>>>) -> usize {
    registry
        .lock()
        .unwrap()
        .iter()
        .filter(|r| r.live.load(Ordering::SeqCst))
        .count()
}

impl WindowDiscovery for FakePlatform {
    fn enumerate(&self) -> Result<Vec<TargetWindowRef>, DiscoveryError> {
        Ok(self.state.windows.lock().unwrap().clone())
    }
}

impl CapabilityService for FakePlatform {
    fn has_permission(&self) -> bool {
        self.state.permission.load(Ordering::SeqCst)
    }

    fn request_permission(&self) {
        self.state.permission_requests.fetch_add(1, Ordering::SeqCst);
        if self.state.grant_on_request.load(Ordering::SeqCst) {
            self.set_permission(true);
        }
    }
}

impl Workspace for FakePlatform {
    fn own_pid(&self) -> i32 {
        OWN_PID
    }

    fn frontmost_pid(&self) -> Option<i32> {
        *self.state.frontmost.lock().unwrap()
    }

    fn activate(&self, pid: i32) -> bool {
        self.state.activations.lock().unwrap().push(pid);
        self.set_frontmost(Some(pid));
        true
    }

    fn cursor_location(&self) -> Option<Point> {
        *self.state.cursor.lock().unwrap()
    }

    fn primary_display_height(&self) -> f64 {
        PRIMARY_HEIGHT
    }

    fn backing_scale(&self) -> f64 {
        2.0
    }

    fn subscribe_activations(
        &self,
        on_activated: ActivationCallback,
    ) -> Result<Box<dyn Subscription>, PlatformError> {
        let live = Arc::new(AtomicBool::new(true));
        self.state
            .activation_subscribers
            .lock()
            .unwrap()
            .push(Registration {
                live: Arc::clone(&live),
                callback: Arc::from(on_activated),
            });
        Ok(Box::new(FakeSubscription { live }))
    }
}

impl GeometryObserver for FakePlatform {
    fn observe_geometry(
        &self,
        _handle: &WindowHandle,
        _pid: i32,
        on_changed: GeometryCallback,
    ) -> Result<Box<dyn Subscription>, PlatformError> {
        if self.state.fail_geometry.load(Ordering::SeqCst) {
            return Err(PlatformError::SubscriptionFailed {
                kind: "window geometry",
                message: "observer refused".to_string(),
            });
        }
        let live = Arc::new(AtomicBool::new(true));
        self.state
            .geometry_subscribers
            .lock()
            .unwrap()
            .push(Registration {
                live: Arc::clone(&live),
                callback: Arc::from(on_changed),
            });
        Ok(Box::new(FakeSubscription { live }))
    }
}

impl CaptureBackend for FakePlatform {
    fn shareable_windows(&self) -> BoxFuture<'static, Result<Vec<ShareableWindow>, CaptureError>> {
        let state = Arc::clone(&self.state);
        Box::pin(async move {
            let delay = *state.snapshot_delay.lock().unwrap();
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            Ok(state.shareable.lock().unwrap().clone())
        })
    }

    fn start_stream(
        &self,
        request: StreamRequest,
    ) -> BoxFuture<'static, Result<Box<dyn CaptureStream>, CaptureError>> {
        let state = Arc::clone(&self.state);
        Box::pin(async move {
            let delay = *state.stream_start_delay.lock().unwrap();
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if state.fail_stream.load(Ordering::SeqCst) {
                return Err(CaptureError::StreamStartFailed {
                    message: "stream refused".to_string(),
                });
            }

            state.streams_started.fetch_add(1, Ordering::SeqCst);
            state
                .stream_sizes
                .lock()
                .unwrap()
                .push((request.width, request.height));

            let live = Arc::new(AtomicBool::new(true));
            let on_stopped: StopSink = request.on_stopped;
            state.streams.lock().unwrap().push(Registration {
                live: Arc::clone(&live),
                callback: on_stopped,
            });

            if state.emit_frame_on_start.load(Ordering::SeqCst) {
                (request.on_frame)(Frame {
                    width: request.width,
                    height: request.height,
                    bytes_per_row: request.width as usize * 4,
                    pixels: Arc::new(Vec::new()),
                });
            }

            Ok(Box::new(FakeStream {
                live,
                stopped: false,
                stops: Arc::clone(&state.streams_stopped),
            }) as Box<dyn CaptureStream>)
        })
    }
}

impl SurfaceBackend for FakePlatform {
    fn create_surface(&self, rect: SurfaceRect) -> Result<Arc<dyn RenderSurface>, PlatformError> {
        let surface = Arc::new(FakeSurface {
            rect: Mutex::new(rect),
            ..Default::default()
        });
        self.state.surfaces.lock().unwrap().push(Arc::clone(&surface));
        Ok(surface)
    }
}
