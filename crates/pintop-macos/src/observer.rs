//! AXObserver-based move/resize notifications.
//!
//! Each subscription owns a thread running its own CFRunLoop with the
//! observer's source attached. Cancelling flips a flag; the thread notices
//! within one run loop slice, detaches and releases everything it created.

use std::ffi::c_void;
use std::ptr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread;

use accessibility_sys::{kAXMovedNotification, kAXResizedNotification};
use core_foundation::base::TCFType;
use core_foundation::runloop::kCFRunLoopDefaultMode;
use core_foundation::string::{CFString, CFStringRef};
use pintop_core::platform::{GeometryCallback, GeometryObserver, PlatformError, Subscription};
use pintop_core::window::{WindowBounds, WindowHandle};
use tracing::{debug, warn};

use crate::ax::{AxWindow, CfRef};

type AXObserverRef = *mut c_void;
type CFRunLoopRef = *mut c_void;
type CFRunLoopSourceRef = *mut c_void;

type AXObserverCallback = unsafe extern "C" fn(
    observer: AXObserverRef,
    element: *mut c_void,
    notification: CFStringRef,
    refcon: *mut c_void,
);

const AX_ERROR_SUCCESS: i32 = 0;

/// Run loop slice; bounds how long a cancelled observer lingers.
const SLICE_SECS: f64 = 0.25;

#[link(name = "ApplicationServices", kind = "framework")]
unsafe extern "C" {
    fn AXObserverCreate(
        application: i32,
        callback: AXObserverCallback,
        observer_out: *mut AXObserverRef,
    ) -> i32;

    fn AXObserverAddNotification(
        observer: AXObserverRef,
        element: *mut c_void,
        notification: CFStringRef,
        refcon: *mut c_void,
    ) -> i32;

    fn AXObserverRemoveNotification(
        observer: AXObserverRef,
        element: *mut c_void,
        notification: CFStringRef,
    ) -> i32;

    fn AXObserverGetRunLoopSource(observer: AXObserverRef) -> CFRunLoopSourceRef;
}

#[link(name = "CoreFoundation", kind = "framework")]
unsafe extern "C" {
    fn CFRunLoopGetCurrent() -> CFRunLoopRef;
    fn CFRunLoopAddSource(rl: CFRunLoopRef, source: CFRunLoopSourceRef, mode: CFStringRef);
    fn CFRunLoopRemoveSource(rl: CFRunLoopRef, source: CFRunLoopSourceRef, mode: CFStringRef);
    fn CFRunLoopRunInMode(mode: CFStringRef, seconds: f64, return_after_source_handled: u8) -> i32;
}

/// Called by the Accessibility framework on the observer thread.
///
/// # Safety
///
/// `refcon` is the `GeometryCallback` registered in `run_observer`, which
/// outlives every notification delivered on that thread.
unsafe extern "C" fn on_notification(
    _observer: AXObserverRef,
    _element: *mut c_void,
    _notification: CFStringRef,
    refcon: *mut c_void,
) {
    if refcon.is_null() {
        return;
    }
    let callback = unsafe { &*(refcon as *const GeometryCallback) };
    callback();
}

pub(crate) struct AxGeometryObserver;

impl GeometryObserver for AxGeometryObserver {
    fn observe_geometry(
        &self,
        handle: &WindowHandle,
        pid: i32,
        on_changed: GeometryCallback,
    ) -> Result<Box<dyn Subscription>, PlatformError> {
        let bounds = handle.bounds().ok_or_else(|| subscription_failed("window frame is unreadable"))?;
        let title = handle.title().unwrap_or_default();
        let window_id = handle.id();

        let live = Arc::new(AtomicBool::new(true));
        let (ready_tx, ready_rx) = mpsc::channel();

        let thread_live = Arc::clone(&live);
        thread::Builder::new()
            .name("pintop-geometry".to_string())
            .spawn(move || {
                let target = ObservedWindow {
                    id: window_id,
                    pid,
                    bounds,
                    title,
                };
                run_observer(target, on_changed, thread_live, ready_tx);
            })
            .map_err(|e| subscription_failed(&e.to_string()))?;

        match ready_rx.recv() {
            Ok(Ok(())) => {
                debug!(event = "macos.geometry.observer_attached", pid = pid, window_id = window_id);
                Ok(Box::new(GeometrySubscription { live }))
            }
            Ok(Err(message)) => Err(subscription_failed(&message)),
            Err(_) => Err(subscription_failed("observer thread exited during setup")),
        }
    }
}

fn subscription_failed(message: &str) -> PlatformError {
    PlatformError::SubscriptionFailed {
        kind: "geometry",
        message: message.to_string(),
    }
}

struct ObservedWindow {
    id: u64,
    pid: i32,
    bounds: WindowBounds,
    title: String,
}

fn run_observer(
    target: ObservedWindow,
    on_changed: GeometryCallback,
    live: Arc<AtomicBool>,
    ready: mpsc::Sender<Result<(), String>>,
) {
    let Some(window) = AxWindow::resolve(target.id, target.pid, &target.bounds, &target.title) else {
        let _ = ready.send(Err("window element not found".to_string()));
        return;
    };

    let mut raw_observer: AXObserverRef = ptr::null_mut();
    // SAFETY: out-pointer is valid; the callback matches the C signature.
    let result = unsafe { AXObserverCreate(target.pid, on_notification, &raw mut raw_observer) };
    let Some(observer) = CfRef::wrap(raw_observer).filter(|_| result == AX_ERROR_SUCCESS) else {
        let _ = ready.send(Err(format!("AXObserverCreate failed with error {result}")));
        return;
    };

    let callback_live = Arc::clone(&live);
    let guarded: GeometryCallback = Box::new(move || {
        if callback_live.load(Ordering::Acquire) {
            on_changed();
        }
    });
    let callback = Box::new(guarded);
    let refcon = (&*callback as *const GeometryCallback).cast_mut().cast::<c_void>();
    let element = window.element().cast::<c_void>();

    let mut registered = Vec::new();
    for name in [kAXMovedNotification, kAXResizedNotification] {
        let notification = CFString::new(name);
        // SAFETY: observer and element are live; `callback` outlives the registration.
        let added = unsafe {
            AXObserverAddNotification(
                observer.as_ptr(),
                element,
                notification.as_concrete_TypeRef(),
                refcon,
            )
        };
        if added == AX_ERROR_SUCCESS {
            registered.push(notification);
        } else {
            warn!(
                event = "macos.geometry.notification_failed",
                notification = name,
                error_code = added
            );
        }
    }
    if registered.is_empty() {
        let _ = ready.send(Err("no geometry notifications could be registered".to_string()));
        return;
    }

    // SAFETY: the source is owned by the observer, which outlives the loop below.
    let (run_loop, source) = unsafe {
        let run_loop = CFRunLoopGetCurrent();
        let source = AXObserverGetRunLoopSource(observer.as_ptr());
        CFRunLoopAddSource(run_loop, source, kCFRunLoopDefaultMode);
        (run_loop, source)
    };

    if ready.send(Ok(())).is_err() {
        live.store(false, Ordering::Release);
    }

    while live.load(Ordering::Acquire) {
        // SAFETY: this thread's run loop, valid mode constant.
        unsafe {
            CFRunLoopRunInMode(kCFRunLoopDefaultMode, SLICE_SECS, 1);
        }
    }

    // SAFETY: undo exactly what was registered above, before the callback is freed.
    unsafe {
        for notification in &registered {
            AXObserverRemoveNotification(observer.as_ptr(), element, notification.as_concrete_TypeRef());
        }
        CFRunLoopRemoveSource(run_loop, source, kCFRunLoopDefaultMode);
    }
    drop(observer);
    drop(callback);
    debug!(event = "macos.geometry.observer_detached", window_id = target.id);
}

struct GeometrySubscription {
    live: Arc<AtomicBool>,
}

impl Subscription for GeometrySubscription {
    fn cancel(&mut self) {
        self.live.store(false, Ordering::Release);
    }
}

impl Drop for GeometrySubscription {
    fn drop(&mut self) {
        self.cancel();
    }
}
