//! Main-thread plumbing: the run loop pump and main-queue dispatch.

use std::ffi::c_void;
use std::sync::atomic::{AtomicBool, Ordering};

use core_foundation::runloop::kCFRunLoopDefaultMode;
use core_foundation::string::CFStringRef;
use objc2_app_kit::{NSApplication, NSApplicationActivationPolicy};
use objc2_foundation::MainThreadMarker;
use tracing::{debug, error};

/// Seconds per run loop slice; bounds how long `run_until` takes to notice `done`.
const PUMP_SLICE_SECS: f64 = 0.1;

type MainJob = Box<dyn FnOnce(MainThreadMarker) + Send>;

#[link(name = "CoreFoundation", kind = "framework")]
unsafe extern "C" {
    fn CFRunLoopRunInMode(mode: CFStringRef, seconds: f64, return_after_source_handled: u8) -> i32;
}

// SAFETY: libdispatch is part of libSystem, which every macOS binary links.
unsafe extern "C" {
    static _dispatch_main_q: c_void;
    fn dispatch_async_f(
        queue: *const c_void,
        context: *mut c_void,
        work: extern "C" fn(*mut c_void),
    );
}

pub(crate) fn run_until(done: &AtomicBool) {
    let Some(mtm) = MainThreadMarker::new() else {
        error!(event = "macos.main_loop.wrong_thread");
        return;
    };

    // Accessory: no Dock icon, never steals key focus.
    let app = NSApplication::sharedApplication(mtm);
    app.setActivationPolicy(NSApplicationActivationPolicy::Accessory);

    debug!(event = "macos.main_loop.started");
    while !done.load(Ordering::Acquire) {
        // SAFETY: called on the main thread with a valid CF mode constant.
        unsafe {
            CFRunLoopRunInMode(kCFRunLoopDefaultMode, PUMP_SLICE_SECS, 0);
        }
    }
    debug!(event = "macos.main_loop.stopped");
}

/// Run `work` on the main thread. Runs inline when already there, otherwise
/// queues it behind earlier work on the main dispatch queue.
pub(crate) fn run_on_main<F>(work: F)
where
    F: FnOnce(MainThreadMarker) + Send + 'static,
{
    if let Some(mtm) = MainThreadMarker::new() {
        work(mtm);
        return;
    }

    let job: Box<MainJob> = Box::new(Box::new(work));
    let context = Box::into_raw(job).cast::<c_void>();
    // SAFETY: `context` is a leaked Box<MainJob> reclaimed exactly once by the
    // trampoline.
    unsafe {
        dispatch_async_f(&raw const _dispatch_main_q, context, run_main_job);
    }
}

extern "C" fn run_main_job(context: *mut c_void) {
    // SAFETY: produced by Box::into_raw in `run_on_main`.
    let job = unsafe { Box::from_raw(context.cast::<MainJob>()) };
    match MainThreadMarker::new() {
        Some(mtm) => job(mtm),
        None => error!(event = "macos.main_queue.not_main_thread"),
    }
}
