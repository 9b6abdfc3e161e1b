//! Overlay panels.
//!
//! Panels are main-thread objects, so they live in a thread-local registry on
//! the main thread keyed by surface id. [`PanelSurface`] only holds the id and
//! queues work onto the main queue, which keeps operations in call order.

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use core_graphics::base::{
    kCGBitmapByteOrder32Little, kCGImageAlphaPremultipliedFirst, kCGRenderingIntentDefault,
};
use core_graphics::color_space::CGColorSpace;
use core_graphics::data_provider::CGDataProvider;
use core_graphics::image::CGImage;
use foreign_types_shared::ForeignType;
use objc2::rc::Retained;
use objc2::runtime::{AnyObject, Bool};
use objc2::{MainThreadOnly, class, msg_send};
use objc2_app_kit::{
    NSBackingStoreType, NSColor, NSPanel, NSWindowCollectionBehavior, NSWindowSharingType,
    NSWindowStyleMask,
};
use objc2_foundation::{MainThreadMarker, NSPoint, NSRect, NSSize, NSString};
use pintop_core::capture::Frame;
use pintop_core::platform::{PlatformError, RenderSurface, SurfaceBackend};
use pintop_core::window::SurfaceRect;
use tracing::{debug, warn};

use crate::main_thread::run_on_main;

/// NSFloatingWindowLevel.
const FLOATING_WINDOW_LEVEL: isize = 3;

thread_local! {
    static PANELS: RefCell<HashMap<u64, Retained<NSPanel>>> = RefCell::new(HashMap::new());
}

fn ns_rect(rect: SurfaceRect) -> NSRect {
    NSRect::new(NSPoint::new(rect.x, rect.y), NSSize::new(rect.width, rect.height))
}

fn with_panel(id: u64, work: impl FnOnce(&NSPanel)) {
    PANELS.with(|panels| match panels.borrow().get(&id) {
        Some(panel) => work(panel),
        None => debug!(event = "macos.surface.panel_missing", surface_id = id),
    });
}

#[derive(Default)]
pub(crate) struct PanelSurfaceBackend {
    next_id: AtomicU64,
}

impl SurfaceBackend for PanelSurfaceBackend {
    fn create_surface(&self, rect: SurfaceRect) -> Result<Arc<dyn RenderSurface>, PlatformError> {
        if rect.width <= 0.0 || rect.height <= 0.0 {
            return Err(PlatformError::SurfaceFailed {
                message: format!("empty surface rect {}x{}", rect.width, rect.height),
            });
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        run_on_main(move |mtm| create_panel(mtm, id, rect));
        debug!(event = "macos.surface.create_queued", surface_id = id);

        Ok(Arc::new(PanelSurface {
            id,
            pending: Arc::new(PendingFrame::default()),
        }))
    }
}

fn create_panel(mtm: MainThreadMarker, id: u64, rect: SurfaceRect) {
    let style = NSWindowStyleMask::Borderless | NSWindowStyleMask::NonactivatingPanel;
    // SAFETY: main thread; standard designated initializer.
    let panel = unsafe {
        NSPanel::initWithContentRect_styleMask_backing_defer(
            NSPanel::alloc(mtm),
            ns_rect(rect),
            style,
            NSBackingStoreType::Buffered,
            false,
        )
    };

    // SAFETY: plain property setters on a panel we own, on the main thread.
    unsafe {
        panel.setReleasedWhenClosed(false);
        panel.setLevel(FLOATING_WINDOW_LEVEL);
        panel.setFloatingPanel(true);
        panel.setHidesOnDeactivate(false);
        panel.setIgnoresMouseEvents(true);
        panel.setOpaque(false);
        panel.setHasShadow(false);
        panel.setBackgroundColor(Some(&NSColor::clearColor()));
        panel.setCollectionBehavior(
            NSWindowCollectionBehavior::CanJoinAllSpaces
                | NSWindowCollectionBehavior::FullScreenAuxiliary,
        );
        // Keep the overlay out of our own capture.
        panel.setSharingType(NSWindowSharingType::None);
    }

    if let Some(view) = panel.contentView() {
        view.setWantsLayer(true);
    }

    PANELS.with(|panels| panels.borrow_mut().insert(id, panel));
    debug!(event = "macos.surface.created", surface_id = id);
}

/// Latest frame waiting for the main thread. Frames that arrive while one is
/// queued replace it instead of queueing more work.
#[derive(Default)]
struct PendingFrame {
    frame: Mutex<Option<Frame>>,
    scheduled: AtomicBool,
}

impl PendingFrame {
    fn take(&self) -> Option<Frame> {
        self.scheduled.store(false, Ordering::Release);
        self.frame.lock().unwrap_or_else(|p| p.into_inner()).take()
    }
}

struct PanelSurface {
    id: u64,
    pending: Arc<PendingFrame>,
}

impl RenderSurface for PanelSurface {
    fn set_frame(&self, rect: SurfaceRect) {
        let id = self.id;
        run_on_main(move |_| {
            with_panel(id, |panel| panel.setFrame_display(ns_rect(rect), true));
        });
    }

    fn present(&self, frame: &Frame) {
        *self.pending.frame.lock().unwrap_or_else(|p| p.into_inner()) = Some(frame.clone());
        if self.pending.scheduled.swap(true, Ordering::AcqRel) {
            return;
        }

        let id = self.id;
        let pending = Arc::clone(&self.pending);
        run_on_main(move |_| {
            if let Some(frame) = pending.take() {
                with_panel(id, |panel| set_layer_contents(panel, &frame));
            }
        });
    }

    fn show(&self) {
        let id = self.id;
        run_on_main(move |_| with_panel(id, |panel| panel.orderFrontRegardless()));
    }

    fn close(&self) {
        let id = self.id;
        run_on_main(move |_| {
            if let Some(panel) = PANELS.with(|panels| panels.borrow_mut().remove(&id)) {
                panel.orderOut(None);
                panel.close();
                debug!(event = "macos.surface.closed", surface_id = id);
            }
        });
    }
}

fn frame_image(frame: &Frame) -> CGImage {
    let provider = CGDataProvider::from_buffer(Arc::clone(&frame.pixels));
    let color_space = CGColorSpace::create_device_rgb();
    // BGRA in memory is premultiplied-first, little-endian 32-bit.
    CGImage::new(
        frame.width as usize,
        frame.height as usize,
        8,
        32,
        frame.bytes_per_row,
        &color_space,
        kCGImageAlphaPremultipliedFirst | kCGBitmapByteOrder32Little,
        &provider,
        false,
        kCGRenderingIntentDefault,
    )
}

fn set_layer_contents(panel: &NSPanel, frame: &Frame) {
    let Some(view) = panel.contentView() else {
        warn!(event = "macos.surface.no_content_view");
        return;
    };
    let image = frame_image(frame);
    let scale = panel.backingScaleFactor();

    // SAFETY: main thread. CGImage is a CF type and valid wherever an `id`
    // is expected; the layer retains it before `image` is dropped.
    unsafe {
        let layer: Option<Retained<AnyObject>> = msg_send![&*view, layer];
        let Some(layer) = layer else {
            return;
        };
        let gravity = NSString::from_str("resize");
        let contents = &*(image.as_ptr() as *const AnyObject);

        let transaction = class!(CATransaction);
        let _: () = msg_send![transaction, begin];
        let _: () = msg_send![transaction, setDisableActions: Bool::YES];
        let _: () = msg_send![&*layer, setContentsScale: scale];
        let _: () = msg_send![&*layer, setContentsGravity: &*gravity];
        let _: () = msg_send![&*layer, setContents: contents];
        let _: () = msg_send![transaction, commit];
    }
}
