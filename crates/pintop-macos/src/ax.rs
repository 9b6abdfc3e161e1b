//! Accessibility window elements.

use std::ffi::c_void;

use accessibility_sys::{
    AXUIElementCopyAttributeValue, AXUIElementCreateApplication, AXUIElementPerformAction,
    AXUIElementRef, AXValueGetType, AXValueGetValue, kAXErrorSuccess, kAXPositionAttribute,
    kAXRaiseAction, kAXRoleAttribute, kAXSizeAttribute, kAXTitleAttribute, kAXValueTypeCGPoint,
    kAXValueTypeCGSize, kAXWindowsAttribute,
};
use core_foundation::array::{CFArrayGetCount, CFArrayGetValueAtIndex, CFArrayRef};
use core_foundation::base::{CFGetTypeID, CFRelease, CFRetain, CFTypeRef, TCFType};
use core_foundation::string::CFString;
use core_graphics::geometry::{CGPoint, CGSize};
use pintop_core::window::{WindowBounds, WindowElement};
use tracing::debug;

/// Bounds from CGWindowList and from AX can disagree by a rounding step.
const BOUNDS_MATCH_SLOP: f64 = 2.0;

// SAFETY: FFI declaration for AXIsProcessTrusted from ApplicationServices.
// Returns whether this process has Accessibility permission.
#[link(name = "ApplicationServices", kind = "framework")]
unsafe extern "C" {
    fn AXIsProcessTrusted() -> bool;
}

pub(crate) fn is_process_trusted() -> bool {
    // SAFETY: no arguments, no side effects.
    unsafe { AXIsProcessTrusted() }
}

/// Owned CoreFoundation reference. Calls `CFRelease` on drop.
pub(crate) struct CfRef(*mut c_void);

impl CfRef {
    /// Take ownership of a +1 reference. Returns `None` if null.
    pub(crate) fn wrap(ptr: *mut c_void) -> Option<Self> {
        if ptr.is_null() { None } else { Some(Self(ptr)) }
    }

    /// Retain a borrowed reference.
    fn retain(ptr: *const c_void) -> Option<Self> {
        if ptr.is_null() {
            return None;
        }
        // SAFETY: non-null CF object borrowed from a live container.
        let retained = unsafe { CFRetain(ptr) };
        Self::wrap(retained as *mut c_void)
    }

    pub(crate) fn as_ptr(&self) -> *mut c_void {
        self.0
    }

    pub(crate) fn as_type<T>(&self) -> *mut T {
        self.0 as *mut T
    }
}

impl Drop for CfRef {
    fn drop(&mut self) {
        // SAFETY: we own exactly one reference.
        unsafe { CFRelease(self.0 as CFTypeRef) };
    }
}

fn copy_attribute(element: AXUIElementRef, attribute: &str) -> Option<CfRef> {
    let attribute = CFString::new(attribute);
    let mut value: CFTypeRef = std::ptr::null();
    // SAFETY: `element` is a live AX element; on success `value` is +1.
    let result =
        unsafe { AXUIElementCopyAttributeValue(element, attribute.as_concrete_TypeRef(), &mut value) };
    if result != kAXErrorSuccess {
        return None;
    }
    CfRef::wrap(value as *mut c_void)
}

fn copy_string_attribute(element: AXUIElementRef, attribute: &str) -> Option<String> {
    let value = copy_attribute(element, attribute)?;
    // SAFETY: type-checked before the get-rule wrap; `value` keeps it alive.
    unsafe {
        if CFGetTypeID(value.as_ptr() as CFTypeRef) != CFString::type_id() {
            return None;
        }
        Some(CFString::wrap_under_get_rule(value.as_ptr() as _).to_string())
    }
}

fn copy_bounds(element: AXUIElementRef) -> Option<WindowBounds> {
    let position = copy_attribute(element, kAXPositionAttribute)?;
    let size = copy_attribute(element, kAXSizeAttribute)?;

    let position_ref = position.as_type::<accessibility_sys::__AXValue>();
    let size_ref = size.as_type::<accessibility_sys::__AXValue>();

    let mut origin = CGPoint::new(0.0, 0.0);
    let mut extent = CGSize::new(0.0, 0.0);
    // SAFETY: both values are live AXValues; types are checked before reading.
    unsafe {
        if AXValueGetType(position_ref) != kAXValueTypeCGPoint
            || AXValueGetType(size_ref) != kAXValueTypeCGSize
        {
            return None;
        }
        let read_origin = AXValueGetValue(
            position_ref,
            kAXValueTypeCGPoint,
            (&mut origin as *mut CGPoint).cast::<c_void>(),
        );
        let read_extent = AXValueGetValue(
            size_ref,
            kAXValueTypeCGSize,
            (&mut extent as *mut CGSize).cast::<c_void>(),
        );
        if !read_origin || !read_extent {
            return None;
        }
    }

    Some(WindowBounds::new(origin.x, origin.y, extent.width, extent.height))
}

fn bounds_close(a: &WindowBounds, b: &WindowBounds) -> bool {
    (a.x - b.x).abs() <= BOUNDS_MATCH_SLOP
        && (a.y - b.y).abs() <= BOUNDS_MATCH_SLOP
        && (a.width - b.width).abs() <= BOUNDS_MATCH_SLOP
        && (a.height - b.height).abs() <= BOUNDS_MATCH_SLOP
}

/// An AX window element for one on-screen window.
///
/// `id` is the CoreGraphics window number the element was matched against.
pub(crate) struct AxWindow {
    id: u64,
    element: CfRef,
}

// SAFETY: AXUIElement is an immutable CF object. AX calls are IPC requests
// to the owning app and may be made from any thread.
unsafe impl Send for AxWindow {}
unsafe impl Sync for AxWindow {}

impl AxWindow {
    /// Find the AX window of `pid` whose frame matches `bounds`. When several
    /// match, the one whose title also matches wins.
    pub(crate) fn resolve(id: u64, pid: i32, bounds: &WindowBounds, title: &str) -> Option<Self> {
        // SAFETY: returns a +1 application element or null.
        let app = CfRef::wrap(unsafe { AXUIElementCreateApplication(pid) } as *mut c_void)?;
        let windows = copy_attribute(app.as_type(), kAXWindowsAttribute)?;

        let array = windows.as_ptr() as CFArrayRef;
        // SAFETY: kAXWindowsAttribute yields a CFArray of AXUIElements.
        let count = unsafe { CFArrayGetCount(array) };

        let mut fallback = None;
        for index in 0..count {
            // SAFETY: index is in range; the array keeps the value alive.
            let raw = unsafe { CFArrayGetValueAtIndex(array, index) };
            let Some(element) = CfRef::retain(raw) else {
                continue;
            };
            let Some(candidate_bounds) = copy_bounds(element.as_type()) else {
                continue;
            };
            if !bounds_close(&candidate_bounds, bounds) {
                continue;
            }

            let candidate_title = copy_string_attribute(element.as_type(), kAXTitleAttribute);
            if candidate_title.as_deref().unwrap_or_default() == title {
                return Some(Self { id, element });
            }
            if fallback.is_none() {
                fallback = Some(element);
            }
        }

        if fallback.is_none() {
            debug!(event = "macos.ax.window_unresolved", pid = pid, window_id = id);
        }
        fallback.map(|element| Self { id, element })
    }

    pub(crate) fn element(&self) -> AXUIElementRef {
        self.element.as_type()
    }
}

impl WindowElement for AxWindow {
    fn id(&self) -> u64 {
        self.id
    }

    fn is_valid(&self) -> bool {
        // A destroyed window answers kAXErrorInvalidUIElement for every attribute.
        copy_attribute(self.element(), kAXRoleAttribute).is_some()
    }

    fn raise(&self) -> bool {
        let action = CFString::new(kAXRaiseAction);
        // SAFETY: live element, static action name.
        let result = unsafe { AXUIElementPerformAction(self.element(), action.as_concrete_TypeRef()) };
        result == kAXErrorSuccess
    }

    fn bounds(&self) -> Option<WindowBounds> {
        copy_bounds(self.element())
    }

    fn title(&self) -> Option<String> {
        copy_string_attribute(self.element(), kAXTitleAttribute)
    }
}
