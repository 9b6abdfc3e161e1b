use std::fmt;
use std::sync::Arc;

use super::geometry::WindowBounds;

/// A live window the platform can query and act on.
///
/// Implementations wrap whatever the OS hands out (an accessibility element
/// on macOS). A handle can go stale at any time, so every action starts by
/// calling [`WindowElement::is_valid`].
pub trait WindowElement: Send + Sync {
    /// Stable identifier for equality and logging.
    fn id(&self) -> u64;

    fn is_valid(&self) -> bool;

    /// Bring the window to the front. The return value reports whether the
    /// platform accepted the request; a rejection is not a failure.
    fn raise(&self) -> bool;

    fn bounds(&self) -> Option<WindowBounds>;

    fn title(&self) -> Option<String>;
}

/// Shared, cheaply cloneable window handle.
#[derive(Clone)]
pub struct WindowHandle(Arc<dyn WindowElement>);

impl WindowHandle {
    pub fn new(element: Arc<dyn WindowElement>) -> Self {
        Self(element)
    }

    pub fn id(&self) -> u64 {
        self.0.id()
    }

    pub fn is_valid(&self) -> bool {
        self.0.is_valid()
    }

    pub fn raise(&self) -> bool {
        self.0.raise()
    }

    pub fn bounds(&self) -> Option<WindowBounds> {
        self.0.bounds()
    }

    pub fn title(&self) -> Option<String> {
        self.0.title()
    }
}

impl PartialEq for WindowHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for WindowHandle {}

impl fmt::Debug for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("WindowHandle").field(&self.id()).finish()
    }
}

/// The window a pin refers to.
///
/// `title` and `bounds` are refreshed from move notifications while pinned.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetWindowRef {
    pub pid: i32,
    pub process_name: String,
    pub bundle_id: Option<String>,
    pub handle: WindowHandle,
    pub title: String,
    pub bounds: WindowBounds,
}

impl TargetWindowRef {
    /// Human-readable label used in logs and CLI output.
    pub fn label(&self) -> String {
        if self.title.is_empty() {
            self.process_name.clone()
        } else {
            format!("{} - {}", self.process_name, self.title)
        }
    }
}

impl fmt::Display for TargetWindowRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (pid {})", self.label(), self.pid)
    }
}
