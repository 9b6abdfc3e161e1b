//! Overlay Surface: shows the captured window in a floating, click-through
//! surface at the window's own position.

pub mod hover;
pub mod surface;

pub use hover::{FocusContext, HoverFocus};
pub use surface::{OverlayOptions, OverlaySurface};
