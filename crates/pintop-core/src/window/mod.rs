//! Window references and the geometry shared by every strategy.

pub mod geometry;
pub mod types;

pub use geometry::{Point, SurfaceRect, WindowBounds, to_surface_rect};
pub use types::{TargetWindowRef, WindowElement, WindowHandle};
