//! Collaborator interfaces the core needs from the operating system.
//!
//! The core never talks to the OS directly. A [`Platform`] bundles one
//! implementation of each trait and is injected into the controller at
//! construction.

pub mod errors;
#[cfg(test)]
pub mod fake;
pub mod traits;

use std::sync::Arc;

pub use errors::{DiscoveryError, PlatformError};
pub use traits::{
    ActivationCallback, CapabilityService, CaptureBackend, CaptureStream, GeometryCallback,
    GeometryObserver, RenderSurface, Subscription, SurfaceBackend, WindowDiscovery, Workspace,
};

/// Every OS service the controller depends on.
#[derive(Clone)]
pub struct Platform {
    pub discovery: Arc<dyn WindowDiscovery>,
    pub capability: Arc<dyn CapabilityService>,
    pub workspace: Arc<dyn Workspace>,
    pub geometry: Arc<dyn GeometryObserver>,
    pub capture: Arc<dyn CaptureBackend>,
    pub surfaces: Arc<dyn SurfaceBackend>,
}
