//! pintop-core: keep one chosen window on top of all others
//!
//! The core owns the pin lifecycle: it decides between a live-capture overlay
//! and a timer-driven raise loop, manages whichever is running, and falls back
//! when the overlay cannot start. Everything the OS provides comes in through
//! the traits in [`platform`].
//!
//! # Main Entry Points
//!
//! - [`pin`] - The pin controller and its handle
//! - [`settings`] - Persisted user settings
//! - [`identity`] - Re-find the last pinned window after a relaunch
//! - [`config`] - Tunables loaded from TOML

pub mod capture;
pub mod config;
pub mod errors;
pub mod events;
pub mod identity;
pub mod logging;
pub mod overlay;
pub mod pin;
pub mod platform;
pub mod raise;
pub mod settings;
pub mod strategy;
pub mod tracker;
pub mod window;

// Re-export commonly used types at crate root for convenience
pub use config::PintopConfig;
pub use errors::{PintopError, PintopResult};
pub use identity::PinnedIdentity;
pub use pin::{ControllerError, PinController, PinHandle, PinState};
pub use platform::Platform;
pub use settings::{SettingsError, SettingsStore};
pub use strategy::StrategyKind;
pub use window::{Point, TargetWindowRef, WindowBounds, WindowElement, WindowHandle};

pub use logging::init_logging;
