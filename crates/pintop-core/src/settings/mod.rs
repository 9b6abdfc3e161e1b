//! Persisted user settings.
//!
//! One JSON record at `~/.pintop/settings.json` holding the raise interval,
//! the focus-steal flag and the identity of the last pinned window.

pub mod errors;
pub mod store;
pub mod types;

pub use errors::SettingsError;
pub use store::SettingsStore;
pub use types::{
    DEFAULT_RAISE_INTERVAL_SECS, MAX_RAISE_INTERVAL_SECS, MIN_RAISE_INTERVAL_SECS, Settings,
    clamp_raise_interval,
};
