//! App lifecycle events shared by every pintop command.

use tracing::{error, info};

use crate::settings::SettingsStore;

pub fn log_app_startup(command: &str) {
    info!(
        event = "core.app.startup_completed",
        version = env!("CARGO_PKG_VERSION"),
        command = command,
        os = std::env::consts::OS
    );
}

/// Where the settings came from and what they hold.
pub fn log_settings_loaded(store: &SettingsStore) {
    info!(
        event = "core.app.settings_loaded",
        path = ?store.path(),
        raise_interval_secs = store.raise_interval_secs(),
        allow_focus_steal = store.allow_focus_steal(),
        has_last_pinned = store.last_pinned_identity().is_some(),
        fell_back_to_defaults = store.load_error().is_some()
    );
}

pub fn log_app_shutdown() {
    info!(event = "core.app.shutdown_started");
}

pub fn log_app_error(error: &dyn std::error::Error) {
    error!(
        event = "core.app.error_occurred",
        error = %error,
        error_type = std::any::type_name_of_val(error)
    );
}
