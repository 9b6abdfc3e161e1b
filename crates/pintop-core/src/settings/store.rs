use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use super::errors::SettingsError;
use super::types::{Settings, clamp_raise_interval};
use crate::identity::PinnedIdentity;

/// Settings backed by a JSON file, or held in memory.
///
/// Every setter writes the whole record through before returning. A store
/// opened over a corrupt file starts from defaults and reports the problem
/// through [`SettingsStore::load_error`].
#[derive(Debug)]
pub struct SettingsStore {
    path: Option<PathBuf>,
    data: Mutex<Settings>,
    load_error: Option<String>,
}

impl SettingsStore {
    /// Open `~/.pintop/settings.json`, or `PINTOP_SETTINGS_FILE` when set.
    pub fn open_default() -> Self {
        Self::open(settings_file_path())
    }

    pub fn open(path: PathBuf) -> Self {
        let (data, load_error) = load_settings(&path);
        Self {
            path: Some(path),
            data: Mutex::new(data),
            load_error,
        }
    }

    pub fn in_memory() -> Self {
        Self {
            path: None,
            data: Mutex::new(Settings::default()),
            load_error: None,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub fn snapshot(&self) -> Settings {
        self.lock().clone()
    }

    pub fn last_pinned_identity(&self) -> Option<PinnedIdentity> {
        self.lock().last_pinned_identity.clone()
    }

    pub fn set_last_pinned_identity(&self, identity: PinnedIdentity) -> Result<(), SettingsError> {
        self.update(|s| s.last_pinned_identity = Some(identity))
    }

    pub fn raise_interval(&self) -> Duration {
        Duration::from_secs_f64(self.raise_interval_secs())
    }

    pub fn raise_interval_secs(&self) -> f64 {
        self.lock().raise_interval_secs()
    }

    /// Store a clamped raise interval and return the stored value.
    pub fn set_raise_interval(&self, secs: f64) -> Result<f64, SettingsError> {
        let clamped = clamp_raise_interval(secs);
        if clamped != secs {
            tracing::info!(
                event = "core.settings.raise_interval_clamped",
                requested = secs,
                stored = clamped
            );
        }
        self.update(|s| s.raise_interval_secs = Some(clamped))?;
        Ok(clamped)
    }

    pub fn allow_focus_steal(&self) -> bool {
        self.lock().allow_focus_steal
    }

    pub fn set_allow_focus_steal(&self, allow: bool) -> Result<(), SettingsError> {
        self.update(|s| s.allow_focus_steal = allow)
    }

    fn lock(&self) -> MutexGuard<'_, Settings> {
        // Poison is ignored: every update replaces whole fields.
        self.data.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn update(&self, apply: impl FnOnce(&mut Settings)) -> Result<(), SettingsError> {
        let mut data = self.lock();
        apply(&mut data);
        match &self.path {
            Some(path) => save_settings(path, &data),
            None => Ok(()),
        }
    }
}

fn load_settings(path: &Path) -> (Settings, Option<String>) {
    if !path.exists() {
        return (Settings::default(), None);
    }

    match std::fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str(&content) {
            Ok(data) => (data, None),
            Err(e) => {
                tracing::error!(
                    event = "core.settings.json_parse_failed",
                    path = %path.display(),
                    error = %e,
                    "Settings file exists but contains invalid JSON - using defaults"
                );
                (
                    Settings::default(),
                    Some(format!(
                        "Settings file corrupted ({}). Delete {} to reset.",
                        e,
                        path.display()
                    )),
                )
            }
        },
        Err(e) => {
            tracing::error!(
                event = "core.settings.load_failed",
                path = %path.display(),
                error = %e
            );
            (
                Settings::default(),
                Some(format!(
                    "Failed to read settings file: {}. Check permissions on {}",
                    e,
                    path.display()
                )),
            )
        }
    }
}

fn save_settings(path: &Path, data: &Settings) -> Result<(), SettingsError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| SettingsError::SaveFailed {
            message: format!("Failed to create directory ({}): {}", parent.display(), e),
        })?;
    }

    let json = serde_json::to_string_pretty(data).map_err(|e| SettingsError::SaveFailed {
        message: format!("Failed to serialize settings: {}", e),
    })?;

    std::fs::write(path, json).map_err(|e| SettingsError::SaveFailed {
        message: format!("Failed to write settings file ({}): {}", path.display(), e),
    })?;

    tracing::debug!(event = "core.settings.saved", path = %path.display());

    Ok(())
}

fn settings_file_path() -> PathBuf {
    // Allow override via env var for testing.
    if let Ok(path_str) = std::env::var("PINTOP_SETTINGS_FILE")
        && !path_str.is_empty()
    {
        return PathBuf::from(path_str);
    }

    match dirs::home_dir() {
        Some(home) => home.join(".pintop").join("settings.json"),
        None => {
            tracing::error!(
                event = "core.settings.home_dir_not_found",
                fallback = ".",
                "Could not determine home directory - using current directory as fallback"
            );
            PathBuf::from(".").join(".pintop").join("settings.json")
        }
    }
}
