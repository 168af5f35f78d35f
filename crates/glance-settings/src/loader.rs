//! Settings file loading, deep merge, and environment overrides.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::errors::{Result, SettingsError};
use crate::types::GlanceSettings;

/// Default settings file location: `~/.glance/settings.json`.
pub fn settings_path() -> PathBuf {
    let home = std::env::var_os("HOME").map_or_else(|| PathBuf::from("."), PathBuf::from);
    home.join(".glance").join("settings.json")
}

/// Deep-merge `overlay` into `base`.
///
/// Objects merge recursively; any other value in the overlay replaces the
/// base value wholesale.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => overlay_value,
                };
                let _ = base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }
        (_, overlay) => overlay,
    }
}

/// Load settings from the default path with env overrides applied.
pub fn load_settings() -> Result<GlanceSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific file, deep-merged over compiled defaults,
/// then apply `GLANCE_*` environment overrides.
///
/// A missing file is not an error — defaults (plus env) apply.
pub fn load_settings_from_path(path: &Path) -> Result<GlanceSettings> {
    let defaults = serde_json::to_value(GlanceSettings::default())?;

    let merged = if path.exists() {
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file_value: Value = serde_json::from_str(&text)?;
        deep_merge(defaults, file_value)
    } else {
        defaults
    };

    let mut settings: GlanceSettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings, |name| std::env::var(name).ok());
    Ok(settings)
}

/// Apply environment overrides (highest priority layer).
///
/// `lookup` abstracts `std::env::var` so tests stay hermetic.
pub fn apply_env_overrides<F>(settings: &mut GlanceSettings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(dir) = lookup("GLANCE_INTEGRATIONS_DIR") {
        settings.integrations.directory = Some(dir);
    }
    if let Some(interpreter) = lookup("GLANCE_INTERPRETER") {
        settings.integrations.interpreter = interpreter;
    }
    if let Some(ms) = lookup("GLANCE_RUN_TIMEOUT_MS") {
        match ms.parse() {
            Ok(parsed) => settings.engine.run_timeout_ms = parsed,
            Err(_) => tracing::warn!(value = %ms, "ignoring non-numeric GLANCE_RUN_TIMEOUT_MS"),
        }
    }
    if let Some(ms) = lookup("GLANCE_SHOULD_RUN_TIMEOUT_MS") {
        match ms.parse() {
            Ok(parsed) => settings.engine.should_run_timeout_ms = parsed,
            Err(_) => {
                tracing::warn!(value = %ms, "ignoring non-numeric GLANCE_SHOULD_RUN_TIMEOUT_MS");
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
