use std::path::Path;

use anyhow::Context;

use vidgrab_core::models::settings::AppSettings;

/// Missing file means defaults; a malformed one is reported and ignored.
pub fn load_settings(path: &Path) -> AppSettings {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return AppSettings::default(),
        Err(e) => {
            tracing::warn!("[settings] could not read {}: {}", path.display(), e);
            return AppSettings::default();
        }
    };

    match serde_json::from_str::<AppSettings>(&raw) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::warn!("[settings] ignoring malformed {}: {}", path.display(), e);
            AppSettings::default()
        }
    }
}

pub fn save_settings(path: &Path, settings: &AppSettings) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(settings)?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// Like [`load_settings`], but writes the defaults out when no file exists yet.
pub fn load_or_init_settings(path: &Path) -> AppSettings {
    if path.exists() {
        return load_settings(path);
    }
    let settings = AppSettings::default();
    match save_settings(path, &settings) {
        Ok(()) => tracing::info!("[settings] wrote defaults to {}", path.display()),
        Err(e) => tracing::warn!("[settings] could not write defaults: {:#}", e),
    }
    settings
}
