pub mod layout;
pub mod settings;
pub mod source;

use once_cell::sync::OnceCell;

use settings::AppSettings;

static SETTINGS_OVERRIDE: OnceCell<AppSettings> = OnceCell::new();

/// Pin the settings for this process, e.g. when embedding the editor.
pub fn set_settings_override(settings: AppSettings) {
    if SETTINGS_OVERRIDE.set(settings).is_err() {
        log::warn!("settings override already set; ignoring");
    }
}

/// The override if one was set, else the user's settings file, else defaults.
pub fn effective_settings() -> AppSettings {
    if let Some(settings) = SETTINGS_OVERRIDE.get() {
        return settings.clone();
    }
    match AppSettings::load() {
        Ok(s) => s,
        Err(e) => {
            log::warn!("could not read settings, using defaults: {}", e);
            AppSettings::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_wins_over_the_settings_file() {
        let pinned = AppSettings { workspace: Some("pinned".into()), curve_offset: 40.0, ..Default::default() };
        set_settings_override(pinned.clone());
        // a second override is ignored
        set_settings_override(AppSettings::default());
        assert_eq!(effective_settings(), pinned);
    }
}
