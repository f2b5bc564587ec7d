use std::sync::Arc;

use crate::settings::{AnimationStyle, Settings, Theme, clamp_volume};

use super::{KeyValueStore, StorageError};

pub const SETTINGS_KEY: &str = "alarma_settings";

/// Owns the user settings and writes them back after every change.
pub struct SettingsStore {
    store: Arc<dyn KeyValueStore>,
    settings: Settings,
}

impl SettingsStore {
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let settings = read_settings(store.as_ref());
        Self { store, settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn update(&mut self, change: impl FnOnce(&mut Settings)) {
        change(&mut self.settings);
        self.persist();
    }

    pub fn toggle_dark_mode(&mut self) {
        self.update(|settings| settings.is_dark_mode = !settings.is_dark_mode);
    }

    pub fn toggle_time_format(&mut self) {
        self.update(|settings| settings.is_24_hour_format = !settings.is_24_hour_format);
    }

    pub fn toggle_voice(&mut self) {
        self.update(|settings| settings.voice_enabled = !settings.voice_enabled);
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.update(|settings| settings.theme = theme);
    }

    pub fn set_animation_style(&mut self, style: AnimationStyle) {
        self.update(|settings| settings.animation_style = style);
    }

    pub fn set_volume(&mut self, volume: i64) {
        self.update(|settings| settings.alarm_volume = clamp_volume(volume));
    }

    fn persist(&self) {
        let result = serde_json::to_string(&self.settings)
            .map_err(StorageError::from)
            .and_then(|json| self.store.set(SETTINGS_KEY, &json));

        if let Err(error) = result {
            log::error!("Could not persist settings. [error = {}]", error);
        }
    }
}

fn read_settings(store: &dyn KeyValueStore) -> Settings {
    let raw = match store.get(SETTINGS_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Settings::default(),
        Err(error) => {
            log::error!("Could not read stored settings. [error = {}]", error);
            return Settings::default();
        }
    };

    Settings::from_stored(&raw).unwrap_or_else(|error| {
        log::error!("Stored settings are corrupt, using defaults. [error = {}]", error);
        Settings::default()
    })
}
