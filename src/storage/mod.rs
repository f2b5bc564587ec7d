mod alarm_repository;
mod kv_store;
mod model;
mod settings_store;
mod sound_library;

pub use alarm_repository::{ALARMS_KEY, AlarmIdGenerator, AlarmRepository};
pub use kv_store::{FileKeyValueStore, InMemoryKeyValueStore, KeyValueStore, StorageError};
pub use model::NewAlarm;
pub use settings_store::{SETTINGS_KEY, SettingsStore};
pub use sound_library::{CUSTOM_SOUNDS_KEY, CustomSound, SoundLibrary};
