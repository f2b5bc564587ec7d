use std::sync::Arc;

use chrono::Utc;
use rand::{Rng, distributions::Alphanumeric};
use serde::{Deserialize, Serialize};

use super::{KeyValueStore, StorageError};

pub const CUSTOM_SOUNDS_KEY: &str = "alarma_custom_sounds";

const ID_SUFFIX_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomSound {
    pub id: String,
    pub name: String,
    pub data_url: String,
}

/// User-uploaded sounds, referenced from alarms as `custom:<id>`.
pub struct SoundLibrary {
    store: Arc<dyn KeyValueStore>,
    sounds: Vec<CustomSound>,
}

impl SoundLibrary {
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let sounds = read_sounds(store.as_ref());
        Self { store, sounds }
    }

    pub fn list(&self) -> &[CustomSound] {
        &self.sounds
    }

    pub fn get(&self, id: &str) -> Option<&CustomSound> {
        self.sounds.iter().find(|sound| sound.id == id)
    }

    pub fn add(&mut self, name: impl Into<String>, data_url: impl Into<String>) -> CustomSound {
        let sound = CustomSound {
            id: new_sound_id(&mut rand::thread_rng()),
            name: name.into(),
            data_url: data_url.into(),
        };

        self.sounds.push(sound.clone());
        self.persist();
        log::info!("Added custom sound. [sound_id = {}]", sound.id);

        sound
    }

    pub fn remove(&mut self, id: &str) {
        let before = self.sounds.len();
        self.sounds.retain(|sound| sound.id != id);
        if self.sounds.len() != before {
            self.persist();
        }
    }

    fn persist(&self) {
        let result = serde_json::to_string(&self.sounds)
            .map_err(StorageError::from)
            .and_then(|json| self.store.set(CUSTOM_SOUNDS_KEY, &json));

        if let Err(error) = result {
            log::error!("Could not persist custom sounds. [error = {}]", error);
        }
    }
}

fn new_sound_id(rng: &mut impl Rng) -> String {
    let suffix: String = rng
        .sample_iter(&Alphanumeric)
        .map(|c| char::from(c).to_ascii_lowercase())
        .take(ID_SUFFIX_LEN)
        .collect();

    format!("{}-{}", Utc::now().timestamp_millis(), suffix)
}

fn read_sounds(store: &dyn KeyValueStore) -> Vec<CustomSound> {
    match store.get(CUSTOM_SOUNDS_KEY) {
        Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|error| {
            log::warn!("Stored custom sounds are corrupt. [error = {}]", error);
            Vec::new()
        }),
        Ok(None) => Vec::new(),
        Err(error) => {
            log::error!("Could not read custom sounds. [error = {}]", error);
            Vec::new()
        }
    }
}
