use std::sync::Arc;

use chrono::Utc;

use crate::alarm::{Alarm, AlarmId};

use super::{KeyValueStore, NewAlarm, StorageError};

pub const ALARMS_KEY: &str = "alarma_alarms";

/// Clock-based ids that stay unique when several alarms are created within the same millisecond.
#[derive(Debug, Default)]
pub struct AlarmIdGenerator {
    last_id: AlarmId,
}

impl AlarmIdGenerator {
    pub fn seeded(last_id: AlarmId) -> Self {
        Self { last_id }
    }

    pub fn next_id(&mut self) -> AlarmId {
        self.next_id_at(Utc::now().timestamp_millis())
    }

    pub fn next_id_at(&mut self, now_millis: i64) -> AlarmId {
        let id = match self.last_id.checked_add(1) {
            Some(next) => now_millis.max(next),
            None => {
                log::error!(
                    "Alarm id counter is exhausted, restarting from the clock. [last_id = {}]",
                    self.last_id
                );
                now_millis
            }
        };
        self.last_id = id;
        id
    }
}

/// In-memory list of alarms mirrored to the key-value store after every mutation.
pub struct AlarmRepository {
    store: Arc<dyn KeyValueStore>,
    alarms: Vec<Alarm>,
    ids: AlarmIdGenerator,
}

impl AlarmRepository {
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let alarms = read_alarms(store.as_ref());
        let last_id = alarms.iter().map(|alarm| alarm.id).max().unwrap_or_default();
        log::info!("Loaded alarms from storage. [count = {}]", alarms.len());

        Self {
            store,
            alarms,
            ids: AlarmIdGenerator::seeded(last_id),
        }
    }

    pub fn all(&self) -> &[Alarm] {
        &self.alarms
    }

    pub fn get(&self, id: AlarmId) -> Option<&Alarm> {
        self.alarms.iter().find(|alarm| alarm.id == id)
    }

    pub fn add(&mut self, new_alarm: NewAlarm) -> AlarmId {
        let id = self.ids.next_id();
        self.alarms.push(new_alarm.into_alarm(id));
        self.persist();

        log::info!("Added alarm. [alarm_id = {}]", id);
        id
    }

    /// Replaces every field except the id. Returns false when the id is unknown.
    pub fn update(&mut self, id: AlarmId, data: NewAlarm) -> bool {
        let Some(alarm) = self.alarms.iter_mut().find(|alarm| alarm.id == id) else {
            return false;
        };

        *alarm = data.into_alarm(id);
        self.persist();
        true
    }

    pub fn delete(&mut self, id: AlarmId) -> bool {
        let before = self.alarms.len();
        self.alarms.retain(|alarm| alarm.id != id);
        if self.alarms.len() == before {
            return false;
        }

        self.persist();
        true
    }

    pub fn toggle(&mut self, id: AlarmId) -> bool {
        self.modify(id, |alarm| alarm.enabled = !alarm.enabled)
    }

    pub fn set_enabled(&mut self, id: AlarmId, enabled: bool) -> bool {
        self.modify(id, |alarm| alarm.enabled = enabled)
    }

    fn modify(&mut self, id: AlarmId, change: impl FnOnce(&mut Alarm)) -> bool {
        match self.alarms.iter_mut().find(|alarm| alarm.id == id) {
            Some(alarm) => {
                change(alarm);
                self.persist();
                true
            }
            None => false,
        }
    }

    fn persist(&self) {
        let result = serde_json::to_string(&self.alarms)
            .map_err(StorageError::from)
            .and_then(|json| self.store.set(ALARMS_KEY, &json));

        if let Err(error) = result {
            log::error!(
                "Could not persist alarms, keeping in-memory state. [error = {}, count = {}]",
                error,
                self.alarms.len()
            );
        }
    }
}

fn read_alarms(store: &dyn KeyValueStore) -> Vec<Alarm> {
    let raw = match store.get(ALARMS_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(error) => {
            log::error!("Could not read stored alarms. [error = {}]", error);
            return Vec::new();
        }
    };

    serde_json::from_str(&raw).unwrap_or_else(|error| {
        log::error!(
            "Stored alarms are corrupt, starting with an empty list. [error = {}]",
            error
        );
        Vec::new()
    })
}
