use crate::alarm::{
    Alarm, AlarmId, AlarmOrigin, AlarmPriority, AlarmSound, AlarmTime, DayIndex,
};

/// Alarm record before the repository assigns it an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAlarm {
    pub time: AlarmTime,
    pub label: String,
    pub days: Vec<DayIndex>,
    pub sound: AlarmSound,
    pub enabled: bool,
    pub priority: AlarmPriority,
    pub vibrate: bool,
    pub gradual_wake: bool,
    pub challenge_mode: bool,
    pub use_voice: bool,
    pub origin: AlarmOrigin,
}

impl NewAlarm {
    pub fn into_alarm(self, id: AlarmId) -> Alarm {
        Alarm {
            id,
            time: self.time,
            label: self.label,
            days: self.days,
            sound: self.sound,
            enabled: self.enabled,
            priority: self.priority,
            vibrate: self.vibrate,
            gradual_wake: self.gradual_wake,
            challenge_mode: self.challenge_mode,
            use_voice: self.use_voice,
            origin: self.origin,
        }
    }
}

impl From<&Alarm> for NewAlarm {
    fn from(alarm: &Alarm) -> Self {
        Self {
            time: alarm.time,
            label: alarm.label.clone(),
            days: alarm.days.clone(),
            sound: alarm.sound.clone(),
            enabled: alarm.enabled,
            priority: alarm.priority,
            vibrate: alarm.vibrate,
            gradual_wake: alarm.gradual_wake,
            challenge_mode: alarm.challenge_mode,
            use_voice: alarm.use_voice,
            origin: alarm.origin,
        }
    }
}
