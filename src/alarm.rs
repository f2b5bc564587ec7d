use std::{fmt, str::FromStr};

use chrono::{Datelike, NaiveDateTime, NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

pub type AlarmId = i64;

/// Weekday index as stored in alarm records, 0 = Sunday .. 6 = Saturday.
pub type DayIndex = u8;

pub const MAX_DAY_INDEX: DayIndex = 6;

pub fn day_index(weekday: Weekday) -> DayIndex {
    weekday.num_days_from_sunday() as DayIndex
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("`{0}` is not a valid HH:MM time")]
pub struct InvalidAlarmTime(pub String);

/// Time of day an alarm fires at, with minute precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AlarmTime(NaiveTime);

impl AlarmTime {
    pub fn new(inner: NaiveTime) -> Self {
        let normalized_time = inner
            .with_nanosecond(0)
            .and_then(|t| t.with_second(0))
            .unwrap_or(inner);
        Self(normalized_time)
    }

    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self)
    }

    pub fn of(datetime: &NaiveDateTime) -> Self {
        Self::new(datetime.time())
    }

    pub fn time(&self) -> &NaiveTime {
        &self.0
    }

    pub fn hour(&self) -> u32 {
        self.0.hour()
    }

    pub fn minute(&self) -> u32 {
        self.0.minute()
    }

    /// Exact-minute equality against a wall-clock instant.
    pub fn matches(&self, now: &NaiveDateTime) -> bool {
        self.hour() == now.hour() && self.minute() == now.minute()
    }
}

impl FromStr for AlarmTime {
    type Err = InvalidAlarmTime;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidAlarmTime(s.to_owned());
        let (hours, minutes) = s.split_once(':').ok_or_else(invalid)?;
        let is_two_digits = |part: &str| part.len() == 2 && part.bytes().all(|b| b.is_ascii_digit());
        if !is_two_digits(hours) || !is_two_digits(minutes) {
            return Err(invalid());
        }

        let hours: u32 = hours.parse().map_err(|_| invalid())?;
        let minutes: u32 = minutes.parse().map_err(|_| invalid())?;
        Self::from_hm(hours, minutes).ok_or_else(invalid)
    }
}

impl TryFrom<String> for AlarmTime {
    type Error = InvalidAlarmTime;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AlarmTime> for String {
    fn from(value: AlarmTime) -> Self {
        value.to_string()
    }
}

impl fmt::Display for AlarmTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlarmPriority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

impl AlarmPriority {
    pub fn label(&self) -> &'static str {
        match self {
            AlarmPriority::Low => "LOW",
            AlarmPriority::Normal => "NORMAL",
            AlarmPriority::High => "HIGH",
            AlarmPriority::Urgent => "URGENT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinSound {
    Gentle,
    Energetic,
    Nature,
    Classic,
    Binaural,
    Piano,
    Cosmic,
}

impl BuiltinSound {
    pub const ALL: [BuiltinSound; 7] = [
        BuiltinSound::Gentle,
        BuiltinSound::Energetic,
        BuiltinSound::Nature,
        BuiltinSound::Classic,
        BuiltinSound::Binaural,
        BuiltinSound::Piano,
        BuiltinSound::Cosmic,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            BuiltinSound::Gentle => "gentle",
            BuiltinSound::Energetic => "energetic",
            BuiltinSound::Nature => "nature",
            BuiltinSound::Classic => "classic",
            BuiltinSound::Binaural => "binaural",
            BuiltinSound::Piano => "piano",
            BuiltinSound::Cosmic => "cosmic",
        }
    }

    fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|sound| sound.key() == key)
    }
}

const CUSTOM_SOUND_PREFIX: &str = "custom:";

/// Reference to the audio an alarm plays. Stored as a single string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AlarmSound {
    Builtin(BuiltinSound),
    Custom(String),
    Resource(String),
}

impl Default for AlarmSound {
    fn default() -> Self {
        AlarmSound::Builtin(BuiltinSound::Gentle)
    }
}

impl From<String> for AlarmSound {
    fn from(value: String) -> Self {
        if let Some(id) = value.strip_prefix(CUSTOM_SOUND_PREFIX) {
            return AlarmSound::Custom(id.to_owned());
        }

        match BuiltinSound::from_key(&value) {
            Some(sound) => AlarmSound::Builtin(sound),
            None => AlarmSound::Resource(value),
        }
    }
}

impl From<&str> for AlarmSound {
    fn from(value: &str) -> Self {
        AlarmSound::from(value.to_owned())
    }
}

impl From<AlarmSound> for String {
    fn from(value: AlarmSound) -> Self {
        value.to_string()
    }
}

impl fmt::Display for AlarmSound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlarmSound::Builtin(sound) => f.write_str(sound.key()),
            AlarmSound::Custom(id) => write!(f, "{CUSTOM_SOUND_PREFIX}{id}"),
            AlarmSound::Resource(path) => f.write_str(path),
        }
    }
}

/// How an alarm came to exist. Derived alarms fire once and then disable themselves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlarmOrigin {
    #[default]
    User,
    Quick,
    Snooze,
}

impl AlarmOrigin {
    pub fn is_one_shot(&self) -> bool {
        !matches!(self, AlarmOrigin::User)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alarm {
    pub id: AlarmId,
    pub time: AlarmTime,
    pub label: String,
    pub days: Vec<DayIndex>,
    pub sound: AlarmSound,
    pub enabled: bool,
    pub priority: AlarmPriority,
    pub vibrate: bool,
    pub gradual_wake: bool,
    pub challenge_mode: bool,
    #[serde(default)]
    pub use_voice: bool,
    #[serde(default)]
    pub origin: AlarmOrigin,
}

impl Alarm {
    /// An empty day set means every day.
    pub fn runs_on(&self, weekday: Weekday) -> bool {
        self.days.is_empty() || self.days.contains(&day_index(weekday))
    }

    pub fn is_due(&self, now: &NaiveDateTime) -> bool {
        self.enabled && self.time.matches(now) && self.runs_on(now.weekday())
    }
}
