use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::alarm::Alarm;

pub const MAX_VOLUME: u8 = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Purple,
    Ocean,
    Sunset,
    Forest,
    Cosmic,
}

impl Theme {
    pub const ALL: [Theme; 5] = [
        Theme::Purple,
        Theme::Ocean,
        Theme::Sunset,
        Theme::Forest,
        Theme::Cosmic,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Theme::Purple => "purple",
            Theme::Ocean => "ocean",
            Theme::Sunset => "sunset",
            Theme::Forest => "forest",
            Theme::Cosmic => "cosmic",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|theme| theme.name() == name)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimationStyle {
    #[default]
    Smooth,
    Bouncy,
    Fast,
}

impl AnimationStyle {
    pub const ALL: [AnimationStyle; 3] = [
        AnimationStyle::Smooth,
        AnimationStyle::Bouncy,
        AnimationStyle::Fast,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            AnimationStyle::Smooth => "smooth",
            AnimationStyle::Bouncy => "bouncy",
            AnimationStyle::Fast => "fast",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|style| style.name() == name)
    }
}

/// User preferences. Missing fields in stored data fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(rename = "isDarkMode")]
    pub is_dark_mode: bool,
    #[serde(rename = "is24HourFormat")]
    pub is_24_hour_format: bool,
    pub theme: Theme,
    #[serde(rename = "voiceEnabled")]
    pub voice_enabled: bool,
    #[serde(rename = "animationStyle")]
    pub animation_style: AnimationStyle,
    #[serde(rename = "alarmVolume", deserialize_with = "clamped_volume")]
    pub alarm_volume: u8,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            is_dark_mode: true,
            is_24_hour_format: true,
            theme: Theme::Purple,
            voice_enabled: false,
            animation_style: AnimationStyle::Smooth,
            alarm_volume: 80,
        }
    }
}

impl Settings {
    /// Parses a stored record field by field over the defaults. A field whose
    /// value does not fit keeps its default and the others are still applied.
    /// Fails only when the record is not a JSON object.
    pub fn from_stored(raw: &str) -> Result<Self, serde_json::Error> {
        let stored: Map<String, Value> = serde_json::from_str(raw)?;
        let mut merged = match serde_json::to_value(Settings::default())? {
            Value::Object(defaults) => defaults,
            _ => Map::new(),
        };

        for (key, value) in stored {
            let mut candidate = merged.clone();
            candidate.insert(key.clone(), value);
            if serde_json::from_value::<Settings>(Value::Object(candidate.clone())).is_ok() {
                merged = candidate;
            } else {
                log::warn!("Ignoring invalid stored setting. [key = {}]", key);
            }
        }

        serde_json::from_value(Value::Object(merged))
    }

    /// Whether the alarm's label should be read out when it rings.
    pub fn should_announce(&self, alarm: &Alarm) -> bool {
        self.voice_enabled && alarm.use_voice && !alarm.label.trim().is_empty()
    }

    /// Volume as a 0.0..=1.0 gain.
    pub fn volume_gain(&self) -> f32 {
        f32::from(self.alarm_volume) / f32::from(MAX_VOLUME)
    }
}

pub fn clamp_volume(volume: i64) -> u8 {
    volume.clamp(0, i64::from(MAX_VOLUME)) as u8
}

fn clamped_volume<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let volume = f64::deserialize(deserializer)?;
    Ok(clamp_volume(volume.round() as i64))
}
