use std::{path::PathBuf, time::Duration};

use anyhow::anyhow;
use chrono::TimeDelta;
use chrono_tz::Tz;
use config::{
    Config, ConfigBuilder, ConfigError, Environment, File, Source, builder::DefaultState,
};
use serde::Deserialize;

use crate::scheduling::{
    AlarmManagerOptions, DEFAULT_MAX_SNOOZE_COUNT, DEFAULT_SNOOZE_MINUTES,
};

#[derive(Deserialize, Debug, Clone)]
pub struct StorageSettings {
    pub data_dir: PathBuf,
}

#[derive(Deserialize, Debug, Clone)]
pub struct AlarmSettings {
    pub snooze_minutes: u32,
    pub max_snooze_count: u32,
    pub tick_interval_ms: u64,
    pub snooze_pulse_ms: u32,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct ClockSettings {
    #[serde(default)]
    pub timezone: Option<String>,
}

/// Process configuration.
///
/// Sources, later ones win: built-in defaults, `appsettings.*`,
/// `appsettings.local.*`, then `ALARMA__SECTION__KEY` environment variables.
#[derive(Deserialize, Debug, Clone)]
pub struct AppSettings {
    pub storage: StorageSettings,
    pub alarm: AlarmSettings,
    #[serde(default)]
    pub clock: ClockSettings,
}

impl AppSettings {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_sources([
            File::with_name("appsettings").required(false),
            File::with_name("appsettings.local").required(false),
        ])
    }

    fn from_sources<S>(files: impl IntoIterator<Item = S>) -> Result<Self, ConfigError>
    where
        S: Source + Send + Sync + 'static,
    {
        let settings = files
            .into_iter()
            .fold(Self::defaults()?, |builder, file| builder.add_source(file))
            .add_source(
                Environment::with_prefix("ALARMA")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("storage.data_dir", "data")?
            .set_default("alarm.snooze_minutes", i64::from(DEFAULT_SNOOZE_MINUTES))?
            .set_default("alarm.max_snooze_count", i64::from(DEFAULT_MAX_SNOOZE_COUNT))?
            .set_default("alarm.tick_interval_ms", 1_000_i64)?
            .set_default("alarm.snooze_pulse_ms", 2_000_i64)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.alarm.tick_interval_ms.max(1))
    }

    pub fn manager_options(&self) -> AlarmManagerOptions {
        AlarmManagerOptions {
            snooze_minutes: self.alarm.snooze_minutes,
            max_snooze_count: self.alarm.max_snooze_count,
            snooze_pulse: TimeDelta::milliseconds(i64::from(self.alarm.snooze_pulse_ms)),
        }
    }

    /// `None` means the system's local time.
    pub fn timezone(&self) -> anyhow::Result<Option<Tz>> {
        match self.clock.timezone.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(name) => name
                .parse::<Tz>()
                .map(Some)
                .map_err(|error| anyhow!("Unknown timezone '{}': {}", name, error)),
        }
    }
}
