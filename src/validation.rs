use std::fmt;

use thiserror::Error;

use crate::{
    alarm::{
        Alarm, AlarmOrigin, AlarmPriority, AlarmSound, AlarmTime, DayIndex, MAX_DAY_INDEX,
    },
    storage::NewAlarm,
};

pub const MAX_LABEL_LEN: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Time is required")]
    MissingTime,
    #[error("Time `{0}` must use the HH:MM 24-hour format")]
    InvalidTime(String),
    #[error("Label is required")]
    MissingLabel,
    #[error("Label cannot exceed {} characters", MAX_LABEL_LEN)]
    LabelTooLong,
    #[error("Day {0} is not a weekday index between 0 and 6")]
    InvalidDay(DayIndex),
}

/// Every problem found in a submitted alarm form, in field order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<ValidationError>);

impl ValidationErrors {
    pub fn messages(&self) -> Vec<String> {
        self.0.iter().map(ToString::to_string).collect()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.messages().join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Alarm data as submitted by the user, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmForm {
    pub time: String,
    pub label: String,
    pub days: Vec<DayIndex>,
    pub sound: AlarmSound,
    pub enabled: bool,
    pub priority: AlarmPriority,
    pub vibrate: bool,
    pub gradual_wake: bool,
    pub challenge_mode: bool,
    pub use_voice: bool,
}

impl Default for AlarmForm {
    fn default() -> Self {
        Self {
            time: String::new(),
            label: String::new(),
            days: Vec::new(),
            sound: AlarmSound::default(),
            enabled: true,
            priority: AlarmPriority::Normal,
            vibrate: true,
            gradual_wake: false,
            challenge_mode: false,
            use_voice: false,
        }
    }
}

impl From<&Alarm> for AlarmForm {
    fn from(alarm: &Alarm) -> Self {
        Self {
            time: alarm.time.to_string(),
            label: alarm.label.clone(),
            days: alarm.days.clone(),
            sound: alarm.sound.clone(),
            enabled: alarm.enabled,
            priority: alarm.priority,
            vibrate: alarm.vibrate,
            gradual_wake: alarm.gradual_wake,
            challenge_mode: alarm.challenge_mode,
            use_voice: alarm.use_voice,
        }
    }
}

impl AlarmForm {
    pub fn validate(&self) -> Result<NewAlarm, ValidationErrors> {
        let mut errors = Vec::new();

        let time = if self.time.is_empty() {
            errors.push(ValidationError::MissingTime);
            None
        } else {
            match self.time.parse::<AlarmTime>() {
                Ok(time) => Some(time),
                Err(_) => {
                    errors.push(ValidationError::InvalidTime(self.time.clone()));
                    None
                }
            }
        };

        if self.label.trim().is_empty() {
            errors.push(ValidationError::MissingLabel);
        }

        if self.label.chars().count() > MAX_LABEL_LEN {
            errors.push(ValidationError::LabelTooLong);
        }

        errors.extend(
            self.days
                .iter()
                .filter(|day| **day > MAX_DAY_INDEX)
                .map(|day| ValidationError::InvalidDay(*day)),
        );

        match time {
            Some(time) if errors.is_empty() => Ok(NewAlarm {
                time,
                label: self.label.clone(),
                days: self.days.clone(),
                sound: self.sound.clone(),
                enabled: self.enabled,
                priority: self.priority,
                vibrate: self.vibrate,
                gradual_wake: self.gradual_wake,
                challenge_mode: self.challenge_mode,
                use_voice: self.use_voice,
                origin: AlarmOrigin::User,
            }),
            _ => Err(ValidationErrors(errors)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(time: &str, label: &str) -> AlarmForm {
        AlarmForm {
            time: time.to_owned(),
            label: label.to_owned(),
            ..AlarmForm::default()
        }
    }

    #[test]
    fn valid_form_becomes_user_alarm() {
        let alarm = form("06:15", "Run").validate().unwrap();

        assert_eq!(alarm.time.to_string(), "06:15");
        assert_eq!(alarm.label, "Run");
        assert_eq!(alarm.origin, AlarmOrigin::User);
        assert!(alarm.enabled);
    }

    #[test]
    fn label_of_fifty_chars_is_accepted() {
        let label = "a".repeat(50);

        assert!(form("07:00", &label).validate().is_ok());
    }

    #[test]
    fn label_of_fifty_one_chars_is_rejected() {
        let label = "a".repeat(51);

        let errors = form("07:00", &label).validate().unwrap_err();

        assert_eq!(errors.0, vec![ValidationError::LabelTooLong]);
    }

    #[test]
    fn label_length_counts_characters_not_bytes() {
        let label = "é".repeat(50);

        assert!(form("07:00", &label).validate().is_ok());
    }

    #[test]
    fn empty_time_is_rejected() {
        let errors = form("", "Wake up").validate().unwrap_err();

        assert_eq!(errors.0, vec![ValidationError::MissingTime]);
    }

    #[test]
    fn blank_label_is_rejected() {
        let errors = form("07:00", "   ").validate().unwrap_err();

        assert_eq!(errors.0, vec![ValidationError::MissingLabel]);
    }

    #[test]
    fn all_problems_are_reported_together() {
        let mut input = form("", "");
        input.days = vec![1, 9];

        let errors = input.validate().unwrap_err();

        assert_eq!(
            errors.0,
            vec![
                ValidationError::MissingTime,
                ValidationError::MissingLabel,
                ValidationError::InvalidDay(9),
            ]
        );
        assert_eq!(errors.messages().len(), 3);
    }

    #[test]
    fn malformed_time_is_rejected() {
        let errors = form("7:5", "Wake").validate().unwrap_err();

        assert_eq!(errors.0, vec![ValidationError::InvalidTime("7:5".to_owned())]);
    }
}
