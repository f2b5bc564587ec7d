use chrono::{NaiveDateTime, TimeDelta};

use crate::alarm::AlarmId;

pub const DEFAULT_MAX_SNOOZE_COUNT: u32 = 3;
pub const DEFAULT_SNOOZE_PULSE: TimeDelta = TimeDelta::seconds(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnoozeState {
    Idle,
    Snoozed(u32),
}

/// Bounded snooze counter for the alarm currently ringing.
///
/// `snooze` only counts; deriving the follow-up alarm and clearing the active
/// slot is the caller's job. The "snoozing" pulse is cosmetic and expires on
/// its own after the configured pulse length.
#[derive(Debug)]
pub struct SnoozeController {
    max_count: u32,
    count: u32,
    pulse: TimeDelta,
    pulse_until: Option<NaiveDateTime>,
    follow_up: Option<AlarmId>,
}

impl Default for SnoozeController {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SNOOZE_COUNT, DEFAULT_SNOOZE_PULSE)
    }
}

impl SnoozeController {
    pub fn new(max_count: u32, pulse: TimeDelta) -> Self {
        Self {
            max_count,
            count: 0,
            pulse,
            pulse_until: None,
            follow_up: None,
        }
    }

    pub fn state(&self) -> SnoozeState {
        match self.count {
            0 => SnoozeState::Idle,
            count => SnoozeState::Snoozed(count),
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn max_count(&self) -> u32 {
        self.max_count
    }

    pub fn can_snooze(&self) -> bool {
        self.count < self.max_count
    }

    pub fn is_snoozing(&self, now: &NaiveDateTime) -> bool {
        self.pulse_until.is_some_and(|until| *now < until)
    }

    /// Counts one snooze. Silently ignored once the limit is reached.
    pub fn snooze(&mut self, now: &NaiveDateTime) -> bool {
        if !self.can_snooze() {
            log::debug!(
                "Snooze limit reached, ignoring. [count = {}, max = {}]",
                self.count,
                self.max_count
            );
            return false;
        }

        self.count += 1;
        self.pulse_until = Some(*now + self.pulse);
        true
    }

    pub fn reset(&mut self) {
        self.count = 0;
        self.pulse_until = None;
        self.follow_up = None;
    }

    /// Remembers the alarm derived from the latest snooze so its firing continues the session.
    pub fn track_follow_up(&mut self, id: AlarmId) {
        self.follow_up = Some(id);
    }

    pub fn is_follow_up(&self, id: AlarmId) -> bool {
        self.follow_up == Some(id)
    }
}
