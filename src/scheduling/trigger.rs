use std::collections::HashMap;

use chrono::{NaiveDateTime, Timelike};

use crate::alarm::{Alarm, AlarmId};

pub fn should_trigger(alarm: &Alarm, now: &NaiveDateTime) -> bool {
    alarm.is_due(now)
}

/// Decides, once per tick, which alarm (if any) starts ringing.
///
/// Scanning follows repository order and the first due alarm wins. Every other
/// alarm due in the same minute is marked as fired too, so it is missed for that
/// slot instead of ringing once the winner is dismissed.
#[derive(Debug, Default)]
pub struct TriggerEvaluator {
    fired_at: HashMap<AlarmId, NaiveDateTime>,
}

impl TriggerEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn evaluate<'a>(
        &mut self,
        alarms: &'a [Alarm],
        now: &NaiveDateTime,
        has_active_alarm: bool,
    ) -> Option<&'a Alarm> {
        if has_active_alarm {
            return None;
        }

        let minute = start_of_minute(now);
        self.fired_at.retain(|_, fired_minute| *fired_minute == minute);

        let due: Vec<&'a Alarm> = alarms
            .iter()
            .filter(|alarm| should_trigger(alarm, now) && !self.fired_at.contains_key(&alarm.id))
            .collect();
        let mut due = due.into_iter();
        let alarm = due.next()?;

        self.fired_at.insert(alarm.id, minute);
        for missed in due {
            log::info!(
                "Alarm shares its slot with a ringing alarm and is skipped. [id = {}, ringing = {}]",
                missed.id,
                alarm.id
            );
            self.fired_at.insert(missed.id, minute);
        }
        Some(alarm)
    }
}

fn start_of_minute(now: &NaiveDateTime) -> NaiveDateTime {
    now.with_nanosecond(0)
        .and_then(|t| t.with_second(0))
        .unwrap_or(*now)
}
