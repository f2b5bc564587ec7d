use std::sync::Arc;

use chrono::TimeDelta;
use tokio::sync::Mutex;

use crate::{
    alarm::{Alarm, AlarmId},
    storage::AlarmRepository,
    validation::{AlarmForm, ValidationErrors},
};

use super::{
    clock::Clock,
    derive::{DEFAULT_SNOOZE_MINUTES, quick_alarm, snooze_alarm},
    snooze::{DEFAULT_MAX_SNOOZE_COUNT, DEFAULT_SNOOZE_PULSE, SnoozeController},
    trigger::TriggerEvaluator,
};

pub type SharedAlarmManager = Arc<Mutex<AlarmManager>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlarmManagerOptions {
    pub snooze_minutes: u32,
    pub max_snooze_count: u32,
    pub snooze_pulse: TimeDelta,
}

impl Default for AlarmManagerOptions {
    fn default() -> Self {
        Self {
            snooze_minutes: DEFAULT_SNOOZE_MINUTES,
            max_snooze_count: DEFAULT_MAX_SNOOZE_COUNT,
            snooze_pulse: DEFAULT_SNOOZE_PULSE,
        }
    }
}

/// Owns the alarm list and the single "ringing" slot.
pub struct AlarmManager {
    repository: AlarmRepository,
    clock: Arc<dyn Clock>,
    evaluator: TriggerEvaluator,
    snooze: SnoozeController,
    active: Option<Alarm>,
    snooze_minutes: u32,
}

impl AlarmManager {
    pub fn new(
        repository: AlarmRepository,
        clock: Arc<dyn Clock>,
        options: AlarmManagerOptions,
    ) -> Self {
        Self {
            repository,
            clock,
            evaluator: TriggerEvaluator::new(),
            snooze: SnoozeController::new(options.max_snooze_count, options.snooze_pulse),
            active: None,
            snooze_minutes: options.snooze_minutes,
        }
    }

    pub fn into_shared(self) -> SharedAlarmManager {
        Arc::new(Mutex::new(self))
    }

    pub fn alarms(&self) -> &[Alarm] {
        self.repository.all()
    }

    pub fn alarm(&self, id: AlarmId) -> Option<&Alarm> {
        self.repository.get(id)
    }

    pub fn active_alarm(&self) -> Option<&Alarm> {
        self.active.as_ref()
    }

    pub fn is_snoozing(&self) -> bool {
        self.snooze.is_snoozing(&self.clock.now())
    }

    pub fn snooze_count(&self) -> u32 {
        self.snooze.count()
    }

    pub fn max_snooze_count(&self) -> u32 {
        self.snooze.max_count()
    }

    pub fn can_snooze(&self) -> bool {
        self.snooze.can_snooze()
    }

    pub fn add_alarm(&mut self, form: &AlarmForm) -> Result<AlarmId, ValidationErrors> {
        let new_alarm = form.validate()?;
        Ok(self.repository.add(new_alarm))
    }

    pub fn update_alarm(&mut self, id: AlarmId, form: &AlarmForm) -> Result<(), ValidationErrors> {
        let data = form.validate()?;
        if !self.repository.update(id, data) {
            log::debug!("Ignoring update of unknown alarm. [alarm_id = {}]", id);
        }
        Ok(())
    }

    pub fn delete_alarm(&mut self, id: AlarmId) {
        if !self.repository.delete(id) {
            log::debug!("Ignoring delete of unknown alarm. [alarm_id = {}]", id);
        }
    }

    pub fn toggle_alarm(&mut self, id: AlarmId) {
        if !self.repository.toggle(id) {
            log::debug!("Ignoring toggle of unknown alarm. [alarm_id = {}]", id);
        }
    }

    pub fn add_quick_alarm(&mut self, minutes: u32) -> AlarmId {
        let now = self.clock.now();
        self.repository.add(quick_alarm(minutes, &now))
    }

    /// Clears the ringing slot. Leaves the alarm itself and the snooze count untouched.
    pub fn dismiss_alarm(&mut self) {
        if let Some(alarm) = self.active.take() {
            log::info!("Dismissed alarm. [alarm_id = {}]", alarm.id);
        }
    }

    /// Defers the ringing alarm by adding a one-shot follow-up and clearing the slot.
    /// Returns the follow-up's id, or `None` when nothing is ringing or the limit is reached.
    pub fn snooze(&mut self) -> Option<AlarmId> {
        if !self.snooze.can_snooze() {
            return None;
        }
        let active = self.active.as_ref()?;

        let now = self.clock.now();
        let follow_up = snooze_alarm(active, self.snooze.count(), self.snooze_minutes, &now);
        let follow_up_id = self.repository.add(follow_up);

        self.snooze.snooze(&now);
        self.snooze.track_follow_up(follow_up_id);
        log::info!(
            "Snoozed alarm. [alarm_id = {}, follow_up_id = {}, count = {}]",
            active.id,
            follow_up_id,
            self.snooze.count()
        );

        self.dismiss_alarm();
        Some(follow_up_id)
    }

    pub fn reset_snooze(&mut self) {
        self.snooze.reset();
    }

    /// The user turned the ringing alarm off for good.
    pub fn stop_alarm(&mut self) {
        self.dismiss_alarm();
        self.reset_snooze();
    }

    /// Runs one trigger evaluation against the clock. Returns the alarm that started ringing.
    pub fn tick(&mut self) -> Option<Alarm> {
        let now = self.clock.now();
        let alarm = self
            .evaluator
            .evaluate(self.repository.all(), &now, self.active.is_some())?
            .clone();

        if alarm.origin.is_one_shot() {
            self.repository.set_enabled(alarm.id, false);
        }

        if !self.snooze.is_follow_up(alarm.id) {
            self.snooze.reset();
        }

        log::info!(
            "Alarm triggered. [alarm_id = {}, time = {}, label = {}]",
            alarm.id,
            alarm.time,
            alarm.label
        );
        self.active = Some(alarm.clone());
        Some(alarm)
    }
}
