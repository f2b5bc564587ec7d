use chrono::{NaiveDateTime, TimeDelta};

use crate::{
    alarm::{Alarm, AlarmOrigin, AlarmPriority, AlarmSound, AlarmTime},
    storage::NewAlarm,
};

pub const DEFAULT_SNOOZE_MINUTES: u32 = 5;

/// Preset offsets offered for quick alarms.
pub const QUICK_ALARM_MINUTES: [u32; 6] = [5, 10, 15, 20, 30, 60];

fn time_after(now: &NaiveDateTime, minutes: u32) -> AlarmTime {
    AlarmTime::of(&(*now + TimeDelta::minutes(i64::from(minutes))))
}

pub fn quick_alarm(minutes: u32, now: &NaiveDateTime) -> NewAlarm {
    NewAlarm {
        time: time_after(now, minutes),
        label: format!("Quick alarm {minutes} min"),
        days: Vec::new(),
        sound: AlarmSound::default(),
        enabled: true,
        priority: AlarmPriority::High,
        vibrate: true,
        gradual_wake: false,
        challenge_mode: false,
        use_voice: false,
        origin: AlarmOrigin::Quick,
    }
}

/// Follow-up for a ringing alarm, `snooze_minutes` from now. `snooze_count` is the count before this snooze.
pub fn snooze_alarm(
    active: &Alarm,
    snooze_count: u32,
    snooze_minutes: u32,
    now: &NaiveDateTime,
) -> NewAlarm {
    NewAlarm {
        time: time_after(now, snooze_minutes),
        label: format!("{} (Snooze {})", base_label(&active.label), snooze_count + 1),
        days: Vec::new(),
        enabled: true,
        origin: AlarmOrigin::Snooze,
        ..NewAlarm::from(active)
    }
}

// Chained snoozes keep a single counter suffix.
fn base_label(label: &str) -> &str {
    match label.rfind(" (Snooze ") {
        Some(index) if label.ends_with(')') => &label[..index],
        _ => label,
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use proptest::prelude::*;
    use proptest_arbitrary_interop::arb;

    use crate::alarm::BuiltinSound;

    use super::*;

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 2)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn ringing() -> Alarm {
        Alarm {
            id: 7,
            time: "07:00".parse().unwrap(),
            label: "Wake up".to_owned(),
            days: vec![1, 2, 3, 4, 5],
            sound: AlarmSound::Builtin(BuiltinSound::Piano),
            enabled: true,
            priority: AlarmPriority::Urgent,
            vibrate: true,
            gradual_wake: true,
            challenge_mode: true,
            use_voice: true,
            origin: AlarmOrigin::User,
        }
    }

    #[test]
    fn quick_alarm_ten_minutes_after_07_55() {
        let alarm = quick_alarm(10, &at(7, 55));

        assert_eq!(alarm.time.to_string(), "08:05");
        assert!(alarm.days.is_empty());
        assert_eq!(alarm.priority, AlarmPriority::High);
        assert!(alarm.enabled);
        assert_eq!(alarm.origin, AlarmOrigin::Quick);
        assert_eq!(alarm.label, "Quick alarm 10 min");
    }

    #[test]
    fn quick_alarm_wraps_past_midnight() {
        let alarm = quick_alarm(30, &at(23, 45));

        assert_eq!(alarm.time.to_string(), "00:15");
    }

    #[test]
    fn snooze_alarm_five_minutes_after_07_00() {
        let alarm = snooze_alarm(&ringing(), 0, DEFAULT_SNOOZE_MINUTES, &at(7, 0));

        assert_eq!(alarm.time.to_string(), "07:05");
        assert!(alarm.days.is_empty());
        assert_eq!(alarm.label, "Wake up (Snooze 1)");
    }

    #[test]
    fn snooze_alarm_copies_sound_and_flags() {
        let alarm = snooze_alarm(&ringing(), 0, DEFAULT_SNOOZE_MINUTES, &at(7, 0));

        assert_eq!(alarm.sound, AlarmSound::Builtin(BuiltinSound::Piano));
        assert_eq!(alarm.priority, AlarmPriority::Urgent);
        assert!(alarm.vibrate);
        assert!(alarm.gradual_wake);
        assert!(alarm.challenge_mode);
        assert!(alarm.use_voice);
        assert_eq!(alarm.origin, AlarmOrigin::Snooze);
    }

    #[test]
    fn chained_snooze_replaces_counter_suffix() {
        let mut follow_up = ringing();
        follow_up.label = "Wake up (Snooze 1)".to_owned();

        let alarm = snooze_alarm(&follow_up, 1, DEFAULT_SNOOZE_MINUTES, &at(7, 5));

        assert_eq!(alarm.label, "Wake up (Snooze 2)");
    }

    #[test]
    fn base_label_keeps_unrelated_parentheses() {
        assert_eq!(base_label("Meds (evening)"), "Meds (evening)");
        assert_eq!(base_label("Nap (Snooze 3)"), "Nap");
    }

    proptest! {
        #[test]
        fn quick_alarm_lands_on_the_offset_minute(
            now in arb::<NaiveDateTime>(),
            minutes in 1u32..=24 * 60
        ) {
            prop_assume!(now.checked_add_signed(TimeDelta::days(2)).is_some());
            let alarm = quick_alarm(minutes, &now);
            let target = now + TimeDelta::minutes(i64::from(minutes));

            prop_assert!(alarm.time.matches(&target));
            prop_assert!(alarm.days.is_empty());
        }
    }
}
