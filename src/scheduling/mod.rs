mod clock;
mod delivery;
mod derive;
mod manager;
mod snooze;
mod ticker;
mod trigger;

pub use clock::{Clock, ManualClock, SystemClock};
pub use delivery::{AlarmDeliveryChannel, AlarmMessageType};
pub use derive::{DEFAULT_SNOOZE_MINUTES, QUICK_ALARM_MINUTES, quick_alarm, snooze_alarm};
pub use manager::{AlarmManager, AlarmManagerOptions, SharedAlarmManager};
pub use snooze::{DEFAULT_MAX_SNOOZE_COUNT, DEFAULT_SNOOZE_PULSE, SnoozeController, SnoozeState};
pub use ticker::AlarmTicker;
pub use trigger::{TriggerEvaluator, should_trigger};
