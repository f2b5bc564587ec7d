use async_trait::async_trait;

use crate::alarm::Alarm;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmMessageType {
    Ringing,
    Snoozed,
    Stopped,
}

/// Whatever renders alarms to the user: sound, voice, screen.
#[async_trait]
pub trait AlarmDeliveryChannel: Send + Sync + 'static {
    async fn send_alarm_notification(&self, alarm: &Alarm, message: AlarmMessageType);
}
