use std::sync::Arc;

use tokio::{
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use super::{
    delivery::{AlarmDeliveryChannel, AlarmMessageType},
    manager::SharedAlarmManager,
};

/// Background task that drives [`AlarmManager::tick`](super::AlarmManager::tick) on a fixed period
/// and hands newly ringing alarms to the delivery channel.
pub struct AlarmTicker {
    task_handle: Option<JoinHandle<()>>,
    cancellation_token: CancellationToken,
}

impl AlarmTicker {
    pub fn start(
        manager: SharedAlarmManager,
        delivery: Arc<dyn AlarmDeliveryChannel>,
        period: std::time::Duration,
    ) -> Self {
        let cancellation_token = CancellationToken::new();
        let task_cancellation_token = cancellation_token.child_token();

        let task_handle = tokio::spawn(async move {
            Self::run(task_cancellation_token, manager, delivery, period).await;
        });

        log::debug!("Alarm ticker started. [period_ms = {}]", period.as_millis());

        Self {
            task_handle: Some(task_handle),
            cancellation_token,
        }
    }

    pub async fn stop(mut self, timeout: std::time::Duration) {
        self.cancellation_token.cancel();
        if let Some(task_handle) = self.task_handle.take() {
            if time::timeout(timeout, task_handle).await.is_err() {
                log::warn!(
                    "Alarm ticker did not stop in time. [timeout_ms = {}]",
                    timeout.as_millis()
                );
            }
        }
    }

    async fn run(
        cancellation_token: CancellationToken,
        manager: SharedAlarmManager,
        delivery: Arc<dyn AlarmDeliveryChannel>,
        period: std::time::Duration,
    ) {
        let mut interval = time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancellation_token.cancelled() => {
                    log::debug!("Alarm ticker was cancelled.");
                    break;
                },
                _ = interval.tick() => {
                    let fired = manager.lock().await.tick();
                    if let Some(alarm) = fired {
                        delivery
                            .send_alarm_notification(&alarm, AlarmMessageType::Ringing)
                            .await;
                    }
                }
            }
        }
    }
}

impl Drop for AlarmTicker {
    fn drop(&mut self) {
        self.cancellation_token.cancel();
    }
}
