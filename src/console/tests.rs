use std::sync::Mutex as StdMutex;

use chrono::{NaiveDate, NaiveDateTime};
use tokio::io::BufReader;

use crate::{
    scheduling::{AlarmManager, AlarmManagerOptions, ManualClock},
    storage::{AlarmRepository, InMemoryKeyValueStore, KeyValueStore},
};

use super::*;

#[derive(Default)]
struct RecordingChannel {
    received: StdMutex<Vec<(String, AlarmMessageType)>>,
}

impl RecordingChannel {
    fn received(&self) -> Vec<(String, AlarmMessageType)> {
        self.received.lock().unwrap().clone()
    }
}

#[async_trait]
impl AlarmDeliveryChannel for RecordingChannel {
    async fn send_alarm_notification(&self, alarm: &Alarm, message: AlarmMessageType) {
        self.received
            .lock()
            .unwrap()
            .push((alarm.label.clone(), message));
    }
}

struct TestContext {
    pub clock: ManualClock,
    pub manager: SharedAlarmManager,
    pub settings: SharedSettings,
    pub channel: Arc<RecordingChannel>,
    pub console: Console,
}

impl TestContext {
    fn new() -> Self {
        let clock = ManualClock::new(monday(6, 59));
        let store: Arc<dyn KeyValueStore> = Arc::new(InMemoryKeyValueStore::new());
        let manager = AlarmManager::new(
            AlarmRepository::load(Arc::clone(&store)),
            Arc::new(clock.clone()),
            AlarmManagerOptions::default(),
        )
        .into_shared();
        let settings = Arc::new(Mutex::new(SettingsStore::load(Arc::clone(&store))));
        let channel = Arc::new(RecordingChannel::default());

        let console = Console::new(
            Arc::clone(&manager),
            Arc::clone(&settings),
            SoundLibrary::load(store),
            Arc::new(clock.clone()),
            channel.clone(),
        );

        Self {
            clock,
            manager,
            settings,
            channel,
            console,
        }
    }

    async fn reply(&mut self, line: &str) -> String {
        match self.console.handle_line(line).await {
            Step::Reply(reply) => reply,
            Step::Quit => panic!("unexpected quit for '{line}'"),
        }
    }

    async fn ring_at(&mut self, hour: u32, minute: u32) -> Alarm {
        self.clock.set(monday(hour, minute));
        self.manager.lock().await.tick().unwrap()
    }
}

fn monday(hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 6, 2)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

#[test]
fn parses_add_with_named_days() {
    let command: Command = "add 07:30 mon,wed,fri Morning run".parse().unwrap();

    assert_eq!(
        command,
        Command::Add {
            time: "07:30".to_owned(),
            days: vec![1, 3, 5],
            label: "Morning run".to_owned(),
        }
    );
}

#[test]
fn parses_every_day_and_numeric_days() {
    let every_day: Command = "add 06:00 * Gym".parse().unwrap();
    let numeric: Command = "edit 42 06:00 0,6 Weekend".parse().unwrap();

    assert!(matches!(every_day, Command::Add { days, .. } if days.is_empty()));
    assert!(matches!(numeric, Command::Edit { id: 42, days, .. } if days == vec![0, 6]));
}

#[test]
fn parses_stop_with_and_without_answer() {
    assert_eq!("stop".parse::<Command>().unwrap(), Command::Stop(None));
    assert_eq!("stop 31".parse::<Command>().unwrap(), Command::Stop(Some(31)));
}

#[test]
fn parses_custom_sound_reference() {
    let command: Command = "sound 9 custom:abc".parse().unwrap();

    assert_eq!(
        command,
        Command::SetSound(9, AlarmSound::Custom("abc".to_owned()))
    );
}

#[test]
fn rejects_malformed_commands() {
    assert!("".parse::<Command>().is_err());
    assert!("fly".parse::<Command>().is_err());
    assert!("quick 0".parse::<Command>().is_err());
    assert!("quick soon".parse::<Command>().is_err());
    assert!("toggle abc".parse::<Command>().is_err());
    assert!("add 07:00".parse::<Command>().is_err());
    assert!("add 07:00 funday Nap".parse::<Command>().is_err());
    assert!("theme neon".parse::<Command>().is_err());
}

#[tokio::test]
async fn add_then_list() {
    let mut ctx = TestContext::new();

    let reply = ctx.reply("add 07:00 mon,tue Wake up").await;
    assert!(reply.starts_with("Added alarm"), "{reply}");

    let listing = ctx.reply("list").await;
    assert!(listing.contains("07:00"), "{listing}");
    assert!(listing.contains("Mon, Tue"), "{listing}");
    assert!(listing.contains("Wake up"), "{listing}");
    assert!(listing.contains("gentle"), "{listing}");
}

#[tokio::test]
async fn list_follows_time_format() {
    let mut ctx = TestContext::new();
    ctx.reply("add 19:15 * Dinner").await;

    assert_eq!(ctx.reply("format").await, "Using 12-hour clock.");

    let listing = ctx.reply("list").await;
    assert!(listing.contains("7:15 PM"), "{listing}");
}

#[tokio::test]
async fn invalid_alarm_reports_all_messages() {
    let mut ctx = TestContext::new();
    let label = "x".repeat(51);

    let reply = ctx.reply(&format!("add 25:00 * {label}")).await;

    assert!(reply.starts_with("Invalid alarm:"), "{reply}");
    assert!(reply.contains("50"), "{reply}");
    assert_eq!(ctx.reply("list").await, "No alarms.");
}

#[tokio::test]
async fn parse_errors_are_replies_not_failures() {
    let mut ctx = TestContext::new();

    let reply = ctx.reply("toggle").await;

    assert!(reply.starts_with("error:"), "{reply}");
}

#[tokio::test]
async fn unknown_ids_are_reported() {
    let mut ctx = TestContext::new();

    assert_eq!(ctx.reply("toggle 5").await, "No alarm 5.");
    assert_eq!(ctx.reply("delete 5").await, "No alarm 5.");
    assert_eq!(ctx.reply("edit 5 08:00 * Nap").await, "No alarm 5.");
}

#[tokio::test]
async fn snooze_creates_follow_up_and_notifies() {
    let mut ctx = TestContext::new();
    ctx.reply("add 07:00 * Wake up").await;
    ctx.ring_at(7, 0).await;

    let reply = ctx.reply("snooze").await;

    assert_eq!(reply, "Snoozed until 07:05 (1/3).");
    assert_eq!(
        ctx.channel.received(),
        vec![("Wake up (Snooze 1)".to_owned(), AlarmMessageType::Snoozed)]
    );
    assert!(ctx.manager.lock().await.active_alarm().is_none());
}

#[tokio::test]
async fn snooze_without_ringing_alarm() {
    let mut ctx = TestContext::new();

    assert_eq!(ctx.reply("snooze").await, "Nothing is ringing.");
    assert_eq!(ctx.reply("stop").await, "Nothing is ringing.");
    assert_eq!(ctx.reply("dismiss").await, "Nothing is ringing.");
}

#[tokio::test]
async fn stop_resets_snooze_session() {
    let mut ctx = TestContext::new();
    ctx.reply("add 07:00 * Wake up").await;
    ctx.ring_at(7, 0).await;
    ctx.reply("snooze").await;
    ctx.ring_at(7, 5).await;

    let reply = ctx.reply("stop").await;

    assert_eq!(reply, "Stopped 'Wake up (Snooze 1)'.");
    assert_eq!(ctx.manager.lock().await.snooze_count(), 0);
    assert_eq!(
        ctx.channel.received().last().map(|(_, message)| *message),
        Some(AlarmMessageType::Stopped)
    );
}

#[tokio::test]
async fn challenge_alarm_needs_the_right_answer() {
    let mut ctx = TestContext::new();
    ctx.reply("add 07:00 * Exam").await;
    let id = ctx.manager.lock().await.alarms()[0].id;
    assert_eq!(ctx.reply(&format!("challenge {id}")).await, format!("Updated alarm {id}."));
    ctx.ring_at(7, 0).await;

    let question = ctx.reply("stop").await;
    assert!(question.starts_with("What is"), "{question}");

    let (_, challenge) = ctx.console.challenge.unwrap();
    let wrong = ctx.reply(&format!("stop {}", challenge.answer() + 1)).await;
    assert!(wrong.starts_with("Wrong answer."), "{wrong}");
    assert!(ctx.manager.lock().await.active_alarm().is_some());

    let reply = ctx.reply(&format!("stop {}", challenge.answer())).await;
    assert_eq!(reply, "Stopped 'Exam'.");
    assert!(ctx.manager.lock().await.active_alarm().is_none());
    assert!(ctx.console.challenge.is_none());
}

#[tokio::test]
async fn dismiss_does_not_bypass_the_challenge() {
    let mut ctx = TestContext::new();
    ctx.reply("add 07:00 * Exam").await;
    let id = ctx.manager.lock().await.alarms()[0].id;
    ctx.reply(&format!("challenge {id}")).await;
    ctx.ring_at(7, 0).await;

    let question = ctx.reply("dismiss").await;

    assert!(question.starts_with("What is"), "{question}");
    assert!(ctx.manager.lock().await.active_alarm().is_some());

    let (_, challenge) = ctx.console.challenge.unwrap();
    assert_eq!(ctx.reply("dismiss").await, question);

    ctx.reply(&format!("stop {}", challenge.answer())).await;
    assert!(ctx.manager.lock().await.active_alarm().is_none());
}

#[tokio::test]
async fn dismiss_keeps_snooze_count() {
    let mut ctx = TestContext::new();
    ctx.reply("add 07:00 * Wake up").await;
    ctx.ring_at(7, 0).await;
    ctx.reply("snooze").await;
    ctx.ring_at(7, 5).await;

    assert_eq!(ctx.reply("dismiss").await, "Dismissed.");
    assert_eq!(ctx.manager.lock().await.snooze_count(), 1);
}

#[tokio::test]
async fn quick_alarm_reports_its_time() {
    let mut ctx = TestContext::new();
    ctx.clock.set(monday(7, 55));

    let reply = ctx.reply("quick 10").await;

    assert!(reply.ends_with("set for 08:05."), "{reply}");
}

#[tokio::test]
async fn settings_commands_persist_through_the_store() {
    let mut ctx = TestContext::new();

    assert_eq!(ctx.reply("volume 150").await, "Volume 100%.");
    assert_eq!(ctx.reply("voice").await, "Voice announcements on.");
    assert_eq!(ctx.reply("dark").await, "Dark mode off.");
    assert_eq!(ctx.reply("theme ocean").await, "Theme ocean.");
    assert_eq!(ctx.reply("animation bouncy").await, "Animation bouncy.");

    let settings = ctx.settings.lock().await.settings().clone();
    assert_eq!(settings.alarm_volume, 100);
    assert!(settings.voice_enabled);
    assert!(!settings.is_dark_mode);
    assert_eq!(settings.theme, Theme::Ocean);
    assert_eq!(settings.animation_style, AnimationStyle::Bouncy);
}

#[tokio::test]
async fn custom_sounds_can_be_assigned_and_removed() {
    let mut ctx = TestContext::new();
    ctx.reply("add 07:00 * Wake up").await;
    let id = ctx.manager.lock().await.alarms()[0].id;

    let added = ctx.reply("sound-add Birds data:audio/mp3;base64,AAAA").await;
    let sound_id = ctx.console.sounds.list()[0].id.clone();
    assert_eq!(added, format!("Added sound custom:{sound_id} (Birds)."));

    ctx.reply(&format!("sound {id} custom:{sound_id}")).await;
    assert!(ctx.reply("list").await.contains("♪ Birds"));

    assert_eq!(
        ctx.reply(&format!("sound-remove custom:{sound_id}")).await,
        format!("Removed sound {sound_id}.")
    );
    assert!(ctx.reply("list").await.contains("(missing)"));
    assert_eq!(
        ctx.reply(&format!("sound {id} custom:{sound_id}")).await,
        format!("No custom sound {sound_id}.")
    );
}

#[tokio::test]
async fn status_shows_ringing_alarm_and_snooze() {
    let mut ctx = TestContext::new();
    ctx.reply("add 07:00 * Wake up").await;
    ctx.ring_at(7, 0).await;

    let ringing = ctx.reply("status").await;
    assert!(ringing.contains("Now 07:00:00"), "{ringing}");
    assert!(ringing.contains("Ringing: 07:00 Wake up"), "{ringing}");

    ctx.reply("snooze").await;
    let snoozed = ctx.reply("status").await;
    assert!(snoozed.contains("Snoozed 1/3"), "{snoozed}");
    assert!(snoozed.contains("volume 80%"), "{snoozed}");
}

#[tokio::test]
async fn run_stops_at_quit() {
    let mut ctx = TestContext::new();
    let input = BufReader::new(&b"add 07:00 * Wake up\n\nlist\nquit\nadd 08:00 * Never\n"[..]);
    let mut output = Vec::new();

    let end = ctx.console.run(input, &mut output).await.unwrap();

    assert_eq!(end, ConsoleEnd::Quit);

    let output = String::from_utf8(output).unwrap();
    assert!(output.starts_with("Type 'help'"), "{output}");
    assert!(output.contains("Wake up"), "{output}");
    assert!(!output.contains("Never"), "{output}");
    assert_eq!(ctx.manager.lock().await.alarms().len(), 1);
}

#[tokio::test]
async fn run_survives_a_line_that_is_not_utf8() {
    let mut ctx = TestContext::new();
    let input = BufReader::new(&b"\xff\xfe\nadd 07:00 * Late\nquit\n"[..]);
    let mut output = Vec::new();

    ctx.console.run(input, &mut output).await.unwrap();

    let output = String::from_utf8_lossy(&output).into_owned();
    assert!(output.contains("error:"), "{output}");
    assert_eq!(ctx.manager.lock().await.alarms().len(), 1);
}

#[tokio::test]
async fn run_stops_at_end_of_input() {
    let mut ctx = TestContext::new();
    let input = BufReader::new(&b"add 07:00 * No newline"[..]);
    let mut output = Vec::new();

    let end = ctx.console.run(input, &mut output).await.unwrap();

    assert_eq!(end, ConsoleEnd::EndOfInput);
    assert_eq!(ctx.manager.lock().await.alarms().len(), 1);
}

#[tokio::test]
async fn delivery_channel_announces_voice_alarms() {
    let store: Arc<dyn KeyValueStore> = Arc::new(InMemoryKeyValueStore::new());
    let settings = Arc::new(Mutex::new(SettingsStore::load(store)));
    settings.lock().await.toggle_voice();
    let channel = ConsoleDeliveryChannel::new(Arc::clone(&settings), Vec::new());

    let form = AlarmForm {
        time: "07:00".to_owned(),
        label: "Stand up".to_owned(),
        use_voice: true,
        ..AlarmForm::default()
    };
    let alarm = form.validate().unwrap().into_alarm(1);

    channel
        .send_alarm_notification(&alarm, AlarmMessageType::Ringing)
        .await;

    let printed = String::from_utf8(channel.out.lock().await.clone()).unwrap();
    assert!(printed.contains("🚨 07:00 Stand up [NORMAL]"), "{printed}");
    assert!(printed.contains("at 80%"), "{printed}");
    assert!(printed.contains("🗣️ \"Stand up\""), "{printed}");
}

#[test]
fn ringing_text_skips_voice_when_disabled() {
    let form = AlarmForm {
        time: "07:00".to_owned(),
        label: "Stand up".to_owned(),
        use_voice: true,
        challenge_mode: true,
        ..AlarmForm::default()
    };
    let alarm = form.validate().unwrap().into_alarm(1);

    let text = get_message_text(&alarm, AlarmMessageType::Ringing, &Settings::default());

    assert!(!text.contains("🗣️"), "{text}");
    assert!(text.contains("challenge"), "{text}");
}
