use std::{str::FromStr, sync::Arc};

use anyhow::{Context, bail};
use async_trait::async_trait;
use rand::{SeedableRng, rngs::StdRng};
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt},
    sync::Mutex,
};

use crate::{
    alarm::{Alarm, AlarmId, AlarmSound, BuiltinSound, DayIndex},
    challenge::MathChallenge,
    format::{WEEK_DAYS, format_alarm_time, format_clock, format_days},
    scheduling::{AlarmDeliveryChannel, AlarmMessageType, Clock, SharedAlarmManager},
    settings::{AnimationStyle, Settings, Theme},
    storage::{SettingsStore, SoundLibrary},
    validation::AlarmForm,
};

pub type SharedSettings = Arc<Mutex<SettingsStore>>;

const HELP: &str = "\
Commands:
  list                              show all alarms
  status                            clock, ringing alarm, snooze and settings
  add <HH:MM> <days|*> <label...>   days: 0-6 or sun..sat, comma separated
  edit <id> <HH:MM> <days|*> <label...>
  toggle <id> | delete <id>
  sound <id> <sound>                gentle, piano, custom:<id>, or a path/URL
  challenge <id>                    require a math answer to stop
  voice-alarm <id>                  read the label out when it rings
  quick <minutes>                   one-off alarm, e.g. quick 10
  snooze | stop [answer] | dismiss
  volume <0-100> | format | dark | voice
  theme <name> | animation <name>
  sounds | sound-add <name> <url> | sound-remove <id>
  help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    List,
    Status,
    Add {
        time: String,
        days: Vec<DayIndex>,
        label: String,
    },
    Edit {
        id: AlarmId,
        time: String,
        days: Vec<DayIndex>,
        label: String,
    },
    Toggle(AlarmId),
    Delete(AlarmId),
    SetSound(AlarmId, AlarmSound),
    ToggleChallenge(AlarmId),
    ToggleAlarmVoice(AlarmId),
    Quick(u32),
    Snooze,
    Stop(Option<u32>),
    Dismiss,
    Volume(i64),
    Format,
    DarkMode,
    Voice,
    Theme(Theme),
    Animation(AnimationStyle),
    Sounds,
    SoundAdd { name: String, data_url: String },
    SoundRemove(String),
    Quit,
}

fn parse_id(value: Option<&str>) -> anyhow::Result<AlarmId> {
    let value = value.context("missing alarm id")?;
    value
        .parse()
        .with_context(|| format!("invalid alarm id '{}'", value))
}

fn parse_days(value: &str) -> anyhow::Result<Vec<DayIndex>> {
    if value == "*" {
        return Ok(Vec::new());
    }

    value
        .split(',')
        .map(|day| {
            let day = day.trim().to_lowercase();
            match WEEK_DAYS
                .iter()
                .position(|name| name.to_lowercase() == day)
            {
                Some(index) => Ok(index as DayIndex),
                None => day
                    .parse::<DayIndex>()
                    .with_context(|| format!("invalid day '{}'", day)),
            }
        })
        .collect()
}

fn rest<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    parts.collect::<Vec<_>>().join(" ")
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let Some(name) = parts.next() else {
            bail!("empty command");
        };

        let command = match name {
            "help" => Command::Help,
            "list" => Command::List,
            "status" => Command::Status,
            "add" => {
                let time = parts.next().context("usage: add <HH:MM> <days|*> <label>")?;
                let days = parts.next().context("usage: add <HH:MM> <days|*> <label>")?;
                Command::Add {
                    time: time.to_owned(),
                    days: parse_days(days)?,
                    label: rest(parts),
                }
            }
            "edit" => {
                let id = parse_id(parts.next())?;
                let time = parts
                    .next()
                    .context("usage: edit <id> <HH:MM> <days|*> <label>")?;
                let days = parts
                    .next()
                    .context("usage: edit <id> <HH:MM> <days|*> <label>")?;
                Command::Edit {
                    id,
                    time: time.to_owned(),
                    days: parse_days(days)?,
                    label: rest(parts),
                }
            }
            "toggle" => Command::Toggle(parse_id(parts.next())?),
            "delete" => Command::Delete(parse_id(parts.next())?),
            "sound" => {
                let id = parse_id(parts.next())?;
                let sound = parts.next().context("usage: sound <id> <sound>")?;
                Command::SetSound(id, AlarmSound::from(sound))
            }
            "challenge" => Command::ToggleChallenge(parse_id(parts.next())?),
            "voice-alarm" => Command::ToggleAlarmVoice(parse_id(parts.next())?),
            "quick" => {
                let minutes = parts.next().context("usage: quick <minutes>")?;
                let minutes: u32 = minutes
                    .parse()
                    .with_context(|| format!("invalid minutes '{}'", minutes))?;
                if minutes == 0 {
                    bail!("quick alarm needs at least one minute");
                }
                Command::Quick(minutes)
            }
            "snooze" => Command::Snooze,
            "stop" => match parts.next() {
                Some(answer) => Command::Stop(Some(
                    answer
                        .parse()
                        .with_context(|| format!("invalid answer '{}'", answer))?,
                )),
                None => Command::Stop(None),
            },
            "dismiss" => Command::Dismiss,
            "volume" => {
                let volume = parts.next().context("usage: volume <0-100>")?;
                Command::Volume(
                    volume
                        .parse()
                        .with_context(|| format!("invalid volume '{}'", volume))?,
                )
            }
            "format" => Command::Format,
            "dark" => Command::DarkMode,
            "voice" => Command::Voice,
            "theme" => {
                let name = parts.next().context("usage: theme <name>")?;
                let theme = Theme::from_name(name).with_context(|| {
                    let names: Vec<_> = Theme::ALL.iter().map(Theme::name).collect();
                    format!("unknown theme '{}', expected one of {}", name, names.join(", "))
                })?;
                Command::Theme(theme)
            }
            "animation" => {
                let name = parts.next().context("usage: animation <name>")?;
                let style = AnimationStyle::from_name(name).with_context(|| {
                    let names: Vec<_> = AnimationStyle::ALL.iter().map(AnimationStyle::name).collect();
                    format!("unknown animation '{}', expected one of {}", name, names.join(", "))
                })?;
                Command::Animation(style)
            }
            "sounds" => Command::Sounds,
            "sound-add" => {
                let name = parts.next().context("usage: sound-add <name> <url>")?;
                let data_url = parts.next().context("usage: sound-add <name> <url>")?;
                Command::SoundAdd {
                    name: name.to_owned(),
                    data_url: data_url.to_owned(),
                }
            }
            "sound-remove" => {
                let id = parts.next().context("usage: sound-remove <id>")?;
                let id = id.strip_prefix("custom:").unwrap_or(id);
                Command::SoundRemove(id.to_owned())
            }
            "quit" | "exit" => Command::Quit,
            other => bail!("unknown command '{}', type 'help'", other),
        };

        Ok(command)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum Step {
    Reply(String),
    Quit,
}

/// Why [`Console::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleEnd {
    Quit,
    EndOfInput,
}

/// Returns the reply that keeps a challenge-mode alarm ringing, or `None` once
/// the right answer for the current question is given.
fn challenge_gate(
    pending: &mut Option<(AlarmId, MathChallenge)>,
    rng: &mut StdRng,
    active: &Alarm,
    answer: Option<u32>,
) -> Option<String> {
    if !active.challenge_mode {
        return None;
    }

    match (*pending, answer) {
        (Some((id, challenge)), Some(answer)) if id == active.id => {
            (!challenge.check(answer)).then(|| format!("Wrong answer. {}", challenge))
        }
        (Some((id, challenge)), None) if id == active.id => {
            Some(format!("{} Answer with 'stop <answer>'.", challenge))
        }
        _ => {
            let challenge = MathChallenge::generate(rng);
            *pending = Some((active.id, challenge));
            Some(format!("{} Answer with 'stop <answer>'.", challenge))
        }
    }
}

async fn write_line<W: AsyncWrite + Unpin + ?Sized>(out: &mut W, text: &str) -> std::io::Result<()> {
    out.write_all(text.as_bytes()).await?;
    out.write_all(b"\n").await?;
    out.flush().await
}

/// Line-based front end: turns user commands into manager, settings and sound library calls.
pub struct Console {
    manager: SharedAlarmManager,
    settings: SharedSettings,
    sounds: SoundLibrary,
    clock: Arc<dyn Clock>,
    delivery: Arc<dyn AlarmDeliveryChannel>,
    challenge: Option<(AlarmId, MathChallenge)>,
    rng: StdRng,
}

impl Console {
    pub fn new(
        manager: SharedAlarmManager,
        settings: SharedSettings,
        sounds: SoundLibrary,
        clock: Arc<dyn Clock>,
        delivery: Arc<dyn AlarmDeliveryChannel>,
    ) -> Self {
        Self {
            manager,
            settings,
            sounds,
            clock,
            delivery,
            challenge: None,
            rng: StdRng::from_entropy(),
        }
    }

    pub async fn run<R, W>(&mut self, input: R, mut output: W) -> anyhow::Result<ConsoleEnd>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        write_line(&mut output, "Type 'help' for commands.").await?;

        let mut input = input;
        let mut buffer = Vec::new();
        loop {
            buffer.clear();
            if input.read_until(b'\n', &mut buffer).await? == 0 {
                return Ok(ConsoleEnd::EndOfInput);
            }

            let line = String::from_utf8_lossy(&buffer);
            match self.handle_line(&line).await {
                Step::Quit => return Ok(ConsoleEnd::Quit),
                Step::Reply(reply) if reply.is_empty() => {}
                Step::Reply(reply) => write_line(&mut output, &reply).await?,
            }
        }
    }

    pub async fn handle_line(&mut self, line: &str) -> Step {
        let line = line.trim();
        if line.is_empty() {
            return Step::Reply(String::new());
        }

        let result = match line.parse::<Command>() {
            Ok(Command::Quit) => return Step::Quit,
            Ok(command) => self.execute(command).await,
            Err(error) => Err(error),
        };

        match result {
            Ok(reply) => Step::Reply(reply),
            Err(error) => {
                log::debug!("Command failed. [line = {}, error = {:#}]", line, error);
                Step::Reply(format!("error: {:#}", error))
            }
        }
    }

    pub async fn execute(&mut self, command: Command) -> anyhow::Result<String> {
        let reply = match command {
            Command::Help => HELP.to_owned(),
            Command::List => self.list().await,
            Command::Status => self.status().await,
            Command::Add { time, days, label } => {
                let form = AlarmForm {
                    time,
                    label,
                    days,
                    ..AlarmForm::default()
                };
                match self.manager.lock().await.add_alarm(&form) {
                    Ok(id) => format!("Added alarm {}.", id),
                    Err(errors) => format!("Invalid alarm: {}", errors),
                }
            }
            Command::Edit {
                id,
                time,
                days,
                label,
            } => {
                self.edit_alarm(id, |form| {
                    form.time = time;
                    form.days = days;
                    form.label = label;
                })
                .await
            }
            Command::Toggle(id) => {
                let mut manager = self.manager.lock().await;
                manager.toggle_alarm(id);
                match manager.alarm(id) {
                    Some(alarm) if alarm.enabled => format!("Alarm {} is on.", id),
                    Some(_) => format!("Alarm {} is off.", id),
                    None => format!("No alarm {}.", id),
                }
            }
            Command::Delete(id) => {
                let mut manager = self.manager.lock().await;
                if manager.alarm(id).is_none() {
                    format!("No alarm {}.", id)
                } else {
                    manager.delete_alarm(id);
                    format!("Deleted alarm {}.", id)
                }
            }
            Command::SetSound(id, sound) => {
                if let AlarmSound::Custom(sound_id) = &sound {
                    if self.sounds.get(sound_id).is_none() {
                        return Ok(format!("No custom sound {}.", sound_id));
                    }
                }
                self.edit_alarm(id, |form| form.sound = sound).await
            }
            Command::ToggleChallenge(id) => {
                self.edit_alarm(id, |form| form.challenge_mode = !form.challenge_mode)
                    .await
            }
            Command::ToggleAlarmVoice(id) => {
                self.edit_alarm(id, |form| form.use_voice = !form.use_voice)
                    .await
            }
            Command::Quick(minutes) => {
                let is_24_hour_format = self.is_24_hour_format().await;
                let mut manager = self.manager.lock().await;
                let id = manager.add_quick_alarm(minutes);
                match manager.alarm(id) {
                    Some(alarm) => format!(
                        "Quick alarm {} set for {}.",
                        id,
                        format_alarm_time(&alarm.time, is_24_hour_format)
                    ),
                    None => format!("Quick alarm {} set.", id),
                }
            }
            Command::Snooze => self.snooze().await,
            Command::Stop(answer) => self.stop(answer).await,
            Command::Dismiss => {
                let mut manager = self.manager.lock().await;
                let Some(active) = manager.active_alarm() else {
                    return Ok("Nothing is ringing.".to_owned());
                };
                let gate = challenge_gate(&mut self.challenge, &mut self.rng, active, None);
                if let Some(question) = gate {
                    return Ok(question);
                }

                manager.dismiss_alarm();
                self.challenge = None;
                "Dismissed.".to_owned()
            }
            Command::Volume(volume) => {
                let mut settings = self.settings.lock().await;
                settings.set_volume(volume);
                format!("Volume {}%.", settings.settings().alarm_volume)
            }
            Command::Format => {
                let mut settings = self.settings.lock().await;
                settings.toggle_time_format();
                match settings.settings().is_24_hour_format {
                    true => "Using 24-hour clock.".to_owned(),
                    false => "Using 12-hour clock.".to_owned(),
                }
            }
            Command::DarkMode => {
                let mut settings = self.settings.lock().await;
                settings.toggle_dark_mode();
                format!("Dark mode {}.", on_off(settings.settings().is_dark_mode))
            }
            Command::Voice => {
                let mut settings = self.settings.lock().await;
                settings.toggle_voice();
                format!(
                    "Voice announcements {}.",
                    on_off(settings.settings().voice_enabled)
                )
            }
            Command::Theme(theme) => {
                self.settings.lock().await.set_theme(theme);
                format!("Theme {}.", theme.name())
            }
            Command::Animation(style) => {
                self.settings.lock().await.set_animation_style(style);
                format!("Animation {}.", style.name())
            }
            Command::Sounds => self.sounds(),
            Command::SoundAdd { name, data_url } => {
                let sound = self.sounds.add(name, data_url);
                format!(
                    "Added sound {} ({}).",
                    AlarmSound::Custom(sound.id),
                    sound.name
                )
            }
            Command::SoundRemove(id) => {
                if self.sounds.get(&id).is_none() {
                    format!("No custom sound {}.", id)
                } else {
                    self.sounds.remove(&id);
                    format!("Removed sound {}.", id)
                }
            }
            Command::Quit => String::new(),
        };

        Ok(reply)
    }

    async fn is_24_hour_format(&self) -> bool {
        self.settings.lock().await.settings().is_24_hour_format
    }

    async fn edit_alarm(&self, id: AlarmId, change: impl FnOnce(&mut AlarmForm)) -> String {
        let mut manager = self.manager.lock().await;
        let Some(mut form) = manager.alarm(id).map(AlarmForm::from) else {
            return format!("No alarm {}.", id);
        };

        change(&mut form);
        match manager.update_alarm(id, &form) {
            Ok(()) => format!("Updated alarm {}.", id),
            Err(errors) => format!("Invalid alarm: {}", errors),
        }
    }

    fn sound_name(&self, sound: &AlarmSound) -> String {
        match sound {
            AlarmSound::Custom(id) => match self.sounds.get(id) {
                Some(custom) => custom.name.clone(),
                None => format!("{} (missing)", sound),
            },
            other => other.to_string(),
        }
    }

    fn describe(&self, alarm: &Alarm, is_24_hour_format: bool) -> String {
        let mut flags = Vec::new();
        if alarm.vibrate {
            flags.push("vibrate");
        }
        if alarm.gradual_wake {
            flags.push("gradual");
        }
        if alarm.challenge_mode {
            flags.push("challenge");
        }
        if alarm.use_voice {
            flags.push("voice");
        }

        format!(
            "{:>13}  {:<3}  {:>8}  {:<27}  {:<6}  {}  ♪ {}  {}",
            alarm.id,
            on_off(alarm.enabled),
            format_alarm_time(&alarm.time, is_24_hour_format),
            format_days(&alarm.days),
            alarm.priority.label(),
            alarm.label,
            self.sound_name(&alarm.sound),
            flags.join(",")
        )
        .trim_end()
        .to_owned()
    }

    async fn list(&self) -> String {
        let is_24_hour_format = self.is_24_hour_format().await;
        let manager = self.manager.lock().await;
        if manager.alarms().is_empty() {
            return "No alarms.".to_owned();
        }

        manager
            .alarms()
            .iter()
            .map(|alarm| self.describe(alarm, is_24_hour_format))
            .collect::<Vec<_>>()
            .join("\n")
    }

    async fn status(&self) -> String {
        let settings = self.settings.lock().await.settings().clone();
        let manager = self.manager.lock().await;
        let now = self.clock.now();

        let mut lines = vec![format!(
            "Now {}",
            format_clock(&now, settings.is_24_hour_format)
        )];

        match manager.active_alarm() {
            Some(alarm) => lines.push(format!(
                "Ringing: {} {}",
                format_alarm_time(&alarm.time, settings.is_24_hour_format),
                alarm.label
            )),
            None => lines.push("Nothing is ringing.".to_owned()),
        }

        if manager.snooze_count() > 0 {
            let pulse = if manager.is_snoozing() { " zzz" } else { "" };
            lines.push(format!(
                "Snoozed {}/{}{}",
                manager.snooze_count(),
                manager.max_snooze_count(),
                pulse
            ));
        }

        lines.push(settings_line(&settings));
        lines.join("\n")
    }

    async fn snooze(&mut self) -> String {
        let is_24_hour_format = self.is_24_hour_format().await;
        let mut manager = self.manager.lock().await;
        if manager.active_alarm().is_none() {
            return "Nothing is ringing.".to_owned();
        }
        if !manager.can_snooze() {
            return format!(
                "Snooze limit reached ({}/{}).",
                manager.snooze_count(),
                manager.max_snooze_count()
            );
        }

        let Some(follow_up_id) = manager.snooze() else {
            return "Nothing is ringing.".to_owned();
        };
        let Some(follow_up) = manager.alarm(follow_up_id).cloned() else {
            return format!("Snoozed, but alarm {} is gone.", follow_up_id);
        };
        let (count, max) = (manager.snooze_count(), manager.max_snooze_count());
        drop(manager);

        self.challenge = None;
        self.delivery
            .send_alarm_notification(&follow_up, AlarmMessageType::Snoozed)
            .await;

        format!(
            "Snoozed until {} ({}/{}).",
            format_alarm_time(&follow_up.time, is_24_hour_format),
            count,
            max
        )
    }

    async fn stop(&mut self, answer: Option<u32>) -> String {
        let mut manager = self.manager.lock().await;
        let Some(active) = manager.active_alarm().cloned() else {
            return "Nothing is ringing.".to_owned();
        };

        let gate = challenge_gate(&mut self.challenge, &mut self.rng, &active, answer);
        if let Some(question) = gate {
            return question;
        }

        manager.stop_alarm();
        drop(manager);

        self.challenge = None;
        self.delivery
            .send_alarm_notification(&active, AlarmMessageType::Stopped)
            .await;

        format!("Stopped '{}'.", active.label)
    }

    fn sounds(&self) -> String {
        let builtin: Vec<_> = BuiltinSound::ALL.iter().map(BuiltinSound::key).collect();
        let mut lines = vec![format!("Built-in: {}", builtin.join(", "))];

        if self.sounds.list().is_empty() {
            lines.push("No custom sounds.".to_owned());
        }
        for sound in self.sounds.list() {
            lines.push(format!(
                "{}  {}",
                AlarmSound::Custom(sound.id.clone()),
                sound.name
            ));
        }

        lines.join("\n")
    }
}

fn on_off(value: bool) -> &'static str {
    if value { "on" } else { "off" }
}

fn settings_line(settings: &Settings) -> String {
    format!(
        "Theme {} | {} | dark mode {} | voice {} | animation {} | volume {}%",
        settings.theme.name(),
        if settings.is_24_hour_format { "24h" } else { "12h" },
        on_off(settings.is_dark_mode),
        on_off(settings.voice_enabled),
        settings.animation_style.name(),
        settings.alarm_volume
    )
}

fn get_message_text(alarm: &Alarm, message: AlarmMessageType, settings: &Settings) -> String {
    let time = format_alarm_time(&alarm.time, settings.is_24_hour_format);
    match message {
        AlarmMessageType::Ringing => {
            let mut text = format!(
                "🚨 {} {} [{}] ♪ {} at {}%",
                time,
                alarm.label,
                alarm.priority.label(),
                alarm.sound,
                settings.alarm_volume
            );
            if alarm.gradual_wake {
                text.push_str(", fading in");
            }
            if alarm.vibrate {
                text.push_str(", vibrating");
            }
            if settings.should_announce(alarm) {
                text.push_str(&format!("\n🗣️ \"{}\"", alarm.label));
            }
            if alarm.challenge_mode {
                text.push_str("\nType 'stop' to get the challenge.");
            }
            text
        }
        AlarmMessageType::Snoozed => format!("💤 {}: ringing again at {}", alarm.label, time),
        AlarmMessageType::Stopped => format!("✅ {}", alarm.label),
    }
}

/// Prints alarm notifications to a terminal-like writer.
pub struct ConsoleDeliveryChannel<W> {
    settings: SharedSettings,
    out: Mutex<W>,
}

impl<W> ConsoleDeliveryChannel<W> {
    pub fn new(settings: SharedSettings, out: W) -> Self {
        Self {
            settings,
            out: Mutex::new(out),
        }
    }
}

#[async_trait]
impl<W> AlarmDeliveryChannel for ConsoleDeliveryChannel<W>
where
    W: AsyncWrite + Send + Unpin + 'static,
{
    async fn send_alarm_notification(&self, alarm: &Alarm, message: AlarmMessageType) {
        let settings = self.settings.lock().await.settings().clone();
        let text = get_message_text(alarm, message, &settings);

        let mut out = self.out.lock().await;
        if let Err(error) = write_line(&mut *out, &text).await {
            log::warn!(
                "Could not print alarm notification. [alarm_id = {}, error = {}]",
                alarm.id,
                error
            );
        }
    }
}

#[cfg(test)]
mod tests;
