use std::io::{BufRead, Write};

use chrono::{Local, Utc};
use clap::Args;
use mathalarm_core::notify::{
    notification_channel, Notification, NotificationEvent, NotificationScheduler, Presentation,
    Route,
};
use mathalarm_core::storage::Database;
use mathalarm_core::{AlarmId, Config, Event, SessionState, SignalConfig, SignalOutput};

use super::AlarmState;

#[derive(Args)]
pub struct RingArgs {
    /// Alarm ID to ring now. Without it, every notification that is due rings in turn
    id: Option<String>,
}

/// Rings on the terminal: bell plus a banner on stderr.
struct TerminalSignal {
    config: SignalConfig,
    /// Ring the terminal bell; off when the notification is silent.
    bell: bool,
    ringing: bool,
}

impl TerminalSignal {
    fn new(config: SignalConfig, bell: bool) -> Self {
        Self {
            config,
            bell,
            ringing: false,
        }
    }
}

impl SignalOutput for TerminalSignal {
    fn start(&mut self, looping: bool) {
        if self.ringing {
            return;
        }
        self.ringing = true;
        let mode = if looping { "looping" } else { "once" };
        let bell = if self.bell { "\x07" } else { "" };
        if self.config.vibrate {
            eprintln!(
                "{bell}*** RINGING ({mode}, volume {}%, vibration {:?} ms) ***",
                self.config.volume, self.config.vibration_pattern_ms
            );
        } else {
            eprintln!("{bell}*** RINGING ({mode}, volume {}%) ***", self.config.volume);
        }
    }

    fn stop(&mut self) {
        if self.ringing {
            self.ringing = false;
            eprintln!("*** silenced ***");
        }
    }
}

fn emit(event: &Event) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string(event)?);
    std::io::stdout().flush()?;
    Ok(())
}

fn show_alert(presentation: &Presentation) {
    if let Some(badge) = presentation.badge {
        eprintln!("[{badge}]");
    }
    let Some(alert) = &presentation.alert else {
        return;
    };
    if presentation.banner {
        eprintln!(
            "=== {} === (buzz {:?} ms)",
            alert.title, presentation.vibration_pattern_ms
        );
    } else {
        eprintln!("{}", alert.title);
    }
    if let Some(body) = &alert.body {
        eprintln!("{body}");
    }
}

fn list_title(notification: &Notification, presentation: &Presentation) -> String {
    presentation
        .alert
        .as_ref()
        .map_or_else(|| notification.content.title.clone(), |alert| alert.title.clone())
}

/// Run one challenge to completion. EOF on stdin cancels it.
fn run_challenge(
    config: &Config,
    notification: Notification,
    presentation: &Presentation,
    input: &mut impl BufRead,
) -> Result<SessionState, Box<dyn std::error::Error>> {
    let (tx, mut dispatcher) = notification_channel(config.challenge.clone());
    tx.send(NotificationEvent::Delivered { notification })?;

    let Some(dispatch) = dispatcher.poll() else {
        return Ok(SessionState::Idle);
    };
    show_alert(presentation);
    if dispatch.route == Route::Home {
        return Ok(SessionState::Idle);
    }

    let output = TerminalSignal::new(config.signal.clone(), presentation.sound.is_some());
    let Some(session) = dispatcher.session_for(&dispatch, output) else {
        return Ok(SessionState::Idle);
    };
    let mut session = session.with_looping(config.signal.looping);

    if let Some(event) = session.activate() {
        emit(&event)?;
    }

    let mut line = String::new();
    while session.state() == SessionState::Active {
        if let Some(challenge) = session.challenge() {
            eprint!("{} ", challenge.prompt());
            std::io::stderr().flush()?;
        }
        line.clear();
        if input.read_line(&mut line)? == 0 {
            if let Some(event) = session.cancel() {
                emit(&event)?;
            }
            break;
        }
        if let Some(event) = session.submit(&line) {
            emit(&event)?;
        }
    }
    Ok(session.state())
}

pub fn run(args: RingArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let mut db = Database::open()?;
    let mut state = AlarmState::load(&db, &config)?;
    let now_utc = Local::now().with_timezone(&Utc);

    // (notification, whether it consumes a scheduled fire)
    let rings: Vec<(Notification, bool)> = match args.id {
        Some(id) => {
            let id: AlarmId = id.parse()?;
            let alarm = state.book.get(id)?;
            let due = state
                .scheduler
                .pending()
                .into_iter()
                .find(|n| n.alarm_id == id && n.fire_at <= now_utc);
            match due {
                Some(notification) => vec![(notification, true)],
                // Test ring: the schedule stays as it is.
                None => vec![(Notification::for_alarm(alarm, now_utc), false)],
            }
        }
        None => state
            .scheduler
            .take_due(now_utc)
            .into_iter()
            .map(|n| (n, true))
            .collect(),
    };

    if rings.is_empty() {
        eprintln!("No alarms due");
        return Ok(());
    }

    let total = rings.len();
    let presentations: Vec<Presentation> = rings
        .iter()
        .enumerate()
        .map(|(i, (n, _))| state.scheduler.config().present(n, total - i))
        .collect();
    for ((notification, _), presentation) in rings.iter().zip(&presentations) {
        if presentation.list {
            eprintln!(
                "- {} {}",
                notification.fire_at.with_timezone(&Local).format("%H:%M"),
                list_title(notification, presentation)
            );
        }
    }

    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    for ((notification, consumes_fire), presentation) in rings.into_iter().zip(&presentations) {
        let alarm_id = notification.alarm_id;
        let outcome = run_challenge(&config, notification.clone(), presentation, &mut input)?;
        tracing::info!(%alarm_id, ?outcome, "ring finished");

        let enabled = state
            .book
            .get(alarm_id)
            .map(|alarm| alarm.is_enabled())
            .unwrap_or(false);
        if consumes_fire && enabled {
            let event = state
                .book
                .on_fired(&notification, &Local::now(), &mut state.scheduler)?;
            emit(&event)?;
        }
    }

    state.save(&mut db)?;
    Ok(())
}
