use clap::Subcommand;
use mathalarm_core::storage::Database;
use mathalarm_core::CountdownTimer;

use super::print_json;

const COUNTDOWN_KEY: &str = "countdown";

#[derive(Subcommand)]
pub enum TimerAction {
    /// Set the countdown duration (ignored while running)
    Set {
        #[arg(long, default_value = "0")]
        hours: u64,
        #[arg(long, default_value = "0")]
        minutes: u64,
        #[arg(long, default_value = "0")]
        seconds: u64,
    },
    /// Start, or resume when paused
    Start,
    /// Pause the countdown
    Pause,
    /// Start/pause button
    Toggle,
    /// Reset to idle and clear the duration
    Reset,
    /// Print current countdown state as JSON
    Status,
}

fn load_timer(db: &Database) -> CountdownTimer {
    match db.kv_get_json::<CountdownTimer>(COUNTDOWN_KEY) {
        Ok(Some(timer)) => timer,
        Ok(None) => CountdownTimer::default(),
        Err(e) => {
            tracing::warn!("resetting unreadable countdown state: {e}");
            CountdownTimer::default()
        }
    }
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let mut timer = load_timer(&db);

    // Bring the clock up to date before acting on it.
    let finished = timer.tick();

    match action {
        TimerAction::Set {
            hours,
            minutes,
            seconds,
        } => {
            if !timer.set(hours, minutes, seconds) {
                return Err("timer is running; pause or reset it first".into());
            }
            print_json(&timer.snapshot())?;
        }
        TimerAction::Start => match timer.start() {
            Some(event) => print_json(&event)?,
            None => print_json(&timer.snapshot())?,
        },
        TimerAction::Pause => match timer.pause() {
            Some(event) => print_json(&event)?,
            None => print_json(&timer.snapshot())?,
        },
        TimerAction::Toggle => match timer.toggle() {
            Some(event) => print_json(&event)?,
            None => print_json(&timer.snapshot())?,
        },
        TimerAction::Reset => {
            if let Some(event) = timer.reset() {
                print_json(&event)?;
            }
        }
        TimerAction::Status => {
            print_json(&timer.snapshot())?;
            if let Some(event) = &finished {
                print_json(event)?;
            }
        }
    }

    db.kv_set_json(COUNTDOWN_KEY, &timer)?;
    Ok(())
}
