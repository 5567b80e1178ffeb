use clap::Subcommand;
use mathalarm_core::storage::Database;
use mathalarm_core::Stopwatch;

use super::print_json;

const STOPWATCH_KEY: &str = "stopwatch";

#[derive(Subcommand)]
pub enum StopwatchAction {
    /// Start or continue counting
    Start,
    /// Stop counting
    Stop,
    /// Record a lap (only while running)
    Lap,
    /// Clear elapsed time and laps (only while stopped)
    Reset,
    /// Print current stopwatch state as JSON
    Status,
}

fn load_stopwatch(db: &Database) -> Stopwatch {
    match db.kv_get_json::<Stopwatch>(STOPWATCH_KEY) {
        Ok(Some(stopwatch)) => stopwatch,
        Ok(None) => Stopwatch::default(),
        Err(e) => {
            tracing::warn!("resetting unreadable stopwatch state: {e}");
            Stopwatch::default()
        }
    }
}

pub fn run(action: StopwatchAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let mut stopwatch = load_stopwatch(&db);

    let event = match action {
        StopwatchAction::Start => stopwatch.start(),
        StopwatchAction::Stop => stopwatch.stop(),
        StopwatchAction::Lap => {
            let lap = stopwatch.lap();
            if lap.is_none() {
                return Err("stopwatch is not running".into());
            }
            lap
        }
        StopwatchAction::Reset => {
            let reset = stopwatch.reset();
            if reset.is_none() {
                return Err("stop the stopwatch before resetting".into());
            }
            reset
        }
        StopwatchAction::Status => None,
    };

    match event {
        Some(event) => print_json(&event)?,
        None => print_json(&stopwatch.snapshot())?,
    }

    db.kv_set_json(STOPWATCH_KEY, &stopwatch)?;
    Ok(())
}
