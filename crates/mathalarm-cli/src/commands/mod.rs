pub mod alarm;
pub mod config;
pub mod ring;
pub mod stopwatch;
pub mod timer;

use mathalarm_core::notify::MemoryScheduler;
use mathalarm_core::storage::Database;
use mathalarm_core::{AlarmBook, Config};

const SCHEDULER_KEY: &str = "scheduler";

/// Alarms and their pending notifications, loaded together and saved together.
pub struct AlarmState {
    pub book: AlarmBook,
    pub scheduler: MemoryScheduler,
}

impl AlarmState {
    pub fn load(db: &Database, config: &Config) -> Result<Self, Box<dyn std::error::Error>> {
        let book = AlarmBook::from_alarms(db.load_alarms()?);
        let mut scheduler = match db.kv_get_json::<MemoryScheduler>(SCHEDULER_KEY) {
            Ok(Some(scheduler)) => scheduler,
            Ok(None) => MemoryScheduler::default(),
            Err(e) => {
                tracing::warn!("discarding unreadable notification queue: {e}");
                MemoryScheduler::default()
            }
        };
        scheduler.set_config(config.notifications.clone());
        Ok(Self { book, scheduler })
    }

    pub fn save(&self, db: &mut Database) -> Result<(), Box<dyn std::error::Error>> {
        db.replace_alarms(self.book.list())?;
        db.kv_set_json(SCHEDULER_KEY, &self.scheduler)?;
        Ok(())
    }
}

pub fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
