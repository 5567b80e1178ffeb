mod book;
mod fire_time;
mod spec;

pub use book::{AlarmBook, AlarmEdit};
pub use fire_time::{compute_next_fire, schedule_fire, ScheduledFire};
pub use spec::{parse_clock_time, AlarmId, AlarmSpec, Meridiem, RepeatDays};
