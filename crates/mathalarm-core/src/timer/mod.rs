mod countdown;
mod stopwatch;

pub use countdown::{CountdownState, CountdownTimer};
pub use stopwatch::{format_elapsed, Stopwatch};

fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
