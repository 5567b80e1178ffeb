use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::alarm::AlarmId;
use crate::challenge::SessionState;
use crate::timer::CountdownState;

/// Every state change in the system produces an Event.
/// The UI renders them; the CLI prints them as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    AlarmScheduled {
        alarm_id: AlarmId,
        fire_at: DateTime<Utc>,
        at: DateTime<Utc>,
    },
    AlarmCancelled {
        alarm_id: AlarmId,
        at: DateTime<Utc>,
    },
    /// A scheduled fire was consumed. `next_fire_at` is set for repeating alarms.
    AlarmFired {
        alarm_id: AlarmId,
        next_fire_at: Option<DateTime<Utc>>,
        at: DateTime<Utc>,
    },
    ChallengeIssued {
        alarm_id: AlarmId,
        prompt: String,
        at: DateTime<Utc>,
    },
    /// Wrong answer; the alarm keeps ringing.
    ChallengeFailed {
        alarm_id: AlarmId,
        attempts: u32,
        regenerated: bool,
        prompt: String,
        at: DateTime<Utc>,
    },
    ChallengeSolved {
        alarm_id: AlarmId,
        attempts: u32,
        at: DateTime<Utc>,
    },
    /// User left the challenge without solving it.
    ChallengeCancelled {
        alarm_id: AlarmId,
        attempts: u32,
        at: DateTime<Utc>,
    },
    ChallengeSnapshot {
        alarm_id: AlarmId,
        state: SessionState,
        prompt: Option<String>,
        attempts: u32,
        at: DateTime<Utc>,
    },
    CountdownStarted {
        duration_secs: u64,
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    CountdownPaused {
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    CountdownResumed {
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    CountdownFinished {
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    CountdownReset {
        at: DateTime<Utc>,
    },
    CountdownSnapshot {
        state: CountdownState,
        duration_secs: u64,
        remaining_ms: u64,
        display: String,
        at: DateTime<Utc>,
    },
    StopwatchStarted {
        elapsed_ms: u64,
        at: DateTime<Utc>,
    },
    StopwatchStopped {
        elapsed_ms: u64,
        at: DateTime<Utc>,
    },
    LapRecorded {
        lap_number: usize,
        elapsed_ms: u64,
        split_ms: u64,
        at: DateTime<Utc>,
    },
    StopwatchReset {
        at: DateTime<Utc>,
    },
    StopwatchSnapshot {
        running: bool,
        elapsed_ms: u64,
        display: String,
        laps: Vec<u64>,
        at: DateTime<Utc>,
    },
}
