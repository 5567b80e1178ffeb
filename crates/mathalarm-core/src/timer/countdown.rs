//! Countdown timer.
//!
//! Wall-clock based like the rest of the timers: there is no internal
//! thread, the caller invokes `tick()` periodically. Every command has an
//! `_at` variant taking epoch milliseconds for deterministic driving.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> Paused
//!           |
//!           v
//!        Finished -> (start) Running
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::now_ms;
use crate::events::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CountdownState {
    Idle,
    Running,
    Paused,
    Finished,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountdownTimer {
    duration_secs: u64,
    state: CountdownState,
    remaining_ms: u64,
    /// Timestamp (ms since epoch) of the last flush while running.
    #[serde(default)]
    last_tick_epoch_ms: Option<u64>,
}

impl Default for CountdownTimer {
    fn default() -> Self {
        Self::new(0)
    }
}

impl CountdownTimer {
    pub fn new(duration_secs: u64) -> Self {
        Self {
            duration_secs,
            state: CountdownState::Idle,
            remaining_ms: duration_secs.saturating_mul(1000),
            last_tick_epoch_ms: None,
        }
    }

    pub fn from_hms(hours: u64, minutes: u64, seconds: u64) -> Self {
        Self::new(hms_to_secs(hours, minutes, seconds))
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> CountdownState {
        self.state
    }

    pub fn duration_secs(&self) -> u64 {
        self.duration_secs
    }

    pub fn remaining_ms(&self) -> u64 {
        self.remaining_ms
    }

    /// Remaining time as `HH:MM:SS`, rounded up to the next whole second.
    pub fn display(&self) -> String {
        let secs = self.remaining_ms.div_ceil(1000);
        format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
    }

    pub fn snapshot(&self) -> Event {
        Event::CountdownSnapshot {
            state: self.state,
            duration_secs: self.duration_secs,
            remaining_ms: self.remaining_ms,
            display: self.display(),
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Configure a new duration. Ignored while running.
    pub fn set(&mut self, hours: u64, minutes: u64, seconds: u64) -> bool {
        if self.state == CountdownState::Running {
            return false;
        }
        *self = Self::from_hms(hours, minutes, seconds);
        true
    }

    pub fn start(&mut self) -> Option<Event> {
        self.start_at(now_ms())
    }

    pub fn start_at(&mut self, now: u64) -> Option<Event> {
        match self.state {
            CountdownState::Idle | CountdownState::Finished => {
                if self.duration_secs == 0 {
                    return None;
                }
                self.remaining_ms = self.duration_secs.saturating_mul(1000);
                self.state = CountdownState::Running;
                self.last_tick_epoch_ms = Some(now);
                Some(Event::CountdownStarted {
                    duration_secs: self.duration_secs,
                    remaining_ms: self.remaining_ms,
                    at: Utc::now(),
                })
            }
            CountdownState::Paused => self.resume_at(now),
            CountdownState::Running => None,
        }
    }

    /// Start/pause button: pauses a running timer, otherwise starts it.
    pub fn toggle(&mut self) -> Option<Event> {
        self.toggle_at(now_ms())
    }

    pub fn toggle_at(&mut self, now: u64) -> Option<Event> {
        if self.state == CountdownState::Running {
            self.pause_at(now)
        } else {
            self.start_at(now)
        }
    }

    pub fn pause(&mut self) -> Option<Event> {
        self.pause_at(now_ms())
    }

    pub fn pause_at(&mut self, now: u64) -> Option<Event> {
        if self.state != CountdownState::Running {
            return None;
        }
        self.flush_elapsed(now);
        if self.remaining_ms == 0 {
            // Ran out before the pause arrived.
            return self.finish();
        }
        self.state = CountdownState::Paused;
        self.last_tick_epoch_ms = None;
        Some(Event::CountdownPaused {
            remaining_ms: self.remaining_ms,
            at: Utc::now(),
        })
    }

    pub fn resume(&mut self) -> Option<Event> {
        self.resume_at(now_ms())
    }

    pub fn resume_at(&mut self, now: u64) -> Option<Event> {
        if self.state != CountdownState::Paused {
            return None;
        }
        self.state = CountdownState::Running;
        self.last_tick_epoch_ms = Some(now);
        Some(Event::CountdownResumed {
            remaining_ms: self.remaining_ms,
            at: Utc::now(),
        })
    }

    /// Back to idle with the duration cleared.
    pub fn reset(&mut self) -> Option<Event> {
        *self = Self::new(0);
        Some(Event::CountdownReset { at: Utc::now() })
    }

    /// Call periodically. Returns `Some(Event::CountdownFinished)` exactly
    /// once, on the tick that reaches zero.
    pub fn tick(&mut self) -> Option<Event> {
        self.tick_at(now_ms())
    }

    pub fn tick_at(&mut self, now: u64) -> Option<Event> {
        if self.state != CountdownState::Running {
            return None;
        }
        self.flush_elapsed(now);
        if self.remaining_ms == 0 {
            return self.finish();
        }
        None
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn finish(&mut self) -> Option<Event> {
        self.state = CountdownState::Finished;
        self.last_tick_epoch_ms = None;
        tracing::info!(duration_secs = self.duration_secs, "countdown finished");
        Some(Event::CountdownFinished {
            duration_secs: self.duration_secs,
            at: Utc::now(),
        })
    }

    fn flush_elapsed(&mut self, now: u64) {
        if let Some(last) = self.last_tick_epoch_ms {
            let elapsed = now.saturating_sub(last);
            self.remaining_ms = self.remaining_ms.saturating_sub(elapsed);
            self.last_tick_epoch_ms = Some(now);
        }
    }
}

fn hms_to_secs(hours: u64, minutes: u64, seconds: u64) -> u64 {
    hours
        .saturating_mul(3600)
        .saturating_add(minutes.saturating_mul(60))
        .saturating_add(seconds)
}
