use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::now_ms;
use crate::events::Event;

/// Stopwatch with laps.
///
/// Lap is only available while running and reset only while stopped, the
/// same way a two-button stopwatch behaves.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Stopwatch {
    /// Elapsed time flushed up to `last_tick_epoch_ms`.
    elapsed_ms: u64,
    #[serde(default)]
    last_tick_epoch_ms: Option<u64>,
    /// Cumulative elapsed time at each lap, most recent first.
    #[serde(default)]
    laps: Vec<u64>,
}

impl Stopwatch {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn is_running(&self) -> bool {
        self.last_tick_epoch_ms.is_some()
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms_at(now_ms())
    }

    pub fn elapsed_ms_at(&self, now: u64) -> u64 {
        match self.last_tick_epoch_ms {
            Some(last) => self.elapsed_ms + now.saturating_sub(last),
            None => self.elapsed_ms,
        }
    }

    pub fn laps(&self) -> &[u64] {
        &self.laps
    }

    pub fn snapshot_at(&self, now: u64) -> Event {
        let elapsed_ms = self.elapsed_ms_at(now);
        Event::StopwatchSnapshot {
            running: self.is_running(),
            elapsed_ms,
            display: format_elapsed(elapsed_ms),
            laps: self.laps.clone(),
            at: Utc::now(),
        }
    }

    pub fn snapshot(&self) -> Event {
        self.snapshot_at(now_ms())
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Option<Event> {
        self.start_at(now_ms())
    }

    pub fn start_at(&mut self, now: u64) -> Option<Event> {
        if self.is_running() {
            return None;
        }
        self.last_tick_epoch_ms = Some(now);
        Some(Event::StopwatchStarted {
            elapsed_ms: self.elapsed_ms,
            at: Utc::now(),
        })
    }

    pub fn stop(&mut self) -> Option<Event> {
        self.stop_at(now_ms())
    }

    pub fn stop_at(&mut self, now: u64) -> Option<Event> {
        if !self.is_running() {
            return None;
        }
        self.elapsed_ms = self.elapsed_ms_at(now);
        self.last_tick_epoch_ms = None;
        Some(Event::StopwatchStopped {
            elapsed_ms: self.elapsed_ms,
            at: Utc::now(),
        })
    }

    pub fn lap(&mut self) -> Option<Event> {
        self.lap_at(now_ms())
    }

    pub fn lap_at(&mut self, now: u64) -> Option<Event> {
        if !self.is_running() {
            return None;
        }
        // Laps never go backwards, even if the wall clock does.
        let previous = self.laps.first().copied().unwrap_or(0);
        let elapsed_ms = self.elapsed_ms_at(now).max(previous);
        let split_ms = elapsed_ms.saturating_sub(previous);
        self.laps.insert(0, elapsed_ms);
        Some(Event::LapRecorded {
            lap_number: self.laps.len(),
            elapsed_ms,
            split_ms,
            at: Utc::now(),
        })
    }

    pub fn reset(&mut self) -> Option<Event> {
        if self.is_running() {
            return None;
        }
        self.elapsed_ms = 0;
        self.laps.clear();
        Some(Event::StopwatchReset { at: Utc::now() })
    }
}

/// `HH:MM:SS.cc`
pub fn format_elapsed(ms: u64) -> String {
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1_000;
    let centis = (ms % 1_000) / 10;
    format!("{hours:02}:{minutes:02}:{seconds:02}.{centis:02}")
}
