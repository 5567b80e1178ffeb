//! Audio/vibration output used while an alarm is ringing.
//!
//! The device itself lives outside the core. A [`SignalGuard`] holds it for
//! the duration of a dismiss challenge and stops it exactly once, whether the
//! challenge is solved, cancelled or simply dropped.

use serde::{Deserialize, Serialize};

/// Something that can ring and vibrate.
///
/// Implementations must tolerate `start` while already started and `stop`
/// while already stopped.
pub trait SignalOutput {
    fn start(&mut self, looping: bool);
    fn stop(&mut self);
}

impl<S: SignalOutput + ?Sized> SignalOutput for &mut S {
    fn start(&mut self, looping: bool) {
        (**self).start(looping)
    }

    fn stop(&mut self) {
        (**self).stop()
    }
}

impl<S: SignalOutput + ?Sized> SignalOutput for Box<S> {
    fn start(&mut self, looping: bool) {
        (**self).start(looping)
    }

    fn stop(&mut self) {
        (**self).stop()
    }
}

/// Signal settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalConfig {
    /// Alternating vibrate/pause durations in milliseconds.
    #[serde(default = "default_vibration_pattern")]
    pub vibration_pattern_ms: Vec<u64>,
    #[serde(default = "default_true")]
    pub vibrate: bool,
    #[serde(default = "default_true")]
    pub looping: bool,
    #[serde(default = "default_volume")]
    pub volume: u32,
}

fn default_vibration_pattern() -> Vec<u64> {
    vec![500, 500, 500, 500]
}
fn default_true() -> bool {
    true
}
fn default_volume() -> u32 {
    80
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            vibration_pattern_ms: default_vibration_pattern(),
            vibrate: true,
            looping: true,
            volume: default_volume(),
        }
    }
}

/// Exclusive hold on a [`SignalOutput`] while it plays.
#[derive(Debug)]
pub struct SignalGuard<S: SignalOutput> {
    output: S,
    playing: bool,
}

impl<S: SignalOutput> SignalGuard<S> {
    pub fn new(output: S) -> Self {
        Self {
            output,
            playing: false,
        }
    }

    /// Start playback unless already playing.
    pub fn acquire(&mut self, looping: bool) {
        if !self.playing {
            self.output.start(looping);
            self.playing = true;
        }
    }

    /// Stop playback. Only the first call after `acquire` reaches the device.
    pub fn release(&mut self) {
        if self.playing {
            self.output.stop();
            self.playing = false;
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn output(&self) -> &S {
        &self.output
    }
}

impl<S: SignalOutput> Drop for SignalGuard<S> {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counter {
        starts: u32,
        stops: u32,
    }

    impl SignalOutput for Counter {
        fn start(&mut self, _looping: bool) {
            self.starts += 1;
        }
        fn stop(&mut self) {
            self.stops += 1;
        }
    }

    #[test]
    fn release_reaches_device_once() {
        let mut device = Counter::default();
        {
            let mut guard = SignalGuard::new(&mut device);
            guard.acquire(true);
            guard.acquire(true);
            guard.release();
            guard.release();
        }
        assert_eq!(device.starts, 1);
        assert_eq!(device.stops, 1);
    }

    #[test]
    fn drop_releases() {
        let mut device = Counter::default();
        {
            let mut guard = SignalGuard::new(&mut device);
            guard.acquire(false);
        }
        assert_eq!(device.stops, 1);
    }

    #[test]
    fn unacquired_guard_never_stops() {
        let mut device = Counter::default();
        drop(SignalGuard::new(&mut device));
        assert_eq!(device.stops, 0);
    }
}
