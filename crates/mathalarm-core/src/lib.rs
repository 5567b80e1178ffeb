//! # Mathalarm Core Library
//!
//! This library provides the core logic for the Mathalarm alarm clock: alarms
//! that can only be silenced by solving an arithmetic problem. All operations
//! are available through the standalone CLI binary, which is a thin layer
//! over this crate.
//!
//! ## Architecture
//!
//! - **Alarms**: Validated alarm definitions and the next-fire-time computation
//!   for one-shot and weekly repeating alarms in any [`chrono::TimeZone`]
//! - **Notifications**: A scheduler abstraction with an in-memory
//!   implementation, plus a channel-based dispatcher that routes delivered or
//!   tapped notifications to the dismiss screen
//! - **Challenge**: The dismiss state machine; the ringing signal is held by an
//!   RAII guard and released exactly once
//! - **Timers**: Wall-clock countdown timer and stopwatch; the caller invokes
//!   `tick()` for progress
//! - **Storage**: SQLite-based alarm storage and TOML-based configuration
//!
//! ## Key Components
//!
//! - [`compute_next_fire`]: Next fire instant for an alarm
//! - [`AlarmBook`]: Alarm collection that keeps notifications in sync
//! - [`DismissSession`]: Math challenge gating the alarm signal
//! - [`Database`]: Alarm and state persistence
//! - [`Config`]: Application configuration management

pub mod alarm;
pub mod challenge;
pub mod notify;
pub mod signal;
pub mod timer;
pub mod storage;
pub mod events;
pub mod error;

pub use alarm::{compute_next_fire, AlarmBook, AlarmEdit, AlarmId, AlarmSpec, Meridiem, RepeatDays};
pub use challenge::{Challenge, ChallengePolicy, DismissSession, SessionState};
pub use notify::{MemoryScheduler, Notification, NotificationScheduler};
pub use signal::{SignalConfig, SignalGuard, SignalOutput};
pub use timer::{CountdownState, CountdownTimer, Stopwatch};
pub use storage::{Config, Database};
pub use events::Event;
pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
