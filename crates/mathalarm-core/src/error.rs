//! Core error types for mathalarm-core.
//!
//! Alarm validation problems surface when an alarm is created or edited,
//! storage problems from the storage layer. A wrong or malformed challenge
//! answer is never an error.

use std::path::PathBuf;
use thiserror::Error;

use crate::alarm::AlarmId;

/// Core error type for mathalarm-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// The alarm could not be created or edited as requested
    #[error("Invalid alarm: {0}")]
    InvalidAlarmSpec(#[from] ValidationError),

    /// No alarm with this id exists
    #[error("Alarm not found: {0}")]
    AlarmNotFound(AlarmId),

    /// Disabled alarms have no next fire time
    #[error("Alarm {0} is disabled")]
    AlarmDisabled(AlarmId),

    /// The notification scheduler refused an operation
    #[error("Scheduler error: {0}")]
    Scheduler(String),

    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Validation errors for alarm and challenge input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("hour {0} is out of range")]
    HourOutOfRange(u32),

    #[error("minute {0} is out of range (0-59)")]
    MinuteOutOfRange(u32),

    /// Text that does not look like `H:MM`
    #[error("malformed time '{0}', expected H:MM")]
    MalformedTime(String),

    #[error("unknown weekday '{0}'")]
    UnknownWeekday(String),

    /// Challenge operand bound outside `OPERAND_BOUNDS`
    #[error("operand {0} is out of range (1-1000)")]
    OperandOutOfRange(i64),
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// A stored row could not be decoded back into a domain type
    #[error("Corrupt row in '{table}': {message}")]
    CorruptRow { table: String, message: String },

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown dot-path key
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// No home/config directory could be determined or created
    #[error("Cannot prepare data directory: {0}")]
    DataDir(String),
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _msg) => {
                if e.code == rusqlite::ErrorCode::DatabaseLocked {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
