//! User-configured alarms.
//!
//! An [`AlarmSpec`] is a wall-clock time (24-hour, normalized from 12-hour
//! input), an optional weekday repeat mask and an enabled flag. The hour and
//! minute are validated on every path that can set them, including
//! deserialization.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// Opaque, immutable alarm identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlarmId(Uuid);

impl AlarmId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AlarmId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AlarmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for AlarmId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Meridiem {
    Am,
    Pm,
}

impl Meridiem {
    pub fn of_hour(hour: u32) -> Self {
        if hour >= 12 {
            Meridiem::Pm
        } else {
            Meridiem::Am
        }
    }
}

impl fmt::Display for Meridiem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Meridiem::Am => f.write_str("AM"),
            Meridiem::Pm => f.write_str("PM"),
        }
    }
}

impl FromStr for Meridiem {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AM" => Ok(Meridiem::Am),
            "PM" => Ok(Meridiem::Pm),
            other => Err(ValidationError::MalformedTime(other.to_string())),
        }
    }
}

/// Weekdays an alarm recurs on, Sunday first.
///
/// An all-false mask means "one-shot".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RepeatDays([bool; 7]);

const DAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

impl RepeatDays {
    pub const NONE: RepeatDays = RepeatDays([false; 7]);
    pub const EVERYDAY: RepeatDays = RepeatDays([true; 7]);
    pub const WEEKDAYS: RepeatDays = RepeatDays([false, true, true, true, true, true, false]);
    pub const WEEKEND: RepeatDays = RepeatDays([true, false, false, false, false, false, true]);

    pub fn from_flags(flags: [bool; 7]) -> Self {
        Self(flags)
    }

    pub fn flags(&self) -> [bool; 7] {
        self.0
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0[day.num_days_from_sunday() as usize]
    }

    pub fn with(mut self, day: Weekday) -> Self {
        self.0[day.num_days_from_sunday() as usize] = true;
        self
    }

    pub fn toggle(&mut self, day: Weekday) {
        let idx = day.num_days_from_sunday() as usize;
        self.0[idx] = !self.0[idx];
    }

    pub fn is_empty(&self) -> bool {
        !self.0.iter().any(|d| *d)
    }

    pub fn is_everyday(&self) -> bool {
        self.0.iter().all(|d| *d)
    }

    /// Compact storage form, e.g. `"0111110"` for weekdays.
    pub fn to_mask(&self) -> String {
        self.0.iter().map(|d| if *d { '1' } else { '0' }).collect()
    }

    pub fn from_mask(mask: &str) -> Option<Self> {
        let bytes = mask.as_bytes();
        if bytes.len() != 7 {
            return None;
        }
        let mut flags = [false; 7];
        for (slot, b) in flags.iter_mut().zip(bytes) {
            *slot = match b {
                b'1' => true,
                b'0' => false,
                _ => return None,
            };
        }
        Some(Self(flags))
    }

    /// Parse user input: a preset (`everyday`, `weekdays`, `weekend`, `once`)
    /// or a comma-separated list of day names (`mon,wed,fri`).
    pub fn parse_list(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim().to_ascii_lowercase();
        match trimmed.as_str() {
            "everyday" | "daily" => return Ok(Self::EVERYDAY),
            "weekdays" => return Ok(Self::WEEKDAYS),
            "weekend" => return Ok(Self::WEEKEND),
            "" | "once" | "none" => return Ok(Self::NONE),
            _ => {}
        }
        let mut days = Self::NONE;
        for part in trimmed.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let day = part
                .parse::<Weekday>()
                .map_err(|_| ValidationError::UnknownWeekday(part.to_string()))?;
            days = days.with(day);
        }
        Ok(days)
    }
}

impl fmt::Display for RepeatDays {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_everyday() {
            return f.write_str("Everyday");
        }
        if *self == Self::WEEKDAYS {
            return f.write_str("Weekdays");
        }
        if *self == Self::WEEKEND {
            return f.write_str("Weekend");
        }
        if self.is_empty() {
            return f.write_str("Once");
        }
        let initials: Vec<&str> = DAY_NAMES
            .iter()
            .zip(self.0.iter())
            .filter(|(_, on)| **on)
            .map(|(name, _)| &name[..1])
            .collect();
        f.write_str(&initials.join(" "))
    }
}

/// A user-configured alarm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawAlarmSpec")]
pub struct AlarmSpec {
    id: AlarmId,
    label: String,
    hour: u32,
    minute: u32,
    repeat_days: RepeatDays,
    enabled: bool,
    created_at: DateTime<Utc>,
}

/// Unvalidated wire form of [`AlarmSpec`].
#[derive(Deserialize)]
struct RawAlarmSpec {
    id: AlarmId,
    #[serde(default)]
    label: String,
    hour: u32,
    minute: u32,
    #[serde(default)]
    repeat_days: RepeatDays,
    enabled: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<RawAlarmSpec> for AlarmSpec {
    type Error = ValidationError;

    fn try_from(raw: RawAlarmSpec) -> Result<Self, Self::Error> {
        validate_time(raw.hour, raw.minute)?;
        Ok(Self {
            id: raw.id,
            label: raw.label,
            hour: raw.hour,
            minute: raw.minute,
            repeat_days: raw.repeat_days,
            enabled: raw.enabled,
            created_at: raw.created_at,
        })
    }
}

fn validate_time(hour: u32, minute: u32) -> Result<(), ValidationError> {
    if hour > 23 {
        return Err(ValidationError::HourOutOfRange(hour));
    }
    if minute > 59 {
        return Err(ValidationError::MinuteOutOfRange(minute));
    }
    Ok(())
}

impl AlarmSpec {
    /// Create an enabled one-shot alarm at `hour:minute` (24-hour clock).
    pub fn new(hour: u32, minute: u32) -> Result<Self, ValidationError> {
        validate_time(hour, minute)?;
        Ok(Self {
            id: AlarmId::new(),
            label: String::new(),
            hour,
            minute,
            repeat_days: RepeatDays::NONE,
            enabled: true,
            created_at: Utc::now(),
        })
    }

    /// Create an alarm from 12-hour input. `hour12` must be 1-12.
    pub fn from_12h(hour12: u32, minute: u32, meridiem: Meridiem) -> Result<Self, ValidationError> {
        Self::new(to_24h(hour12, meridiem)?, minute)
    }

    /// Rebuild an alarm from stored fields.
    pub fn restore(
        id: AlarmId,
        label: String,
        hour: u32,
        minute: u32,
        repeat_days: RepeatDays,
        enabled: bool,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        RawAlarmSpec {
            id,
            label,
            hour,
            minute,
            repeat_days,
            enabled,
            created_at,
        }
        .try_into()
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_repeat_days(mut self, days: RepeatDays) -> Self {
        self.repeat_days = days;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn id(&self) -> AlarmId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn minute(&self) -> u32 {
        self.minute
    }

    pub fn repeat_days(&self) -> RepeatDays {
        self.repeat_days
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_one_shot(&self) -> bool {
        self.repeat_days.is_empty()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn meridiem(&self) -> Meridiem {
        Meridiem::of_hour(self.hour)
    }

    /// Hour on a 12-hour dial (1-12).
    pub fn hour12(&self) -> u32 {
        match self.hour % 12 {
            0 => 12,
            h => h,
        }
    }

    // ── Mutations ────────────────────────────────────────────────────

    pub fn set_time(&mut self, hour: u32, minute: u32) -> Result<(), ValidationError> {
        validate_time(hour, minute)?;
        self.hour = hour;
        self.minute = minute;
        Ok(())
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    pub fn set_repeat_days(&mut self, days: RepeatDays) {
        self.repeat_days = days;
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Flip the enabled flag and return the new value.
    pub fn toggle(&mut self) -> bool {
        self.enabled = !self.enabled;
        self.enabled
    }
}

impl fmt::Display for AlarmSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:02} {}", self.hour12(), self.minute, self.meridiem())
    }
}

fn to_24h(hour12: u32, meridiem: Meridiem) -> Result<u32, ValidationError> {
    if !(1..=12).contains(&hour12) {
        return Err(ValidationError::HourOutOfRange(hour12));
    }
    let base = hour12 % 12;
    Ok(match meridiem {
        Meridiem::Am => base,
        Meridiem::Pm => base + 12,
    })
}

/// Parse `"H:MM"` into a 24-hour `(hour, minute)`.
///
/// With a meridiem the hour is read on a 12-hour dial, without one it is
/// read as a 24-hour value.
pub fn parse_clock_time(
    text: &str,
    meridiem: Option<Meridiem>,
) -> Result<(u32, u32), ValidationError> {
    let malformed = || ValidationError::MalformedTime(text.to_string());
    let (h, m) = text.trim().split_once(':').ok_or_else(malformed)?;
    if m.len() != 2 {
        return Err(malformed());
    }
    let hour: u32 = h.parse().map_err(|_| malformed())?;
    let minute: u32 = m.parse().map_err(|_| malformed())?;

    let hour = match meridiem {
        Some(mer) => to_24h(hour, mer)?,
        None => hour,
    };
    validate_time(hour, minute)?;
    Ok((hour, minute))
}
