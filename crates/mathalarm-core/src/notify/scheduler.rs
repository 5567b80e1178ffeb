//! Notification scheduling.
//!
//! A [`NotificationScheduler`] accepts an absolute fire time and delivers the
//! notification at or after it, never before. [`MemoryScheduler`] keeps the
//! pending set in memory and hands out due notifications when asked; it is
//! serializable so a front-end can persist it between runs.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::config::NotificationHandlerConfig;
use crate::alarm::{AlarmId, AlarmSpec};
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(Uuid);

impl NotificationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NotificationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationContent {
    pub title: String,
    pub body: String,
    /// Sound name; `None` posts silently.
    pub sound: Option<String>,
    /// Tapping this notification should open the dismiss challenge.
    pub open_challenge: bool,
}

impl NotificationContent {
    pub fn for_alarm(alarm: &AlarmSpec) -> Self {
        let title = if alarm.label().is_empty() {
            "WAKE UP!".to_string()
        } else {
            format!("WAKE UP! {}", alarm.label())
        };
        Self {
            title,
            body: "Solve the math to stop the alarm".to_string(),
            sound: Some("default".to_string()),
            open_challenge: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub alarm_id: AlarmId,
    pub fire_at: DateTime<Utc>,
    pub content: NotificationContent,
}

impl Notification {
    pub fn for_alarm(alarm: &AlarmSpec, fire_at: DateTime<Utc>) -> Self {
        Self {
            id: NotificationId::new(),
            alarm_id: alarm.id(),
            fire_at,
            content: NotificationContent::for_alarm(alarm),
        }
    }
}

/// External notification service.
pub trait NotificationScheduler {
    /// Register a notification for delivery at or after `fire_at`.
    fn schedule(&mut self, notification: Notification) -> Result<NotificationId>;

    /// Withdraw a pending notification. Returns whether it was pending.
    fn cancel(&mut self, id: NotificationId) -> Result<bool>;

    /// Withdraw every pending notification of one alarm.
    fn cancel_alarm(&mut self, alarm_id: AlarmId) -> Result<usize>;

    /// Pending notifications, soonest first.
    fn pending(&self) -> Vec<Notification>;
}

/// In-memory scheduler polled by the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryScheduler {
    #[serde(default)]
    config: NotificationHandlerConfig,
    #[serde(default)]
    pending: Vec<Notification>,
}

impl MemoryScheduler {
    pub fn new(config: NotificationHandlerConfig) -> Self {
        Self {
            config,
            pending: Vec::new(),
        }
    }

    pub fn config(&self) -> &NotificationHandlerConfig {
        &self.config
    }

    /// Replace the handler config, e.g. after the user edits settings.
    pub fn set_config(&mut self, config: NotificationHandlerConfig) {
        self.config = config;
    }

    /// Remove and return every notification due at `now`, in fire order.
    pub fn take_due(&mut self, now: DateTime<Utc>) -> Vec<Notification> {
        let (due, rest): (Vec<_>, Vec<_>) = self
            .pending
            .drain(..)
            .partition(|n| n.fire_at <= now);
        self.pending = rest;
        due
    }

    /// Soonest pending notification.
    pub fn next(&self) -> Option<&Notification> {
        self.pending.first()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl NotificationScheduler for MemoryScheduler {
    fn schedule(&mut self, mut notification: Notification) -> Result<NotificationId> {
        if !self.config.play_sound {
            notification.content.sound = None;
        }
        let id = notification.id;
        let pos = self
            .pending
            .partition_point(|n| n.fire_at <= notification.fire_at);
        self.pending.insert(pos, notification);
        Ok(id)
    }

    fn cancel(&mut self, id: NotificationId) -> Result<bool> {
        let before = self.pending.len();
        self.pending.retain(|n| n.id != id);
        Ok(self.pending.len() != before)
    }

    fn cancel_alarm(&mut self, alarm_id: AlarmId) -> Result<usize> {
        let before = self.pending.len();
        self.pending.retain(|n| n.alarm_id != alarm_id);
        Ok(before - self.pending.len())
    }

    fn pending(&self) -> Vec<Notification> {
        self.pending.clone()
    }
}
