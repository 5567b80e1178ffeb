//! The user's alarm list.
//!
//! Every mutation that changes when an alarm should ring also updates the
//! notification scheduler: enabled alarms have exactly one pending
//! notification, disabled or removed alarms have none.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::fire_time::{compute_next_fire, schedule_fire, ScheduledFire};
use super::spec::{AlarmId, AlarmSpec, RepeatDays};
use crate::error::{CoreError, Result};
use crate::events::Event;
use crate::notify::{Notification, NotificationScheduler};

/// Partial edit of an alarm. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlarmEdit {
    pub time: Option<(u32, u32)>,
    pub repeat_days: Option<RepeatDays>,
    pub label: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlarmBook {
    alarms: Vec<AlarmSpec>,
}

impl AlarmBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_alarms(alarms: Vec<AlarmSpec>) -> Self {
        Self { alarms }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn list(&self) -> &[AlarmSpec] {
        &self.alarms
    }

    pub fn get(&self, id: AlarmId) -> Result<&AlarmSpec> {
        self.alarms
            .iter()
            .find(|a| a.id() == id)
            .ok_or(CoreError::AlarmNotFound(id))
    }

    pub fn len(&self) -> usize {
        self.alarms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alarms.is_empty()
    }

    /// Soonest fire across all enabled alarms.
    pub fn next_due<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Option<ScheduledFire> {
        self.alarms
            .iter()
            .filter(|a| a.is_enabled())
            .filter_map(|a| schedule_fire(a, now).ok())
            .min_by_key(|s| s.fire_at)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Add an alarm and, if enabled, schedule its first fire.
    pub fn add<Tz: TimeZone>(
        &mut self,
        alarm: AlarmSpec,
        now: &DateTime<Tz>,
        scheduler: &mut impl NotificationScheduler,
    ) -> Result<Option<Event>> {
        let id = alarm.id();
        let enabled = alarm.is_enabled();
        self.alarms.push(alarm);
        tracing::info!(alarm_id = %id, "alarm added");
        if enabled {
            return self.arm(id, now, scheduler).map(Some);
        }
        Ok(None)
    }

    /// Compute the next fire and replace any pending notification for it.
    pub fn arm<Tz: TimeZone>(
        &mut self,
        id: AlarmId,
        now: &DateTime<Tz>,
        scheduler: &mut impl NotificationScheduler,
    ) -> Result<Event> {
        let alarm = self.get(id)?;
        let fire_at = compute_next_fire(alarm, now)?.with_timezone(&Utc);
        let notification = Notification::for_alarm(alarm, fire_at);
        scheduler.cancel_alarm(id)?;
        scheduler.schedule(notification)?;
        tracing::info!(alarm_id = %id, %fire_at, "alarm scheduled");
        Ok(Event::AlarmScheduled {
            alarm_id: id,
            fire_at,
            at: Utc::now(),
        })
    }

    /// Withdraw the pending notification, if any.
    pub fn disarm(
        &mut self,
        id: AlarmId,
        scheduler: &mut impl NotificationScheduler,
    ) -> Result<Option<Event>> {
        self.get(id)?;
        if scheduler.cancel_alarm(id)? == 0 {
            return Ok(None);
        }
        tracing::info!(alarm_id = %id, "alarm unscheduled");
        Ok(Some(Event::AlarmCancelled {
            alarm_id: id,
            at: Utc::now(),
        }))
    }

    /// Flip the enabled flag and arm or disarm accordingly.
    pub fn toggle<Tz: TimeZone>(
        &mut self,
        id: AlarmId,
        now: &DateTime<Tz>,
        scheduler: &mut impl NotificationScheduler,
    ) -> Result<Option<Event>> {
        let enabled = self.get_mut(id)?.toggle();
        if enabled {
            self.arm(id, now, scheduler).map(Some)
        } else {
            self.disarm(id, scheduler)
        }
    }

    /// Apply an edit. Validation happens before anything changes; an enabled
    /// alarm is rescheduled afterwards.
    pub fn edit<Tz: TimeZone>(
        &mut self,
        id: AlarmId,
        edit: AlarmEdit,
        now: &DateTime<Tz>,
        scheduler: &mut impl NotificationScheduler,
    ) -> Result<Option<Event>> {
        let alarm = self.get_mut(id)?;
        let mut updated = alarm.clone();
        if let Some((hour, minute)) = edit.time {
            updated.set_time(hour, minute)?;
        }
        if let Some(days) = edit.repeat_days {
            updated.set_repeat_days(days);
        }
        if let Some(label) = edit.label {
            updated.set_label(label);
        }
        *alarm = updated;

        if alarm.is_enabled() {
            self.arm(id, now, scheduler).map(Some)
        } else {
            Ok(None)
        }
    }

    pub fn remove(
        &mut self,
        id: AlarmId,
        scheduler: &mut impl NotificationScheduler,
    ) -> Result<AlarmSpec> {
        let pos = self
            .alarms
            .iter()
            .position(|a| a.id() == id)
            .ok_or(CoreError::AlarmNotFound(id))?;
        scheduler.cancel_alarm(id)?;
        tracing::info!(alarm_id = %id, "alarm removed");
        Ok(self.alarms.remove(pos))
    }

    /// Consume a delivered notification. Repeating alarms are scheduled for
    /// their next slot; one-shot alarms are disabled until re-armed.
    pub fn on_fired<Tz: TimeZone>(
        &mut self,
        notification: &Notification,
        now: &DateTime<Tz>,
        scheduler: &mut impl NotificationScheduler,
    ) -> Result<Event> {
        let id = notification.alarm_id;
        let alarm = self.get_mut(id)?;
        if !alarm.is_enabled() {
            return Err(CoreError::AlarmDisabled(id));
        }
        scheduler.cancel(notification.id)?;

        let next_fire_at = if alarm.is_one_shot() {
            alarm.set_enabled(false);
            None
        } else {
            // Never reschedule into the slot that just fired.
            let after = if now.with_timezone(&Utc) < notification.fire_at {
                notification.fire_at.with_timezone(&now.timezone())
            } else {
                now.clone()
            };
            match self.arm(id, &after, scheduler)? {
                Event::AlarmScheduled { fire_at, .. } => Some(fire_at),
                _ => None,
            }
        };
        tracing::info!(alarm_id = %id, ?next_fire_at, "alarm fired");
        Ok(Event::AlarmFired {
            alarm_id: id,
            next_fire_at,
            at: Utc::now(),
        })
    }

    fn get_mut(&mut self, id: AlarmId) -> Result<&mut AlarmSpec> {
        self.alarms
            .iter_mut()
            .find(|a| a.id() == id)
            .ok_or(CoreError::AlarmNotFound(id))
    }
}
