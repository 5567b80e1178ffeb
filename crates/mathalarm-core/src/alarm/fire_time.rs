//! Next fire time computation.
//!
//! Pure functions of `(alarm, now)`: no clock is read here. Wall-clock
//! arithmetic happens in the time zone of `now`, so the same alarm yields
//! 08:30 local whether the caller passes `Local`, a `FixedOffset` or `Utc`.
//!
//! ## Rules
//!
//! - One-shot: today at `hour:minute` if that is still ahead of `now`,
//!   otherwise the same time tomorrow.
//! - Repeating: the first flagged weekday, starting today, whose slot is
//!   strictly after `now`. Today's weekday can come up twice (today already
//!   passed, same weekday next week), so at most 8 dates are examined.
//! - A local time that does not exist on a date (DST gap) skips that date.
//! - A local time that occurs twice (DST fall-back) fires at the first
//!   occurrence only.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::spec::{AlarmId, AlarmSpec, RepeatDays};
use crate::error::{CoreError, Result};

/// A computed fire instant for one alarm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledFire {
    pub alarm_id: AlarmId,
    pub fire_at: DateTime<Utc>,
}

/// Next instant strictly after `now` at which `spec` should fire.
///
/// # Errors
/// Returns [`CoreError::AlarmDisabled`] for disabled alarms.
pub fn compute_next_fire<Tz: TimeZone>(spec: &AlarmSpec, now: &DateTime<Tz>) -> Result<DateTime<Tz>> {
    if !spec.is_enabled() {
        return Err(CoreError::AlarmDisabled(spec.id()));
    }
    Ok(next_slot_after(
        spec.hour(),
        spec.minute(),
        spec.repeat_days(),
        now,
    ))
}

/// [`compute_next_fire`] packaged as a [`ScheduledFire`].
pub fn schedule_fire<Tz: TimeZone>(spec: &AlarmSpec, now: &DateTime<Tz>) -> Result<ScheduledFire> {
    let fire_at = compute_next_fire(spec, now)?;
    Ok(ScheduledFire {
        alarm_id: spec.id(),
        fire_at: fire_at.with_timezone(&Utc),
    })
}

/// Core rule shared by all alarms. `hour`/`minute` must already be valid.
fn next_slot_after<Tz: TimeZone>(
    hour: u32,
    minute: u32,
    days: RepeatDays,
    now: &DateTime<Tz>,
) -> DateTime<Tz> {
    let tz = now.timezone();
    let today = now.date_naive();
    let mut offset = 0;

    loop {
        let date = today + Duration::days(offset);
        offset += 1;

        if !days.is_empty() && !days.contains(date.weekday()) {
            continue;
        }
        if let Some(candidate) = local_slot(&tz, date, hour, minute) {
            if candidate > *now {
                return candidate;
            }
        }
    }
}

fn local_slot<Tz: TimeZone>(tz: &Tz, date: NaiveDate, hour: u32, minute: u32) -> Option<DateTime<Tz>> {
    let naive = date.and_hms_opt(hour, minute, 0)?;
    tz.from_local_datetime(&naive).earliest()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Weekday};
    use chrono_tz::America::New_York;

    // 2026-10-19 is a Monday.
    fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, day, hour, minute, 0).unwrap()
    }

    fn one_shot(hour: u32, minute: u32) -> AlarmSpec {
        AlarmSpec::new(hour, minute).unwrap()
    }

    #[test]
    fn one_shot_later_today() {
        let fire = compute_next_fire(&one_shot(8, 30), &at(19, 8, 0)).unwrap();
        assert_eq!(fire, at(19, 8, 30));
    }

    #[test]
    fn one_shot_rolls_to_tomorrow() {
        let fire = compute_next_fire(&one_shot(8, 30), &at(19, 9, 0)).unwrap();
        assert_eq!(fire, at(20, 8, 30));
    }

    #[test]
    fn exact_match_counts_as_passed() {
        let fire = compute_next_fire(&one_shot(8, 30), &at(19, 8, 30)).unwrap();
        assert_eq!(fire, at(20, 8, 30));
    }

    #[test]
    fn seconds_are_truncated() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 8, 29, 59).unwrap();
        let fire = compute_next_fire(&one_shot(8, 30), &now).unwrap();
        assert_eq!(fire, at(19, 8, 30));
    }

    #[test]
    fn repeating_skips_unflagged_days() {
        let alarm = one_shot(7, 0)
            .with_repeat_days(RepeatDays::NONE.with(Weekday::Wed).with(Weekday::Fri));
        let fire = compute_next_fire(&alarm, &at(19, 6, 0)).unwrap();
        assert_eq!(fire, at(21, 7, 0));
        assert_eq!(fire.weekday(), Weekday::Wed);
    }

    #[test]
    fn repeating_today_passed_wraps_a_week() {
        let alarm = one_shot(7, 0).with_repeat_days(RepeatDays::NONE.with(Weekday::Mon));
        let fire = compute_next_fire(&alarm, &at(19, 7, 1)).unwrap();
        assert_eq!(fire, at(26, 7, 0));
    }

    #[test]
    fn weekend_alarm_from_friday_evening() {
        let alarm = one_shot(9, 0).with_repeat_days(RepeatDays::WEEKEND);
        let fire = compute_next_fire(&alarm, &at(23, 22, 0)).unwrap();
        assert_eq!(fire, at(24, 9, 0));
        assert_eq!(fire.weekday(), Weekday::Sat);
    }

    #[test]
    fn disabled_alarm_has_no_fire_time() {
        let mut alarm = one_shot(7, 0);
        alarm.set_enabled(false);
        let err = compute_next_fire(&alarm, &at(19, 6, 0)).unwrap_err();
        assert!(matches!(err, CoreError::AlarmDisabled(id) if id == alarm.id()));
    }

    #[test]
    fn wall_clock_follows_the_reference_zone() {
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
        // 23:00 UTC on the 18th is 08:00 on the 19th in Tokyo.
        let now = at(18, 23, 0).with_timezone(&tokyo);
        let fire = compute_next_fire(&one_shot(8, 30), &now).unwrap();
        assert_eq!(fire.with_timezone(&Utc), at(18, 23, 30));
    }

    // New York springs forward on 2026-03-08 (02:00 -> 03:00) and falls
    // back on 2026-11-01 (02:00 -> 01:00).

    #[test]
    fn nonexistent_local_time_skips_the_day() {
        let now = New_York.with_ymd_and_hms(2026, 3, 8, 0, 0, 0).unwrap();
        let fire = compute_next_fire(&one_shot(2, 30), &now).unwrap();
        assert_eq!(fire, New_York.with_ymd_and_hms(2026, 3, 9, 2, 30, 0).unwrap());
        assert_eq!(fire.with_timezone(&Utc), Utc.with_ymd_and_hms(2026, 3, 9, 6, 30, 0).unwrap());
    }

    #[test]
    fn weekly_alarm_in_gap_moves_to_next_week() {
        let alarm = one_shot(2, 30).with_repeat_days(RepeatDays::NONE.with(Weekday::Sun));
        let now = New_York.with_ymd_and_hms(2026, 3, 8, 0, 0, 0).unwrap();
        let fire = compute_next_fire(&alarm, &now).unwrap();
        assert_eq!(fire, New_York.with_ymd_and_hms(2026, 3, 15, 2, 30, 0).unwrap());
    }

    #[test]
    fn ambiguous_local_time_uses_first_occurrence() {
        let now = New_York.with_ymd_and_hms(2026, 11, 1, 0, 0, 0).unwrap();
        let fire = compute_next_fire(&one_shot(1, 30), &now).unwrap();
        // 01:30 EDT, not 01:30 EST an hour later.
        assert_eq!(fire.with_timezone(&Utc), Utc.with_ymd_and_hms(2026, 11, 1, 5, 30, 0).unwrap());
    }

    #[test]
    fn ambiguous_local_time_fires_once() {
        // 01:45 EDT: the first 01:30 has passed, the repeated hour does not
        // ring again.
        let now = Utc
            .with_ymd_and_hms(2026, 11, 1, 5, 45, 0)
            .unwrap()
            .with_timezone(&New_York);
        let fire = compute_next_fire(&one_shot(1, 30), &now).unwrap();
        assert_eq!(fire.with_timezone(&Utc), Utc.with_ymd_and_hms(2026, 11, 2, 6, 30, 0).unwrap());
    }

    #[test]
    fn schedule_fire_carries_alarm_id() {
        let alarm = one_shot(8, 30);
        let scheduled = schedule_fire(&alarm, &at(19, 9, 0)).unwrap();
        assert_eq!(scheduled.alarm_id, alarm.id());
        assert_eq!(scheduled.fire_at, at(20, 8, 30));
    }
}
