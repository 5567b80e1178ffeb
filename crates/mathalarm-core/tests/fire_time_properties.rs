//! Property tests for next-fire computation and challenge judging.

use chrono::{DateTime, Datelike, Duration, FixedOffset, TimeZone, Timelike, Utc, Weekday};
use mathalarm_core::challenge::{Challenge, ChallengeState, Operator};
use mathalarm_core::{compute_next_fire, AlarmSpec, RepeatDays};
use proptest::prelude::*;

const WEEK: [Weekday; 7] = [
    Weekday::Sun,
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];

fn instant() -> impl Strategy<Value = DateTime<Utc>> {
    // Any second of 2026.
    let base = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap().timestamp();
    (0_i64..365 * 86_400).prop_map(move |s| Utc.timestamp_opt(base + s, 0).unwrap())
}

fn mask() -> impl Strategy<Value = RepeatDays> {
    any::<[bool; 7]>().prop_map(RepeatDays::from_flags)
}

fn operator() -> impl Strategy<Value = Operator> {
    prop_oneof![
        Just(Operator::Add),
        Just(Operator::Subtract),
        Just(Operator::Multiply),
    ]
}

proptest! {
    #[test]
    fn fire_is_strictly_after_now_and_on_the_clock(
        hour in 0_u32..24,
        minute in 0_u32..60,
        days in mask(),
        now in instant(),
    ) {
        let alarm = AlarmSpec::new(hour, minute).unwrap().with_repeat_days(days);
        let fire = compute_next_fire(&alarm, &now).unwrap();
        prop_assert!(fire > now);
        prop_assert_eq!(fire.hour(), hour);
        prop_assert_eq!(fire.minute(), minute);
        prop_assert_eq!(fire.second(), 0);
    }

    #[test]
    fn one_shot_fires_within_a_day(
        hour in 0_u32..24,
        minute in 0_u32..60,
        now in instant(),
    ) {
        let alarm = AlarmSpec::new(hour, minute).unwrap();
        let fire = compute_next_fire(&alarm, &now).unwrap();
        prop_assert!(fire - now <= Duration::days(1));
        // Today if still ahead, tomorrow otherwise.
        let today_slot = now.date_naive().and_hms_opt(hour, minute, 0).unwrap().and_utc();
        if today_slot > now {
            prop_assert_eq!(fire, today_slot);
        } else {
            prop_assert_eq!(fire, today_slot + Duration::days(1));
        }
    }

    #[test]
    fn everyday_matches_one_shot(
        hour in 0_u32..24,
        minute in 0_u32..60,
        now in instant(),
    ) {
        let once = AlarmSpec::new(hour, minute).unwrap();
        let daily = once.clone().with_repeat_days(RepeatDays::EVERYDAY);
        prop_assert_eq!(
            compute_next_fire(&once, &now).unwrap(),
            compute_next_fire(&daily, &now).unwrap()
        );
    }

    #[test]
    fn repeating_fire_lands_on_flagged_day_within_a_week(
        hour in 0_u32..24,
        minute in 0_u32..60,
        days in mask().prop_filter("repeating", |d| !d.is_empty()),
        now in instant(),
    ) {
        let alarm = AlarmSpec::new(hour, minute).unwrap().with_repeat_days(days);
        let fire = compute_next_fire(&alarm, &now).unwrap();
        prop_assert!(days.contains(fire.weekday()));
        prop_assert!(fire - now <= Duration::days(7));

        // No flagged slot was skipped between now and fire.
        let mut day = now.date_naive();
        while day < fire.date_naive() {
            let slot = day.and_hms_opt(hour, minute, 0).unwrap().and_utc();
            prop_assert!(!(slot > now && days.contains(day.weekday())));
            day = day.succ_opt().unwrap();
        }
    }

    #[test]
    fn recomputing_just_before_fire_is_stable(
        hour in 0_u32..24,
        minute in 0_u32..60,
        days in mask(),
        now in instant(),
    ) {
        let alarm = AlarmSpec::new(hour, minute).unwrap().with_repeat_days(days);
        let fire = compute_next_fire(&alarm, &now).unwrap();
        prop_assert_eq!(compute_next_fire(&alarm, &(fire - Duration::seconds(1))).unwrap(), fire);
    }

    #[test]
    fn offset_zone_keeps_local_wall_time(
        hour in 0_u32..24,
        minute in 0_u32..60,
        offset_hours in -12_i32..=14,
        now in instant(),
    ) {
        let tz = FixedOffset::east_opt(offset_hours * 3600).unwrap();
        let local_now = now.with_timezone(&tz);
        let alarm = AlarmSpec::new(hour, minute).unwrap();
        let fire = compute_next_fire(&alarm, &local_now).unwrap();
        prop_assert_eq!(fire.hour(), hour);
        prop_assert_eq!(fire.minute(), minute);
        prop_assert!(fire > local_now);
    }

    #[test]
    fn expected_answer_solves(a in -50_i32..=50, b in -50_i32..=50, op in operator()) {
        let mut challenge = Challenge::new(a, b, op);
        let answer = format!(" {} ", challenge.expected());
        prop_assert!(challenge.check(&answer));
        prop_assert_eq!(challenge.state(), ChallengeState::Solved);
    }

    #[test]
    fn any_other_answer_keeps_challenge_active(
        a in -50_i32..=50,
        b in -50_i32..=50,
        op in operator(),
        guess in -3000_i64..=3000,
    ) {
        let mut challenge = Challenge::new(a, b, op);
        prop_assume!(guess != challenge.expected());
        prop_assert!(!challenge.check(&guess.to_string()));
        prop_assert_eq!(challenge.state(), ChallengeState::Active);
    }

    #[test]
    fn non_numeric_answer_never_solves(raw in "[^0-9]*", op in operator()) {
        let mut challenge = Challenge::new(0, 0, op);
        prop_assert!(!challenge.check(&raw));
    }
}

#[test]
fn mask_days_are_sunday_first() {
    for (i, day) in WEEK.iter().enumerate() {
        let mut flags = [false; 7];
        flags[i] = true;
        assert!(RepeatDays::from_flags(flags).contains(*day));
    }
}
