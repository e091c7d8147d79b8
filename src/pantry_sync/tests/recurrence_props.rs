use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use proptest::prelude::*;

use pantry_sync::recurrence::{MonthlyRule, Recurrence, WeekOfMonth, next_occurrence};

fn arb_week_of_month() -> impl Strategy<Value = WeekOfMonth> {
    prop_oneof![
        Just(WeekOfMonth::First),
        Just(WeekOfMonth::Second),
        Just(WeekOfMonth::Third),
        Just(WeekOfMonth::Fourth),
        Just(WeekOfMonth::Last),
    ]
}

fn arb_rule() -> impl Strategy<Value = Recurrence> {
    prop_oneof![
        (1u32..60).prop_map(|interval| Recurrence::Daily { interval }),
        (1u32..9, proptest::collection::btree_set(0u8..7, 1..=7)).prop_map(
            |(interval, days_of_week)| Recurrence::Weekly {
                interval,
                days_of_week,
            }
        ),
        (1u32..13, 1u32..32).prop_map(|(interval, day_of_month)| Recurrence::Monthly {
            interval,
            rule: MonthlyRule::DayOfMonth { day_of_month },
        }),
        (1u32..13, 0u8..7, arb_week_of_month()).prop_map(
            |(interval, day_of_week, week_of_month)| Recurrence::Monthly {
                interval,
                rule: MonthlyRule::DayOfWeek {
                    week_of_month,
                    day_of_week,
                },
            }
        ),
    ]
}

// 2000-01-01T00:00:00Z ..= 2099-12-31T23:59:59Z
fn arb_instant() -> impl Strategy<Value = DateTime<Utc>> {
    (946_684_800i64..4_102_444_800).prop_map(|secs| Utc.timestamp_opt(secs, 0).unwrap())
}

proptest! {
    #[test]
    fn next_occurrence_is_strictly_after(rule in arb_rule(), from in arb_instant()) {
        let next = next_occurrence(&rule, from).unwrap();
        prop_assert!(next > from);
    }

    #[test]
    fn chained_occurrences_are_monotone(rule in arb_rule(), from in arb_instant()) {
        let mut cursor = from;
        for _ in 0..4 {
            let next = next_occurrence(&rule, cursor).unwrap();
            prop_assert!(next > cursor);
            cursor = next;
        }
    }

    #[test]
    fn daily_adds_exactly_interval_days(interval in 1u32..60, from in arb_instant()) {
        let rule = Recurrence::Daily { interval };
        let next = next_occurrence(&rule, from).unwrap();
        prop_assert_eq!(next, from + Duration::days(i64::from(interval)));
    }

    #[test]
    fn weekly_lands_on_an_allowed_weekday(
        interval in 1u32..9,
        days in proptest::collection::btree_set(0u8..7, 1..=7),
        from in arb_instant(),
    ) {
        let rule = Recurrence::Weekly { interval, days_of_week: days.clone() };
        let next = next_occurrence(&rule, from).unwrap();
        let weekday = next.weekday().num_days_from_sunday() as u8;
        prop_assert!(days.contains(&weekday));
        prop_assert_eq!(next.time(), from.time());
    }

    #[test]
    fn monthly_day_never_overflows_into_next_month(
        interval in 1u32..13,
        day_of_month in 1u32..32,
        from in arb_instant(),
    ) {
        let rule = Recurrence::Monthly {
            interval,
            rule: MonthlyRule::DayOfMonth { day_of_month },
        };
        let next = next_occurrence(&rule, from).unwrap();
        // Either the exact requested day, or the clamped month end.
        prop_assert!(next.day() <= day_of_month);
        if next.day() < day_of_month {
            let last = last_day_of(next.year(), next.month());
            prop_assert_eq!(next.day(), last);
        }
        prop_assert_eq!(next.time(), from.time());
    }

    #[test]
    fn rejected_rules_never_panic(bad_day in 32u32..60, from in arb_instant()) {
        let zero = Recurrence::Daily { interval: 0 };
        prop_assert!(next_occurrence(&zero, from).is_err());

        let overflow = Recurrence::Monthly {
            interval: 1,
            rule: MonthlyRule::DayOfMonth { day_of_month: bad_day },
        };
        prop_assert!(next_occurrence(&overflow, from).is_err());
    }
}

fn last_day_of(year: i32, month: u32) -> u32 {
    let (ny, nm) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    chrono::NaiveDate::from_ymd_opt(ny, nm, 1)
        .unwrap()
        .pred_opt()
        .unwrap()
        .day()
}
