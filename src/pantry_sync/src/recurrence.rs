//! Repurchase recurrence rules and next-occurrence math.
//!
//! A [`Recurrence`] describes how often a product should be bought again:
//! every N days, on a weekday set every N weeks, or monthly on a fixed day or
//! an Nth/last weekday. [`next_occurrence`] is the engine: pure, UTC-only,
//! and guaranteed to return an instant strictly after its `from` argument.
//!
//! Week handling is Sunday-based (weekday index 0 = Sunday) to match the
//! stored rule format. For weekly rules, `interval` counts whole Sunday-to-
//! Saturday weeks between cycles: once the current week's candidate days are
//! exhausted, the next eligible week is `interval` weeks later. The forward
//! scan is capped at `7 * interval + 7` days, which is provably enough for
//! any rule that passes validation.
//!
//! Malformed rules (zero interval, empty weekday set, out-of-range fields)
//! are rejected with a [`RecurrenceError`] rather than guessed at.

use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A malformed recurrence rule, rejected synchronously.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecurrenceError {
    /// `interval` must be at least 1.
    #[error("recurrence interval must be at least 1")]
    ZeroInterval,
    /// Weekly rules need at least one weekday to land on.
    #[error("weekly recurrence needs a non-empty weekday set")]
    EmptyWeekdaySet,
    /// Weekday indices run 0 (Sunday) through 6 (Saturday).
    #[error("weekday index out of range 0..=6: {0}")]
    WeekdayOutOfRange(u8),
    /// Calendar days run 1 through 31.
    #[error("day of month out of range 1..=31: {0}")]
    DayOfMonthOutOfRange(u32),
    /// Week-of-month codes are 1..=4 or -1 for "last".
    #[error("week of month must be 1..=4 or -1: {0}")]
    WeekOfMonthOutOfRange(i8),
    /// A monthly rule must carry either `day_of_month` or the
    /// `week_of_month` + `day_of_week` pair, not neither and not both.
    #[error("monthly recurrence needs day_of_month or week_of_month + day_of_week")]
    AmbiguousMonthlyRule,
    /// The bounded forward scan found no candidate. Unreachable for rules
    /// that pass validation; kept so the scan can never loop forever.
    #[error("forward scan exhausted without finding an occurrence")]
    ScanExhausted,
}

/// Which week of the month a monthly day-of-week rule targets.
///
/// Serialized as its integer code: 1..=4, or -1 for "last".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i8", into = "i8")]
pub enum WeekOfMonth {
    /// First occurrence of the weekday.
    First,
    /// Second occurrence.
    Second,
    /// Third occurrence.
    Third,
    /// Fourth occurrence.
    Fourth,
    /// Last occurrence, whether that is the fourth or the fifth.
    Last,
}

impl From<WeekOfMonth> for i8 {
    fn from(w: WeekOfMonth) -> i8 {
        match w {
            WeekOfMonth::First => 1,
            WeekOfMonth::Second => 2,
            WeekOfMonth::Third => 3,
            WeekOfMonth::Fourth => 4,
            WeekOfMonth::Last => -1,
        }
    }
}

impl TryFrom<i8> for WeekOfMonth {
    type Error = RecurrenceError;

    fn try_from(code: i8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(WeekOfMonth::First),
            2 => Ok(WeekOfMonth::Second),
            3 => Ok(WeekOfMonth::Third),
            4 => Ok(WeekOfMonth::Fourth),
            -1 => Ok(WeekOfMonth::Last),
            other => Err(RecurrenceError::WeekOfMonthOutOfRange(other)),
        }
    }
}

/// How a monthly rule picks its day within the target month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonthlyRule {
    /// A fixed calendar day, clamped to the month's last day when the month
    /// is shorter (day 31 in April resolves to April 30, never May).
    DayOfMonth {
        /// Target day, 1..=31.
        day_of_month: u32,
    },
    /// An Nth or last weekday, e.g. "second Tuesday".
    DayOfWeek {
        /// Which occurrence of the weekday.
        week_of_month: WeekOfMonth,
        /// Weekday index, 0 (Sunday) through 6 (Saturday).
        day_of_week: u8,
    },
}

/// A recurrence rule: how often a product should be repurchased.
///
/// Serialized flat, tagged by `type`, matching the stored rule format:
/// `{"type": "monthly", "interval": 1, "day_of_month": 31}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RecurrenceWire", into = "RecurrenceWire")]
pub enum Recurrence {
    /// Every `interval` days.
    Daily {
        /// Days between occurrences, >= 1.
        interval: u32,
    },
    /// On each weekday in `days_of_week`, every `interval` weeks.
    Weekly {
        /// Whole weeks between cycles, >= 1.
        interval: u32,
        /// Weekday indices, 0 (Sunday) through 6 (Saturday). Must be
        /// non-empty.
        days_of_week: BTreeSet<u8>,
    },
    /// Once per `interval` months, on the day picked by `rule`.
    Monthly {
        /// Months between occurrences, >= 1.
        interval: u32,
        /// Day selection within the target month.
        #[serde(flatten)]
        rule: MonthlyRule,
    },
}

impl Recurrence {
    /// Checks rule fields without computing anything.
    pub fn validate(&self) -> Result<(), RecurrenceError> {
        match self {
            Recurrence::Daily { interval } => check_interval(*interval),
            Recurrence::Weekly {
                interval,
                days_of_week,
            } => {
                check_interval(*interval)?;
                if days_of_week.is_empty() {
                    return Err(RecurrenceError::EmptyWeekdaySet);
                }
                for &d in days_of_week {
                    check_weekday(d)?;
                }
                Ok(())
            }
            Recurrence::Monthly { interval, rule } => {
                check_interval(*interval)?;
                match rule {
                    MonthlyRule::DayOfMonth { day_of_month } => {
                        if !(1..=31).contains(day_of_month) {
                            return Err(RecurrenceError::DayOfMonthOutOfRange(*day_of_month));
                        }
                        Ok(())
                    }
                    MonthlyRule::DayOfWeek { day_of_week, .. } => check_weekday(*day_of_week),
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum RuleKind {
    Daily,
    Weekly,
    Monthly,
}

/// Flat serialization shape for [`Recurrence`]. Field presence is what
/// distinguishes the two monthly sub-rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RecurrenceWire {
    #[serde(rename = "type")]
    kind: RuleKind,
    interval: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    days_of_week: Option<BTreeSet<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    day_of_month: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    week_of_month: Option<WeekOfMonth>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    day_of_week: Option<u8>,
}

impl From<Recurrence> for RecurrenceWire {
    fn from(r: Recurrence) -> RecurrenceWire {
        let mut wire = RecurrenceWire {
            kind: RuleKind::Daily,
            interval: 1,
            days_of_week: None,
            day_of_month: None,
            week_of_month: None,
            day_of_week: None,
        };
        match r {
            Recurrence::Daily { interval } => {
                wire.kind = RuleKind::Daily;
                wire.interval = interval;
            }
            Recurrence::Weekly {
                interval,
                days_of_week,
            } => {
                wire.kind = RuleKind::Weekly;
                wire.interval = interval;
                wire.days_of_week = Some(days_of_week);
            }
            Recurrence::Monthly { interval, rule } => {
                wire.kind = RuleKind::Monthly;
                wire.interval = interval;
                match rule {
                    MonthlyRule::DayOfMonth { day_of_month } => {
                        wire.day_of_month = Some(day_of_month);
                    }
                    MonthlyRule::DayOfWeek {
                        week_of_month,
                        day_of_week,
                    } => {
                        wire.week_of_month = Some(week_of_month);
                        wire.day_of_week = Some(day_of_week);
                    }
                }
            }
        }
        wire
    }
}

impl TryFrom<RecurrenceWire> for Recurrence {
    type Error = RecurrenceError;

    fn try_from(w: RecurrenceWire) -> Result<Self, Self::Error> {
        let rule = match w.kind {
            RuleKind::Daily => Recurrence::Daily {
                interval: w.interval,
            },
            RuleKind::Weekly => Recurrence::Weekly {
                interval: w.interval,
                days_of_week: w.days_of_week.unwrap_or_default(),
            },
            RuleKind::Monthly => {
                let rule = match (w.day_of_month, w.week_of_month, w.day_of_week) {
                    (Some(day_of_month), None, None) => MonthlyRule::DayOfMonth { day_of_month },
                    (None, Some(week_of_month), Some(day_of_week)) => MonthlyRule::DayOfWeek {
                        week_of_month,
                        day_of_week,
                    },
                    _ => return Err(RecurrenceError::AmbiguousMonthlyRule),
                };
                Recurrence::Monthly {
                    interval: w.interval,
                    rule,
                }
            }
        };
        rule.validate()?;
        Ok(rule)
    }
}

/// A rule plus its computed "next due" pointer, as persisted on a product.
///
/// `next_due` stays authoritative until the rule changes or the schedule is
/// [advanced](RecurrenceSchedule::advance); `computed_at` records when it was
/// last derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurrenceSchedule {
    /// The recurrence rule.
    #[serde(flatten)]
    pub rule: Recurrence,
    /// When `next_due` was computed (UTC).
    pub computed_at: DateTime<Utc>,
    /// The next occurrence, strictly after `computed_at`.
    pub next_due: DateTime<Utc>,
}

impl RecurrenceSchedule {
    /// Builds a schedule by computing the first occurrence after `from`.
    ///
    /// Call this whenever a rule is created or any of its fields change.
    pub fn plan(rule: Recurrence, from: DateTime<Utc>) -> Result<Self, RecurrenceError> {
        let next_due = next_occurrence(&rule, from)?;
        Ok(RecurrenceSchedule {
            rule,
            computed_at: from,
            next_due,
        })
    }

    /// True once `now` has reached the due pointer.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        now >= self.next_due
    }

    /// Rolls the schedule forward after the purchase was made.
    ///
    /// Recomputes from `max(next_due, now)` so completing a reminder late
    /// never yields a next-due already in the past.
    pub fn advance(&self, now: DateTime<Utc>) -> Result<Self, RecurrenceError> {
        let from = if self.next_due > now { self.next_due } else { now };
        RecurrenceSchedule::plan(self.rule.clone(), from)
    }
}

/// Computes the first occurrence of `rule` strictly after `from`.
///
/// Pure and deterministic; all math is in UTC and the time of day of `from`
/// is preserved on the result.
pub fn next_occurrence(
    rule: &Recurrence,
    from: DateTime<Utc>,
) -> Result<DateTime<Utc>, RecurrenceError> {
    rule.validate()?;
    match rule {
        Recurrence::Daily { interval } => Ok(from + Duration::days(i64::from(*interval))),
        Recurrence::Weekly {
            interval,
            days_of_week,
        } => next_weekly(from, *interval, days_of_week),
        Recurrence::Monthly { interval, rule } => match rule {
            MonthlyRule::DayOfMonth { day_of_month } => {
                Ok(next_monthly_by_day(from, *interval, *day_of_month))
            }
            MonthlyRule::DayOfWeek {
                week_of_month,
                day_of_week,
            } => Ok(next_monthly_by_weekday(
                from,
                *interval,
                *week_of_month,
                *day_of_week,
            )),
        },
    }
}

fn check_interval(interval: u32) -> Result<(), RecurrenceError> {
    if interval < 1 {
        return Err(RecurrenceError::ZeroInterval);
    }
    Ok(())
}

fn check_weekday(d: u8) -> Result<(), RecurrenceError> {
    if d > 6 {
        return Err(RecurrenceError::WeekdayOutOfRange(d));
    }
    Ok(())
}

// A known Sunday, anchoring Sunday-aligned week indexing.
const WEEK_ANCHOR: (i32, u32, u32) = (1970, 1, 4);

fn sunday_week_index(d: NaiveDate) -> i64 {
    let (y, m, day) = WEEK_ANCHOR;
    let anchor = NaiveDate::from_ymd_opt(y, m, day).expect("week anchor date");
    (d - anchor).num_days().div_euclid(7)
}

fn next_weekly(
    from: DateTime<Utc>,
    interval: u32,
    days_of_week: &BTreeSet<u8>,
) -> Result<DateTime<Utc>, RecurrenceError> {
    let base_week = sunday_week_index(from.date_naive());
    let mut candidate = from + Duration::days(1);
    // Cap covers the rest of the current week plus one full eligible cycle.
    let cap = 7 * i64::from(interval) + 7;
    for _ in 0..cap {
        let weekday = candidate.weekday().num_days_from_sunday() as u8;
        let week_delta = sunday_week_index(candidate.date_naive()) - base_week;
        if days_of_week.contains(&weekday) && week_delta % i64::from(interval) == 0 {
            return Ok(candidate);
        }
        candidate += Duration::days(1);
    }
    Err(RecurrenceError::ScanExhausted)
}

// Linear month index relative to 1970-01 (index 0), per-unit calendar math.
fn month_index(year: i32, month: u32) -> i64 {
    (i64::from(year) - 1970) * 12 + (i64::from(month) - 1)
}

fn month_from_index(idx: i64) -> (i32, u32) {
    let year = 1970 + idx.div_euclid(12);
    let month = idx.rem_euclid(12) + 1;
    (year as i32, month as u32)
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (ny, nm) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(ny, nm, 1)
        .expect("first day of next month")
        .pred_opt()
        .expect("last day of month")
        .day()
}

fn next_monthly_by_day(from: DateTime<Utc>, interval: u32, day_of_month: u32) -> DateTime<Utc> {
    let mut idx = month_index(from.year(), from.month()) + i64::from(interval);
    loop {
        let (y, m) = month_from_index(idx);
        // Clamp: day 31 in a 30-day month degrades to day 30, never rolls
        // into the next month.
        let day = day_of_month.min(days_in_month(y, m));
        let candidate = NaiveDate::from_ymd_opt(y, m, day)
            .expect("clamped day is valid")
            .and_time(from.time())
            .and_utc();
        if candidate > from {
            return candidate;
        }
        idx += i64::from(interval);
    }
}

fn next_monthly_by_weekday(
    from: DateTime<Utc>,
    interval: u32,
    week: WeekOfMonth,
    day_of_week: u8,
) -> DateTime<Utc> {
    let mut idx = month_index(from.year(), from.month()) + i64::from(interval);
    loop {
        let (y, m) = month_from_index(idx);
        let candidate = weekday_in_month(y, m, day_of_week, week)
            .and_time(from.time())
            .and_utc();
        if candidate > from {
            return candidate;
        }
        idx += i64::from(interval);
    }
}

/// Resolves e.g. "second Tuesday of 2026-03". Every month has at least four
/// of each weekday, so First..=Fourth always exist; Last may be the fifth.
fn weekday_in_month(year: i32, month: u32, day_of_week: u8, week: WeekOfMonth) -> NaiveDate {
    match week {
        WeekOfMonth::Last => {
            let mut d = NaiveDate::from_ymd_opt(year, month, days_in_month(year, month))
                .expect("last day of month");
            while d.weekday().num_days_from_sunday() as u8 != day_of_week {
                d = d.pred_opt().expect("walking back within month");
            }
            d
        }
        nth => {
            let first = NaiveDate::from_ymd_opt(year, month, 1).expect("first day of month");
            let first_weekday = first.weekday().num_days_from_sunday() as u8;
            let offset = (7 + day_of_week - first_weekday) % 7;
            let ordinal: u32 = match nth {
                WeekOfMonth::First => 0,
                WeekOfMonth::Second => 1,
                WeekOfMonth::Third => 2,
                WeekOfMonth::Fourth => 3,
                WeekOfMonth::Last => unreachable!("handled above"),
            };
            NaiveDate::from_ymd_opt(year, month, 1 + u32::from(offset) + 7 * ordinal)
                .expect("nth weekday exists in every month")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn daily_adds_interval_days() {
        let rule = Recurrence::Daily { interval: 3 };
        let from = at(2026, 8, 30, 10);
        assert_eq!(next_occurrence(&rule, from).unwrap(), at(2026, 9, 2, 10));
    }

    #[test]
    fn weekly_from_thursday_lands_on_next_monday() {
        // days [Mon, Wed], interval 1, from a Thursday.
        let rule = Recurrence::Weekly {
            interval: 1,
            days_of_week: BTreeSet::from([1, 3]),
        };
        let from = at(2026, 9, 3, 12); // Thursday
        assert_eq!(next_occurrence(&rule, from).unwrap(), at(2026, 9, 7, 12)); // Monday
    }

    #[test]
    fn weekly_from_sunday_lands_on_next_day_monday() {
        let rule = Recurrence::Weekly {
            interval: 1,
            days_of_week: BTreeSet::from([1, 3]),
        };
        let from = at(2026, 9, 6, 8); // Sunday, start of the week
        assert_eq!(next_occurrence(&rule, from).unwrap(), at(2026, 9, 7, 8)); // Monday
    }

    #[test]
    fn weekly_interval_skips_whole_weeks() {
        // Mondays every 2 weeks, from a Thursday: this week's Monday is past,
        // week +1 is off-cycle, so the hit is the Monday 11 days out.
        let rule = Recurrence::Weekly {
            interval: 2,
            days_of_week: BTreeSet::from([1]),
        };
        let from = at(2026, 9, 3, 12); // Thursday
        assert_eq!(next_occurrence(&rule, from).unwrap(), at(2026, 9, 14, 12));
    }

    #[test]
    fn weekly_same_week_candidate_still_eligible() {
        // Saturdays every 3 weeks, from a Thursday: Saturday of the current
        // week is still inside cycle week 0.
        let rule = Recurrence::Weekly {
            interval: 3,
            days_of_week: BTreeSet::from([6]),
        };
        let from = at(2026, 9, 3, 12); // Thursday
        assert_eq!(next_occurrence(&rule, from).unwrap(), at(2026, 9, 5, 12));
    }

    #[test]
    fn monthly_day_clamps_to_short_month() {
        let rule = Recurrence::Monthly {
            interval: 1,
            rule: MonthlyRule::DayOfMonth { day_of_month: 31 },
        };
        let from = at(2026, 1, 31, 9);
        assert_eq!(next_occurrence(&rule, from).unwrap(), at(2026, 2, 28, 9));
    }

    #[test]
    fn monthly_day_clamps_to_leap_february() {
        let rule = Recurrence::Monthly {
            interval: 1,
            rule: MonthlyRule::DayOfMonth { day_of_month: 31 },
        };
        let from = at(2024, 1, 31, 9);
        assert_eq!(next_occurrence(&rule, from).unwrap(), at(2024, 2, 29, 9));
    }

    #[test]
    fn monthly_last_friday_resolves_fifth_friday() {
        // 2026-05 has five Fridays; "last" must be the 29th, not the 22nd.
        let rule = Recurrence::Monthly {
            interval: 1,
            rule: MonthlyRule::DayOfWeek {
                week_of_month: WeekOfMonth::Last,
                day_of_week: 5,
            },
        };
        let from = at(2026, 4, 20, 7);
        assert_eq!(next_occurrence(&rule, from).unwrap(), at(2026, 5, 29, 7));
    }

    #[test]
    fn monthly_second_tuesday() {
        let rule = Recurrence::Monthly {
            interval: 1,
            rule: MonthlyRule::DayOfWeek {
                week_of_month: WeekOfMonth::Second,
                day_of_week: 2,
            },
        };
        let from = at(2026, 8, 30, 7);
        // Second Tuesday of September 2026 is the 8th.
        assert_eq!(next_occurrence(&rule, from).unwrap(), at(2026, 9, 8, 7));
    }

    #[test]
    fn malformed_rules_are_rejected() {
        let from = at(2026, 8, 30, 7);
        assert_eq!(
            next_occurrence(&Recurrence::Daily { interval: 0 }, from),
            Err(RecurrenceError::ZeroInterval)
        );
        assert_eq!(
            next_occurrence(
                &Recurrence::Weekly {
                    interval: 1,
                    days_of_week: BTreeSet::new()
                },
                from
            ),
            Err(RecurrenceError::EmptyWeekdaySet)
        );
        assert_eq!(
            next_occurrence(
                &Recurrence::Weekly {
                    interval: 1,
                    days_of_week: BTreeSet::from([7])
                },
                from
            ),
            Err(RecurrenceError::WeekdayOutOfRange(7))
        );
        assert_eq!(
            next_occurrence(
                &Recurrence::Monthly {
                    interval: 1,
                    rule: MonthlyRule::DayOfMonth { day_of_month: 32 }
                },
                from
            ),
            Err(RecurrenceError::DayOfMonthOutOfRange(32))
        );
    }

    #[test]
    fn schedule_plan_due_and_advance() {
        let rule = Recurrence::Daily { interval: 7 };
        let from = at(2026, 8, 30, 10);
        let sched = RecurrenceSchedule::plan(rule, from).unwrap();
        assert_eq!(sched.computed_at, from);
        assert_eq!(sched.next_due, at(2026, 9, 6, 10));
        assert!(!sched.is_due(at(2026, 9, 5, 10)));
        assert!(sched.is_due(at(2026, 9, 6, 10)));

        // On-time completion rolls forward from the due date.
        let rolled = sched.advance(at(2026, 9, 6, 12)).unwrap();
        assert_eq!(rolled.next_due, at(2026, 9, 13, 12));

        // Late completion never yields a past due date.
        let late = sched.advance(at(2026, 9, 20, 10)).unwrap();
        assert_eq!(late.next_due, at(2026, 9, 27, 10));
    }

    #[test]
    fn rule_json_shape_matches_stored_format() {
        let rule = Recurrence::Weekly {
            interval: 2,
            days_of_week: BTreeSet::from([0, 3]),
        };
        let v = serde_json::to_value(&rule).unwrap();
        assert_eq!(
            v,
            serde_json::json!({"type": "weekly", "interval": 2, "days_of_week": [0, 3]})
        );

        let monthly: Recurrence = serde_json::from_value(serde_json::json!({
            "type": "monthly", "interval": 1, "week_of_month": -1, "day_of_week": 5
        }))
        .unwrap();
        assert_eq!(
            monthly,
            Recurrence::Monthly {
                interval: 1,
                rule: MonthlyRule::DayOfWeek {
                    week_of_month: WeekOfMonth::Last,
                    day_of_week: 5
                }
            }
        );
    }
}
