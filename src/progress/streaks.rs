use std::collections::BTreeSet;

use time::Date;

use crate::progress::dto::StreakResult;

/// Streaks over the dates of completed workout sessions. Pure, no store access;
/// duplicate dates are collapsed before counting.
///
/// The current streak walks backward from `today`: a session at most one day
/// before the cursor counts and moves the cursor to the day before that session,
/// anything further back breaks the walk. The longest streak scans unique dates
/// ascending and counts runs of exactly-consecutive days; it is reported as at
/// least the current streak so `longest >= current` holds for any input.
pub fn compute_streaks(dates: &[Date], today: Date) -> StreakResult {
    let unique: BTreeSet<Date> = dates.iter().copied().collect();

    let mut current = 0u32;
    let mut cursor = today;
    for &d in unique.iter().rev() {
        if d > cursor {
            continue;
        }
        if (cursor - d).whole_days() > 1 {
            break;
        }
        current += 1;
        match d.previous_day() {
            Some(prev) => cursor = prev,
            None => break,
        }
    }

    let mut longest = 0u32;
    let mut run = 0u32;
    let mut prev: Option<Date> = None;
    for &d in &unique {
        run = match prev {
            Some(p) if (d - p).whole_days() == 1 => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        prev = Some(d);
    }

    StreakResult {
        current_streak: current,
        longest_streak: longest.max(current),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn empty_input_is_zero() {
        let res = compute_streaks(&[], date!(2025 - 11 - 18));
        assert_eq!(res.current_streak, 0);
        assert_eq!(res.longest_streak, 0);
    }

    #[test]
    fn single_date_today() {
        let res = compute_streaks(&[date!(2025 - 11 - 18)], date!(2025 - 11 - 18));
        assert_eq!(res.current_streak, 1);
        assert_eq!(res.longest_streak, 1);
    }

    #[test]
    fn three_consecutive_days_ending_today() {
        // Sessions on the 16th, 17th and 18th, today is the 18th.
        let dates = [
            date!(2025 - 11 - 16),
            date!(2025 - 11 - 17),
            date!(2025 - 11 - 18),
        ];
        let res = compute_streaks(&dates, date!(2025 - 11 - 18));
        assert_eq!(res.current_streak, 3);
        assert_eq!(res.longest_streak, 3);
    }

    #[test]
    fn wide_gap_breaks_current_streak() {
        // Sessions on the 10th and 18th only; the walk stops before the 10th.
        let dates = [date!(2025 - 11 - 10), date!(2025 - 11 - 18)];
        let res = compute_streaks(&dates, date!(2025 - 11 - 18));
        assert_eq!(res.current_streak, 1);
        assert_eq!(res.longest_streak, 1);
    }

    #[test]
    fn missing_today_still_counts_from_yesterday() {
        let dates = [date!(2025 - 11 - 16), date!(2025 - 11 - 17)];
        let res = compute_streaks(&dates, date!(2025 - 11 - 18));
        assert_eq!(res.current_streak, 2);
        assert_eq!(res.longest_streak, 2);
    }

    #[test]
    fn one_day_gap_is_tolerated_in_the_walk() {
        // Session today and one two days back; the skipped 17th does not break it.
        let dates = [date!(2025 - 11 - 16), date!(2025 - 11 - 18)];
        let res = compute_streaks(&dates, date!(2025 - 11 - 18));
        assert_eq!(res.current_streak, 2);
        // Reported longest never falls below current.
        assert_eq!(res.longest_streak, 2);
    }

    #[test]
    fn gap_of_two_days_breaks_the_walk() {
        let dates = [date!(2025 - 11 - 15), date!(2025 - 11 - 18)];
        let res = compute_streaks(&dates, date!(2025 - 11 - 18));
        assert_eq!(res.current_streak, 1);
    }

    #[test]
    fn duplicate_dates_are_idempotent() {
        let once = [
            date!(2025 - 11 - 16),
            date!(2025 - 11 - 17),
            date!(2025 - 11 - 18),
        ];
        let twice = [
            date!(2025 - 11 - 16),
            date!(2025 - 11 - 16),
            date!(2025 - 11 - 17),
            date!(2025 - 11 - 17),
            date!(2025 - 11 - 18),
            date!(2025 - 11 - 18),
        ];
        let today = date!(2025 - 11 - 18);
        assert_eq!(compute_streaks(&once, today), compute_streaks(&twice, today));
    }

    #[test]
    fn longest_tracks_an_older_run() {
        // A 4-day run two weeks ago, a single session today.
        let dates = [
            date!(2025 - 11 - 03),
            date!(2025 - 11 - 04),
            date!(2025 - 11 - 05),
            date!(2025 - 11 - 06),
            date!(2025 - 11 - 18),
        ];
        let res = compute_streaks(&dates, date!(2025 - 11 - 18));
        assert_eq!(res.current_streak, 1);
        assert_eq!(res.longest_streak, 4);
    }

    #[test]
    fn future_dates_are_ignored_by_the_walk() {
        let dates = [date!(2025 - 11 - 18), date!(2025 - 11 - 25)];
        let res = compute_streaks(&dates, date!(2025 - 11 - 18));
        assert_eq!(res.current_streak, 1);
    }

    #[test]
    fn longest_is_never_below_current() {
        let cases: [&[Date]; 4] = [
            &[],
            &[date!(2025 - 11 - 18)],
            &[date!(2025 - 11 - 16), date!(2025 - 11 - 18)],
            &[
                date!(2025 - 11 - 10),
                date!(2025 - 11 - 14),
                date!(2025 - 11 - 16),
                date!(2025 - 11 - 18),
            ],
        ];
        for dates in cases {
            let res = compute_streaks(dates, date!(2025 - 11 - 18));
            assert!(res.longest_streak >= res.current_streak, "{:?}", dates);
        }
    }
}
