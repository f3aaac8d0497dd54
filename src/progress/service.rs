use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::FromRef;
use futures::future::try_join_all;
use time::{Date, Duration as TimeDuration};
use uuid::Uuid;

use crate::clock::Clock;
use crate::dates::format_date;
use crate::progress::dto::{
    DailyCompletion, DayDetail, DayTasks, MealTask, ProgramStats, SleepTask, StreakResult,
    SupplementTask, TaskStatus, WorkoutTask,
};
use crate::progress::streaks::compute_streaks;
use crate::state::AppState;
use crate::tracking::repo::{SleepRecord, SupplementDose, WorkoutSession};
use crate::tracking::store::TrackingStore;

/// Number of trackable task categories per day.
pub const DAILY_TASK_COUNT: u32 = 4;
/// Meals count as done once this many completions exist for the day.
pub const MEAL_COMPLETION_THRESHOLD: usize = 3;
/// Display denominator for the meal checklist. Not the completion threshold.
pub const MEAL_DISPLAY_TOTAL: i16 = 5;
/// Stats look back this many days from `as_of`.
pub const STATS_WINDOW_DAYS: i64 = 30;

/// Read-only aggregation over the four tracking stores. Store and clock are
/// injected so the whole layer runs against fakes in tests.
#[derive(Clone)]
pub struct ProgressService {
    store: Arc<dyn TrackingStore>,
    clock: Arc<dyn Clock>,
}

impl FromRef<AppState> for ProgressService {
    fn from_ref(state: &AppState) -> Self {
        ProgressService::new(state.store.clone(), state.clock.clone())
    }
}

fn count_completed(
    meal_numbers: &[i16],
    workout: Option<&WorkoutSession>,
    sleep: Option<&SleepRecord>,
    dose: Option<&SupplementDose>,
) -> u32 {
    let mut completed = 0;
    if meal_numbers.len() >= MEAL_COMPLETION_THRESHOLD {
        completed += 1;
    }
    if workout.map_or(false, |w| w.finished_at.is_some()) {
        completed += 1;
    }
    if sleep.is_some() {
        completed += 1;
    }
    if dose.map_or(false, |d| d.morning_taken && d.evening_taken) {
        completed += 1;
    }
    completed
}

impl ProgressService {
    pub fn new(store: Arc<dyn TrackingStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn today(&self) -> Date {
        self.clock.today()
    }

    /// How many of the four daily tasks are done for (user, date). Missing rows
    /// are "not done"; any store failure aborts the whole call.
    pub async fn daily_completion(
        &self,
        user_id: Uuid,
        date: Date,
    ) -> anyhow::Result<DailyCompletion> {
        let (meals, workout, sleep, dose) = tokio::try_join!(
            self.store.meal_numbers(user_id, date),
            self.store.workout_session(user_id, date),
            self.store.sleep_record(user_id, date),
            self.store.supplement_dose(user_id, date),
        )?;

        Ok(DailyCompletion {
            completed: count_completed(&meals, workout.as_ref(), sleep.as_ref(), dose.as_ref()),
            total: DAILY_TASK_COUNT,
        })
    }

    /// Per-day completion for every date in [start, end], keyed by ISO date.
    /// An inverted range yields an empty map. Days are fanned out concurrently.
    pub async fn range_completion(
        &self,
        user_id: Uuid,
        start: Date,
        end: Date,
    ) -> anyhow::Result<BTreeMap<String, DailyCompletion>> {
        let mut days = Vec::new();
        let mut d = start;
        while d <= end {
            days.push(d);
            match d.next_day() {
                Some(next) => d = next,
                None => break,
            }
        }

        let results = try_join_all(days.into_iter().map(|day| async move {
            let summary = self.daily_completion(user_id, day).await?;
            Ok::<_, anyhow::Error>((day, summary))
        }))
        .await?;

        Ok(results
            .into_iter()
            .map(|(day, summary)| (format_date(day), summary))
            .collect())
    }

    /// Same four lookups as `daily_completion`, keeping the underlying fields.
    pub async fn day_detail(&self, user_id: Uuid, date: Date) -> anyhow::Result<DayDetail> {
        let (meals, workout, sleep, dose) = tokio::try_join!(
            self.store.meal_numbers(user_id, date),
            self.store.workout_session(user_id, date),
            self.store.sleep_record(user_id, date),
            self.store.supplement_dose(user_id, date),
        )?;

        let completed_tasks =
            count_completed(&meals, workout.as_ref(), sleep.as_ref(), dose.as_ref());

        let mut meal_numbers = meals;
        meal_numbers.sort_unstable();
        meal_numbers.dedup();

        let meals_task = MealTask {
            status: TaskStatus::from_done(meal_numbers.len() >= MEAL_COMPLETION_THRESHOLD),
            completed_numbers: meal_numbers,
            total: MEAL_DISPLAY_TOTAL,
        };

        let workout_task = WorkoutTask {
            status: TaskStatus::from_done(
                workout.as_ref().map_or(false, |w| w.finished_at.is_some()),
            ),
            name: workout.as_ref().map(|w| w.name.clone()),
            actual_duration_minutes: workout.as_ref().and_then(|w| w.actual_duration_minutes),
            finished_at: workout.as_ref().and_then(|w| w.finished_at),
        };

        let sleep_task = SleepTask {
            status: TaskStatus::from_done(sleep.is_some()),
            hours_slept: sleep.as_ref().map(|s| s.hours_slept),
            quality_rating: sleep.as_ref().map(|s| s.quality_rating),
            feeling: sleep.as_ref().and_then(|s| s.feeling.clone()),
        };

        let supplements_task = SupplementTask {
            status: TaskStatus::from_done(
                dose.as_ref()
                    .map_or(false, |d| d.morning_taken && d.evening_taken),
            ),
            morning_taken: dose.as_ref().map_or(false, |d| d.morning_taken),
            evening_taken: dose.as_ref().map_or(false, |d| d.evening_taken),
        };

        Ok(DayDetail {
            date: format_date(date),
            completed_tasks,
            total_tasks: DAILY_TASK_COUNT,
            tasks: DayTasks {
                meals: meals_task,
                workout: workout_task,
                sleep: sleep_task,
                supplements: supplements_task,
            },
        })
    }

    /// Current and longest workout streaks, anchored at the injected clock's today.
    pub async fn streaks(&self, user_id: Uuid) -> anyhow::Result<StreakResult> {
        let dates = self.store.finished_workout_dates(user_id).await?;
        Ok(compute_streaks(&dates, self.clock.today()))
    }

    /// 30-day totals and averages. The five sub-aggregations are independent and
    /// run concurrently.
    pub async fn stats(&self, user_id: Uuid, as_of: Option<Date>) -> anyhow::Result<ProgramStats> {
        let as_of = as_of.unwrap_or_else(|| self.clock.today());
        let cutoff = as_of - TimeDuration::days(STATS_WINDOW_DAYS);

        let (meals_completed, workouts_completed, sleep_hours, doses, program_started) = tokio::try_join!(
            self.store.meals_completed_since(user_id, cutoff),
            self.store.workouts_completed_since(user_id, cutoff),
            self.store.sleep_hours_since(user_id, cutoff),
            self.store.supplement_doses_since(user_id, cutoff),
            self.store.program_started_at(user_id),
        )?;

        // One decimal, half away from zero.
        let average_sleep_hours = if sleep_hours.is_empty() {
            0.0
        } else {
            let mean = sleep_hours.iter().sum::<f64>() / sleep_hours.len() as f64;
            (mean * 10.0).round() / 10.0
        };

        // Each row holds up to two doses; percentage rounded to nearest integer.
        let supplement_compliance = if doses.is_empty() {
            0
        } else {
            let taken: i64 = doses
                .iter()
                .map(|d| i64::from(d.morning_taken) + i64::from(d.evening_taken))
                .sum();
            ((taken as f64 / (2 * doses.len()) as f64) * 100.0).round() as i64
        };

        let days_in_program = match program_started {
            Some(started) => {
                let elapsed = (self.clock.now() - started).whole_seconds();
                if elapsed <= 0 {
                    0
                } else {
                    (elapsed + 86_399) / 86_400
                }
            }
            None => 0,
        };

        Ok(ProgramStats {
            meals_completed,
            workouts_completed,
            average_sleep_hours,
            supplement_compliance,
            days_in_program,
            period_days: STATS_WINDOW_DAYS as u32,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use time::macros::{date, datetime};
    use time::OffsetDateTime;

    use super::*;

    #[derive(Default)]
    struct FakeStore {
        meals: HashMap<(Uuid, Date), Vec<i16>>,
        workouts: HashMap<(Uuid, Date), WorkoutSession>,
        sleep: HashMap<(Uuid, Date), SleepRecord>,
        doses: HashMap<(Uuid, Date), SupplementDose>,
        program_started: HashMap<Uuid, OffsetDateTime>,
    }

    impl FakeStore {
        fn with_meals(mut self, user_id: Uuid, day: Date, numbers: &[i16]) -> Self {
            self.meals.insert((user_id, day), numbers.to_vec());
            self
        }

        fn with_workout(
            mut self,
            user_id: Uuid,
            day: Date,
            name: &str,
            actual_minutes: Option<i32>,
            finished: bool,
        ) -> Self {
            let started_at = day.midnight().assume_utc();
            self.workouts.insert(
                (user_id, day),
                WorkoutSession {
                    id: Uuid::new_v4(),
                    user_id,
                    date: day,
                    day_of_week: 1,
                    name: name.to_string(),
                    target_duration_minutes: 45,
                    actual_duration_minutes: actual_minutes,
                    started_at,
                    finished_at: finished.then(|| started_at + TimeDuration::minutes(40)),
                },
            );
            self
        }

        fn with_sleep(mut self, user_id: Uuid, day: Date, hours: f64, quality: i16) -> Self {
            self.sleep.insert(
                (user_id, day),
                SleepRecord {
                    user_id,
                    date: day,
                    hours_slept: hours,
                    quality_rating: quality,
                    feeling: Some("rested".into()),
                    notes: None,
                },
            );
            self
        }

        fn with_dose(mut self, user_id: Uuid, day: Date, morning: bool, evening: bool) -> Self {
            self.doses.insert(
                (user_id, day),
                SupplementDose {
                    user_id,
                    date: day,
                    morning_taken: morning,
                    evening_taken: evening,
                },
            );
            self
        }

        fn with_program_start(mut self, user_id: Uuid, started: OffsetDateTime) -> Self {
            self.program_started.insert(user_id, started);
            self
        }
    }

    #[async_trait]
    impl TrackingStore for FakeStore {
        async fn meal_numbers(&self, user_id: Uuid, date: Date) -> anyhow::Result<Vec<i16>> {
            Ok(self.meals.get(&(user_id, date)).cloned().unwrap_or_default())
        }

        async fn workout_session(
            &self,
            user_id: Uuid,
            date: Date,
        ) -> anyhow::Result<Option<WorkoutSession>> {
            Ok(self.workouts.get(&(user_id, date)).cloned())
        }

        async fn sleep_record(
            &self,
            user_id: Uuid,
            date: Date,
        ) -> anyhow::Result<Option<SleepRecord>> {
            Ok(self.sleep.get(&(user_id, date)).cloned())
        }

        async fn supplement_dose(
            &self,
            user_id: Uuid,
            date: Date,
        ) -> anyhow::Result<Option<SupplementDose>> {
            Ok(self.doses.get(&(user_id, date)).cloned())
        }

        async fn finished_workout_dates(&self, user_id: Uuid) -> anyhow::Result<Vec<Date>> {
            let mut dates: Vec<Date> = self
                .workouts
                .values()
                .filter(|w| w.user_id == user_id && w.finished_at.is_some())
                .map(|w| w.date)
                .collect();
            dates.sort_unstable();
            Ok(dates)
        }

        async fn meals_completed_since(
            &self,
            user_id: Uuid,
            cutoff: Date,
        ) -> anyhow::Result<i64> {
            Ok(self
                .meals
                .iter()
                .filter(|((u, d), _)| *u == user_id && *d >= cutoff)
                .map(|(_, numbers)| numbers.len() as i64)
                .sum())
        }

        async fn workouts_completed_since(
            &self,
            user_id: Uuid,
            cutoff: Date,
        ) -> anyhow::Result<i64> {
            Ok(self
                .workouts
                .values()
                .filter(|w| w.user_id == user_id && w.date >= cutoff && w.finished_at.is_some())
                .count() as i64)
        }

        async fn sleep_hours_since(&self, user_id: Uuid, cutoff: Date) -> anyhow::Result<Vec<f64>> {
            Ok(self
                .sleep
                .values()
                .filter(|s| s.user_id == user_id && s.date >= cutoff)
                .map(|s| s.hours_slept)
                .collect())
        }

        async fn supplement_doses_since(
            &self,
            user_id: Uuid,
            cutoff: Date,
        ) -> anyhow::Result<Vec<SupplementDose>> {
            Ok(self
                .doses
                .values()
                .filter(|d| d.user_id == user_id && d.date >= cutoff)
                .cloned()
                .collect())
        }

        async fn program_started_at(
            &self,
            user_id: Uuid,
        ) -> anyhow::Result<Option<OffsetDateTime>> {
            Ok(self.program_started.get(&user_id).copied())
        }
    }

    struct FixedClock {
        now: OffsetDateTime,
    }

    impl Clock for FixedClock {
        fn now(&self) -> OffsetDateTime {
            self.now
        }
    }

    const TODAY: Date = date!(2025 - 11 - 18);

    fn service(store: FakeStore) -> ProgressService {
        ProgressService::new(
            Arc::new(store),
            Arc::new(FixedClock {
                now: datetime!(2025 - 11 - 18 12:00 UTC),
            }),
        )
    }

    #[tokio::test]
    async fn absence_yields_zero_of_four() {
        let user = Uuid::new_v4();
        let svc = service(FakeStore::default());
        let summary = svc.daily_completion(user, TODAY).await.unwrap();
        assert_eq!(summary, DailyCompletion { completed: 0, total: 4 });
    }

    #[tokio::test]
    async fn meals_need_three_completions() {
        let user = Uuid::new_v4();

        let svc = service(FakeStore::default().with_meals(user, TODAY, &[1, 2]));
        assert_eq!(svc.daily_completion(user, TODAY).await.unwrap().completed, 0);

        let svc = service(FakeStore::default().with_meals(user, TODAY, &[1, 2, 4]));
        assert_eq!(svc.daily_completion(user, TODAY).await.unwrap().completed, 1);
    }

    #[tokio::test]
    async fn supplement_needs_both_flags() {
        let user = Uuid::new_v4();

        let svc = service(FakeStore::default().with_dose(user, TODAY, true, false));
        assert_eq!(svc.daily_completion(user, TODAY).await.unwrap().completed, 0);

        let svc = service(FakeStore::default().with_dose(user, TODAY, true, true));
        assert_eq!(svc.daily_completion(user, TODAY).await.unwrap().completed, 1);
    }

    #[tokio::test]
    async fn unfinished_workout_does_not_count() {
        let user = Uuid::new_v4();

        let svc = service(FakeStore::default().with_workout(user, TODAY, "Push Day", None, false));
        assert_eq!(svc.daily_completion(user, TODAY).await.unwrap().completed, 0);

        let svc =
            service(FakeStore::default().with_workout(user, TODAY, "Push Day", Some(40), true));
        assert_eq!(svc.daily_completion(user, TODAY).await.unwrap().completed, 1);
    }

    #[tokio::test]
    async fn single_day_range_matches_daily() {
        let user = Uuid::new_v4();
        let svc = service(
            FakeStore::default()
                .with_meals(user, TODAY, &[1, 2, 3])
                .with_sleep(user, TODAY, 7.5, 4),
        );

        let daily = svc.daily_completion(user, TODAY).await.unwrap();
        let range = svc.range_completion(user, TODAY, TODAY).await.unwrap();

        assert_eq!(range.len(), 1);
        assert_eq!(range.get("2025-11-18"), Some(&daily));
    }

    #[tokio::test]
    async fn inverted_range_is_empty() {
        let user = Uuid::new_v4();
        let svc = service(FakeStore::default());
        let range = svc
            .range_completion(user, TODAY, date!(2025 - 11 - 10))
            .await
            .unwrap();
        assert!(range.is_empty());
    }

    #[tokio::test]
    async fn range_is_inclusive_of_both_endpoints() {
        let user = Uuid::new_v4();
        let svc = service(FakeStore::default().with_sleep(user, date!(2025 - 11 - 17), 8.0, 5));

        let range = svc
            .range_completion(user, date!(2025 - 11 - 16), TODAY)
            .await
            .unwrap();

        assert_eq!(range.len(), 3);
        assert_eq!(range["2025-11-16"].completed, 0);
        assert_eq!(range["2025-11-17"].completed, 1);
        assert_eq!(range["2025-11-18"].completed, 0);
    }

    #[tokio::test]
    async fn day_detail_keeps_underlying_fields() {
        // Meals 1, 2 and 4 done, a finished 40-minute "Push Day", sleep logged,
        // morning supplement only: three of four tasks complete.
        let user = Uuid::new_v4();
        let svc = service(
            FakeStore::default()
                .with_meals(user, TODAY, &[4, 1, 2])
                .with_workout(user, TODAY, "Push Day", Some(40), true)
                .with_sleep(user, TODAY, 7.5, 4)
                .with_dose(user, TODAY, true, false),
        );

        let detail = svc.day_detail(user, TODAY).await.unwrap();

        assert_eq!(detail.date, "2025-11-18");
        assert_eq!(detail.completed_tasks, 3);
        assert_eq!(detail.total_tasks, 4);

        assert_eq!(detail.tasks.meals.status, TaskStatus::Completed);
        assert_eq!(detail.tasks.meals.completed_numbers, vec![1, 2, 4]);
        assert_eq!(detail.tasks.meals.total, 5);

        assert_eq!(detail.tasks.workout.status, TaskStatus::Completed);
        assert_eq!(detail.tasks.workout.name.as_deref(), Some("Push Day"));
        assert_eq!(detail.tasks.workout.actual_duration_minutes, Some(40));
        assert!(detail.tasks.workout.finished_at.is_some());

        assert_eq!(detail.tasks.sleep.status, TaskStatus::Completed);
        assert_eq!(detail.tasks.sleep.hours_slept, Some(7.5));
        assert_eq!(detail.tasks.sleep.quality_rating, Some(4));

        assert_eq!(detail.tasks.supplements.status, TaskStatus::Incomplete);
        assert!(detail.tasks.supplements.morning_taken);
        assert!(!detail.tasks.supplements.evening_taken);
    }

    #[tokio::test]
    async fn day_detail_for_empty_day_is_all_incomplete() {
        let user = Uuid::new_v4();
        let svc = service(FakeStore::default());

        let detail = svc.day_detail(user, TODAY).await.unwrap();

        assert_eq!(detail.completed_tasks, 0);
        assert_eq!(detail.tasks.meals.status, TaskStatus::Incomplete);
        assert!(detail.tasks.meals.completed_numbers.is_empty());
        assert_eq!(detail.tasks.workout.name, None);
        assert_eq!(detail.tasks.workout.finished_at, None);
        assert_eq!(detail.tasks.sleep.hours_slept, None);
        assert!(!detail.tasks.supplements.morning_taken);
        assert!(!detail.tasks.supplements.evening_taken);
    }

    #[tokio::test]
    async fn streaks_use_completed_sessions_and_injected_today() {
        let user = Uuid::new_v4();
        let svc = service(
            FakeStore::default()
                .with_workout(user, date!(2025 - 11 - 16), "Legs", Some(30), true)
                .with_workout(user, date!(2025 - 11 - 17), "Pull", Some(35), true)
                .with_workout(user, TODAY, "Push", Some(40), true),
        );

        let res = svc.streaks(user).await.unwrap();
        assert_eq!(res.current_streak, 3);
        assert_eq!(res.longest_streak, 3);
    }

    #[tokio::test]
    async fn streaks_ignore_unfinished_sessions() {
        let user = Uuid::new_v4();
        let svc = service(
            FakeStore::default()
                .with_workout(user, date!(2025 - 11 - 17), "Pull", Some(35), true)
                .with_workout(user, TODAY, "Push", None, false),
        );

        let res = svc.streaks(user).await.unwrap();
        assert_eq!(res.current_streak, 1);
    }

    #[tokio::test]
    async fn stats_for_empty_window_are_zero() {
        let user = Uuid::new_v4();
        let svc = service(FakeStore::default());

        let stats = svc.stats(user, None).await.unwrap();
        assert_eq!(stats.meals_completed, 0);
        assert_eq!(stats.workouts_completed, 0);
        assert_eq!(stats.average_sleep_hours, 0.0);
        assert_eq!(stats.supplement_compliance, 0);
        assert_eq!(stats.days_in_program, 0);
        assert_eq!(stats.period_days, 30);
    }

    #[tokio::test]
    async fn average_sleep_rounds_to_one_decimal() {
        // Ten rows with mean 7.33 round half away from zero to 7.3.
        let user = Uuid::new_v4();
        let mut store = FakeStore::default();
        let mut day = date!(2025 - 11 - 01);
        for i in 0..10 {
            let hours = if i == 9 { 10.3 } else { 7.0 };
            store = store.with_sleep(user, day, hours, 4);
            day = day.next_day().unwrap();
        }
        let svc = service(store);

        let stats = svc.stats(user, None).await.unwrap();
        assert_eq!(stats.average_sleep_hours, 7.3);
    }

    #[tokio::test]
    async fn supplement_compliance_is_an_integer_percentage() {
        // Three rows, three of six doses taken: 50%.
        let user = Uuid::new_v4();
        let svc = service(
            FakeStore::default()
                .with_dose(user, date!(2025 - 11 - 15), true, true)
                .with_dose(user, date!(2025 - 11 - 16), true, false)
                .with_dose(user, date!(2025 - 11 - 17), false, false),
        );
        assert_eq!(svc.stats(user, None).await.unwrap().supplement_compliance, 50);

        // Four of six rounds to 67.
        let user = Uuid::new_v4();
        let svc = service(
            FakeStore::default()
                .with_dose(user, date!(2025 - 11 - 15), true, true)
                .with_dose(user, date!(2025 - 11 - 16), true, false)
                .with_dose(user, date!(2025 - 11 - 17), true, false),
        );
        assert_eq!(svc.stats(user, None).await.unwrap().supplement_compliance, 67);
    }

    #[tokio::test]
    async fn stats_window_excludes_rows_older_than_thirty_days() {
        let user = Uuid::new_v4();
        let svc = service(
            FakeStore::default()
                .with_meals(user, date!(2025 - 10 - 01), &[1, 2, 3])
                .with_meals(user, date!(2025 - 11 - 17), &[1, 2]),
        );

        let stats = svc.stats(user, None).await.unwrap();
        assert_eq!(stats.meals_completed, 2);
    }

    #[tokio::test]
    async fn days_in_program_is_the_ceiling_of_elapsed_days() {
        let user = Uuid::new_v4();

        // 29.5 days elapsed rounds up to 30.
        let svc = service(
            FakeStore::default()
                .with_program_start(user, datetime!(2025 - 10 - 20 0:00 UTC)),
        );
        assert_eq!(svc.stats(user, None).await.unwrap().days_in_program, 30);

        // A start in the future clamps to zero.
        let user = Uuid::new_v4();
        let svc = service(
            FakeStore::default()
                .with_program_start(user, datetime!(2025 - 12 - 01 0:00 UTC)),
        );
        assert_eq!(svc.stats(user, None).await.unwrap().days_in_program, 0);
    }
}
