use async_trait::async_trait;
use sqlx::PgPool;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::tracking::repo::{SleepRecord, SupplementDose, WorkoutSession};

/// Read side of the four tracking tables plus the program-start field, as seen by
/// the aggregation layer. "Not found" is `None`/empty, never an error; a genuine
/// query failure propagates and aborts the whole aggregation.
#[async_trait]
pub trait TrackingStore: Send + Sync {
    async fn meal_numbers(&self, user_id: Uuid, date: Date) -> anyhow::Result<Vec<i16>>;

    /// Latest session for the date, completed ones first.
    async fn workout_session(
        &self,
        user_id: Uuid,
        date: Date,
    ) -> anyhow::Result<Option<WorkoutSession>>;

    async fn sleep_record(&self, user_id: Uuid, date: Date)
        -> anyhow::Result<Option<SleepRecord>>;

    async fn supplement_dose(
        &self,
        user_id: Uuid,
        date: Date,
    ) -> anyhow::Result<Option<SupplementDose>>;

    /// Dates of all completed sessions, ascending. Input to the streak calculator.
    async fn finished_workout_dates(&self, user_id: Uuid) -> anyhow::Result<Vec<Date>>;

    async fn meals_completed_since(&self, user_id: Uuid, cutoff: Date) -> anyhow::Result<i64>;

    async fn workouts_completed_since(&self, user_id: Uuid, cutoff: Date) -> anyhow::Result<i64>;

    async fn sleep_hours_since(&self, user_id: Uuid, cutoff: Date) -> anyhow::Result<Vec<f64>>;

    async fn supplement_doses_since(
        &self,
        user_id: Uuid,
        cutoff: Date,
    ) -> anyhow::Result<Vec<SupplementDose>>;

    async fn program_started_at(&self, user_id: Uuid) -> anyhow::Result<Option<OffsetDateTime>>;
}

pub struct PgTrackingStore {
    db: PgPool,
}

impl PgTrackingStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TrackingStore for PgTrackingStore {
    async fn meal_numbers(&self, user_id: Uuid, date: Date) -> anyhow::Result<Vec<i16>> {
        let numbers = sqlx::query_scalar::<_, i16>(
            r#"
            SELECT meal_number FROM meal_completions
            WHERE user_id = $1 AND date = $2
            ORDER BY meal_number
            "#,
        )
        .bind(user_id)
        .bind(date)
        .fetch_all(&self.db)
        .await?;
        Ok(numbers)
    }

    async fn workout_session(
        &self,
        user_id: Uuid,
        date: Date,
    ) -> anyhow::Result<Option<WorkoutSession>> {
        let session = sqlx::query_as::<_, WorkoutSession>(
            r#"
            SELECT id, user_id, date, day_of_week, name, target_duration_minutes,
                   actual_duration_minutes, started_at, finished_at
            FROM workout_sessions
            WHERE user_id = $1 AND date = $2
            ORDER BY (finished_at IS NULL), started_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(date)
        .fetch_optional(&self.db)
        .await?;
        Ok(session)
    }

    async fn sleep_record(
        &self,
        user_id: Uuid,
        date: Date,
    ) -> anyhow::Result<Option<SleepRecord>> {
        let record = sqlx::query_as::<_, SleepRecord>(
            r#"
            SELECT user_id, date, hours_slept, quality_rating, feeling, notes
            FROM sleep_records
            WHERE user_id = $1 AND date = $2
            "#,
        )
        .bind(user_id)
        .bind(date)
        .fetch_optional(&self.db)
        .await?;
        Ok(record)
    }

    async fn supplement_dose(
        &self,
        user_id: Uuid,
        date: Date,
    ) -> anyhow::Result<Option<SupplementDose>> {
        let dose = sqlx::query_as::<_, SupplementDose>(
            r#"
            SELECT user_id, date, morning_taken, evening_taken
            FROM supplement_doses
            WHERE user_id = $1 AND date = $2
            "#,
        )
        .bind(user_id)
        .bind(date)
        .fetch_optional(&self.db)
        .await?;
        Ok(dose)
    }

    async fn finished_workout_dates(&self, user_id: Uuid) -> anyhow::Result<Vec<Date>> {
        let dates = sqlx::query_scalar::<_, Date>(
            r#"
            SELECT date FROM workout_sessions
            WHERE user_id = $1 AND finished_at IS NOT NULL
            ORDER BY date
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(dates)
    }

    async fn meals_completed_since(&self, user_id: Uuid, cutoff: Date) -> anyhow::Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM meal_completions
            WHERE user_id = $1 AND date >= $2
            "#,
        )
        .bind(user_id)
        .bind(cutoff)
        .fetch_one(&self.db)
        .await?;
        Ok(count)
    }

    async fn workouts_completed_since(&self, user_id: Uuid, cutoff: Date) -> anyhow::Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM workout_sessions
            WHERE user_id = $1 AND date >= $2 AND finished_at IS NOT NULL
            "#,
        )
        .bind(user_id)
        .bind(cutoff)
        .fetch_one(&self.db)
        .await?;
        Ok(count)
    }

    async fn sleep_hours_since(&self, user_id: Uuid, cutoff: Date) -> anyhow::Result<Vec<f64>> {
        let hours = sqlx::query_scalar::<_, f64>(
            r#"
            SELECT hours_slept FROM sleep_records
            WHERE user_id = $1 AND date >= $2
            "#,
        )
        .bind(user_id)
        .bind(cutoff)
        .fetch_all(&self.db)
        .await?;
        Ok(hours)
    }

    async fn supplement_doses_since(
        &self,
        user_id: Uuid,
        cutoff: Date,
    ) -> anyhow::Result<Vec<SupplementDose>> {
        let doses = sqlx::query_as::<_, SupplementDose>(
            r#"
            SELECT user_id, date, morning_taken, evening_taken
            FROM supplement_doses
            WHERE user_id = $1 AND date >= $2
            "#,
        )
        .bind(user_id)
        .bind(cutoff)
        .fetch_all(&self.db)
        .await?;
        Ok(doses)
    }

    async fn program_started_at(&self, user_id: Uuid) -> anyhow::Result<Option<OffsetDateTime>> {
        let started = sqlx::query_scalar::<_, Option<OffsetDateTime>>(
            r#"
            SELECT program_started_at FROM users WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(started.flatten())
    }
}
