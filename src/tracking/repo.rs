use sqlx::{FromRow, PgPool};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum TrackingError {
    #[error("workout already completed for this date")]
    WorkoutAlreadyCompleted,
    #[error("no workout session started for this date")]
    WorkoutNotStarted,
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

#[derive(Debug, Clone, FromRow)]
pub struct MealCompletion {
    pub user_id: Uuid,
    pub date: Date,
    pub meal_number: i16,
}

#[derive(Debug, Clone, FromRow)]
pub struct WorkoutSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: Date,
    pub day_of_week: i16,
    pub name: String,
    pub target_duration_minutes: i32,
    pub actual_duration_minutes: Option<i32>,
    pub started_at: OffsetDateTime,
    pub finished_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, FromRow)]
pub struct SleepRecord {
    pub user_id: Uuid,
    pub date: Date,
    pub hours_slept: f64,
    pub quality_rating: i16,
    pub feeling: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct SupplementDose {
    pub user_id: Uuid,
    pub date: Date,
    pub morning_taken: bool,
    pub evening_taken: bool,
}

impl MealCompletion {
    /// Toggle semantics: the row's presence is the completed flag. Check-then-act,
    /// racing toggles from the same user are accepted as low stakes.
    pub async fn toggle(
        db: &PgPool,
        user_id: Uuid,
        date: Date,
        meal_number: i16,
    ) -> Result<bool, TrackingError> {
        let existing = sqlx::query_scalar::<_, i16>(
            r#"
            SELECT meal_number FROM meal_completions
            WHERE user_id = $1 AND date = $2 AND meal_number = $3
            "#,
        )
        .bind(user_id)
        .bind(date)
        .bind(meal_number)
        .fetch_optional(db)
        .await?;

        if existing.is_some() {
            sqlx::query(
                r#"
                DELETE FROM meal_completions
                WHERE user_id = $1 AND date = $2 AND meal_number = $3
                "#,
            )
            .bind(user_id)
            .bind(date)
            .bind(meal_number)
            .execute(db)
            .await?;
            Ok(false)
        } else {
            sqlx::query(
                r#"
                INSERT INTO meal_completions (user_id, date, meal_number)
                VALUES ($1, $2, $3)
                ON CONFLICT (user_id, date, meal_number) DO NOTHING
                "#,
            )
            .bind(user_id)
            .bind(date)
            .bind(meal_number)
            .execute(db)
            .await?;
            Ok(true)
        }
    }
}

impl WorkoutSession {
    pub async fn start(
        db: &PgPool,
        user_id: Uuid,
        date: Date,
        day_of_week: i16,
        name: &str,
        target_duration_minutes: i32,
    ) -> Result<WorkoutSession, TrackingError> {
        let session = sqlx::query_as::<_, WorkoutSession>(
            r#"
            INSERT INTO workout_sessions (user_id, date, day_of_week, name, target_duration_minutes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, date, day_of_week, name, target_duration_minutes,
                      actual_duration_minutes, started_at, finished_at
            "#,
        )
        .bind(user_id)
        .bind(date)
        .bind(day_of_week)
        .bind(name)
        .bind(target_duration_minutes)
        .fetch_one(db)
        .await?;
        Ok(session)
    }

    /// Marks the latest session for the date as finished. At most one completed
    /// session per (user, date); a second completion is rejected.
    pub async fn complete(
        db: &PgPool,
        user_id: Uuid,
        date: Date,
        actual_duration_minutes: i32,
    ) -> Result<WorkoutSession, TrackingError> {
        let sessions = sqlx::query_as::<_, WorkoutSession>(
            r#"
            SELECT id, user_id, date, day_of_week, name, target_duration_minutes,
                   actual_duration_minutes, started_at, finished_at
            FROM workout_sessions
            WHERE user_id = $1 AND date = $2
            ORDER BY started_at DESC
            "#,
        )
        .bind(user_id)
        .bind(date)
        .fetch_all(db)
        .await?;

        if sessions.iter().any(|s| s.finished_at.is_some()) {
            return Err(TrackingError::WorkoutAlreadyCompleted);
        }
        let Some(session) = sessions.into_iter().next() else {
            return Err(TrackingError::WorkoutNotStarted);
        };

        let finished = sqlx::query_as::<_, WorkoutSession>(
            r#"
            UPDATE workout_sessions
            SET finished_at = now(), actual_duration_minutes = $2
            WHERE id = $1
            RETURNING id, user_id, date, day_of_week, name, target_duration_minutes,
                      actual_duration_minutes, started_at, finished_at
            "#,
        )
        .bind(session.id)
        .bind(actual_duration_minutes)
        .fetch_one(db)
        .await?;
        Ok(finished)
    }
}

impl SleepRecord {
    /// One record per (user, date); re-submission overwrites.
    pub async fn upsert(
        db: &PgPool,
        user_id: Uuid,
        date: Date,
        hours_slept: f64,
        quality_rating: i16,
        feeling: Option<&str>,
        notes: Option<&str>,
    ) -> Result<SleepRecord, TrackingError> {
        let record = sqlx::query_as::<_, SleepRecord>(
            r#"
            INSERT INTO sleep_records (user_id, date, hours_slept, quality_rating, feeling, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_id, date) DO UPDATE
            SET hours_slept = EXCLUDED.hours_slept,
                quality_rating = EXCLUDED.quality_rating,
                feeling = EXCLUDED.feeling,
                notes = EXCLUDED.notes
            RETURNING user_id, date, hours_slept, quality_rating, feeling, notes
            "#,
        )
        .bind(user_id)
        .bind(date)
        .bind(hours_slept)
        .bind(quality_rating)
        .bind(feeling)
        .bind(notes)
        .fetch_one(db)
        .await?;
        Ok(record)
    }
}

impl SupplementDose {
    pub async fn upsert(
        db: &PgPool,
        user_id: Uuid,
        date: Date,
        morning_taken: bool,
        evening_taken: bool,
    ) -> Result<SupplementDose, TrackingError> {
        let dose = sqlx::query_as::<_, SupplementDose>(
            r#"
            INSERT INTO supplement_doses (user_id, date, morning_taken, evening_taken)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, date) DO UPDATE
            SET morning_taken = EXCLUDED.morning_taken,
                evening_taken = EXCLUDED.evening_taken,
                updated_at = now()
            RETURNING user_id, date, morning_taken, evening_taken
            "#,
        )
        .bind(user_id)
        .bind(date)
        .bind(morning_taken)
        .bind(evening_taken)
        .fetch_one(db)
        .await?;
        Ok(dose)
    }
}
