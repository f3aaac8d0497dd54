use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::dates::format_date;
use crate::tracking::repo::{SleepRecord, SupplementDose, WorkoutSession};

#[derive(Debug, Deserialize)]
pub struct ToggleMealRequest {
    pub date: String,
    pub meal_number: i16,
}

#[derive(Debug, Serialize)]
pub struct ToggleMealResponse {
    pub date: String,
    pub meal_number: i16,
    pub completed: bool,
}

#[derive(Debug, Deserialize)]
pub struct StartWorkoutRequest {
    pub date: String,
    pub day_of_week: i16,
    pub name: String,
    pub target_duration_minutes: i32,
}

#[derive(Debug, Deserialize)]
pub struct CompleteWorkoutRequest {
    pub date: String,
    pub actual_duration_minutes: i32,
}

#[derive(Debug, Serialize)]
pub struct WorkoutResponse {
    pub id: Uuid,
    pub date: String,
    pub day_of_week: i16,
    pub name: String,
    pub target_duration_minutes: i32,
    pub actual_duration_minutes: Option<i32>,
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub finished_at: Option<OffsetDateTime>,
}

impl From<WorkoutSession> for WorkoutResponse {
    fn from(s: WorkoutSession) -> Self {
        Self {
            id: s.id,
            date: format_date(s.date),
            day_of_week: s.day_of_week,
            name: s.name,
            target_duration_minutes: s.target_duration_minutes,
            actual_duration_minutes: s.actual_duration_minutes,
            started_at: s.started_at,
            finished_at: s.finished_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SleepRequest {
    pub date: String,
    pub hours_slept: f64,
    pub quality_rating: i16,
    pub feeling: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SleepResponse {
    pub date: String,
    pub hours_slept: f64,
    pub quality_rating: i16,
    pub feeling: Option<String>,
    pub notes: Option<String>,
}

impl From<SleepRecord> for SleepResponse {
    fn from(r: SleepRecord) -> Self {
        Self {
            date: format_date(r.date),
            hours_slept: r.hours_slept,
            quality_rating: r.quality_rating,
            feeling: r.feeling,
            notes: r.notes,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SupplementRequest {
    pub date: String,
    pub morning_taken: bool,
    pub evening_taken: bool,
}

#[derive(Debug, Serialize)]
pub struct SupplementResponse {
    pub date: String,
    pub morning_taken: bool,
    pub evening_taken: bool,
}

impl From<SupplementDose> for SupplementResponse {
    fn from(d: SupplementDose) -> Self {
        Self {
            date: format_date(d.date),
            morning_taken: d.morning_taken,
            evening_taken: d.evening_taken,
        }
    }
}
