use serde::Serialize;
use time::OffsetDateTime;

/// How many of the four daily tasks are done for one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyCompletion {
    pub completed: u32,
    pub total: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Completed,
    Incomplete,
}

impl TaskStatus {
    pub fn from_done(done: bool) -> Self {
        if done {
            TaskStatus::Completed
        } else {
            TaskStatus::Incomplete
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MealTask {
    pub status: TaskStatus,
    pub completed_numbers: Vec<i16>,
    /// Display denominator, distinct from the completion threshold of 3.
    pub total: i16,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkoutTask {
    pub status: TaskStatus,
    pub name: Option<String>,
    pub actual_duration_minutes: Option<i32>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub finished_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SleepTask {
    pub status: TaskStatus,
    pub hours_slept: Option<f64>,
    pub quality_rating: Option<i16>,
    pub feeling: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SupplementTask {
    pub status: TaskStatus,
    pub morning_taken: bool,
    pub evening_taken: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DayTasks {
    pub meals: MealTask,
    pub workout: WorkoutTask,
    pub sleep: SleepTask,
    pub supplements: SupplementTask,
}

/// Per-task detail for a single day plus the same overall tally as the daily
/// completion summary.
#[derive(Debug, Clone, Serialize)]
pub struct DayDetail {
    pub date: String,
    pub completed_tasks: u32,
    pub total_tasks: u32,
    pub tasks: DayTasks,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StreakResult {
    pub current_streak: u32,
    pub longest_streak: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgramStats {
    pub meals_completed: i64,
    pub workouts_completed: i64,
    pub average_sleep_hours: f64,
    /// Integer percentage of taken doses over possible doses in the window.
    pub supplement_compliance: i64,
    pub days_in_program: i64,
    pub period_days: u32,
}
