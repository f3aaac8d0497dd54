use axum::{
    extract::State,
    http::StatusCode,
    routing::{post, put},
    Json, Router,
};
use time::Date;
use tracing::{error, info, instrument};

use crate::auth::AuthUser;
use crate::dates::{format_date, parse_date};
use crate::state::AppState;
use crate::tracking::dto::{
    CompleteWorkoutRequest, SleepRequest, SleepResponse, StartWorkoutRequest, SupplementRequest,
    SupplementResponse, ToggleMealRequest, ToggleMealResponse, WorkoutResponse,
};
use crate::tracking::repo::{
    MealCompletion, SleepRecord, SupplementDose, TrackingError, WorkoutSession,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/tracking/meals/toggle", post(toggle_meal))
        .route("/tracking/workouts/start", post(start_workout))
        .route("/tracking/workouts/complete", post(complete_workout))
        .route("/tracking/sleep", put(upsert_sleep))
        .route("/tracking/supplements", put(upsert_supplements))
}

fn bad_date() -> (StatusCode, String) {
    (
        StatusCode::BAD_REQUEST,
        "Invalid date, expected YYYY-MM-DD".to_string(),
    )
}

fn parse_req_date(s: &str) -> Result<Date, (StatusCode, String)> {
    parse_date(s).map_err(|_| bad_date())
}

fn tracking_error(e: TrackingError) -> (StatusCode, String) {
    match e {
        TrackingError::WorkoutAlreadyCompleted => (StatusCode::CONFLICT, e.to_string()),
        TrackingError::WorkoutNotStarted => (StatusCode::NOT_FOUND, e.to_string()),
        TrackingError::Db(err) => {
            error!(error = %err, "tracking query failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Something went wrong, try again".to_string(),
            )
        }
    }
}

#[instrument(skip(state))]
pub async fn toggle_meal(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<ToggleMealRequest>,
) -> Result<Json<ToggleMealResponse>, (StatusCode, String)> {
    let date = parse_req_date(&body.date)?;
    if !(1..=5).contains(&body.meal_number) {
        return Err((
            StatusCode::BAD_REQUEST,
            "meal_number must be between 1 and 5".into(),
        ));
    }

    let completed = MealCompletion::toggle(&state.db, user_id, date, body.meal_number)
        .await
        .map_err(tracking_error)?;

    info!(user_id = %user_id, date = %body.date, meal_number = body.meal_number, completed, "meal toggled");
    Ok(Json(ToggleMealResponse {
        date: format_date(date),
        meal_number: body.meal_number,
        completed,
    }))
}

#[instrument(skip(state, body))]
pub async fn start_workout(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<StartWorkoutRequest>,
) -> Result<(StatusCode, Json<WorkoutResponse>), (StatusCode, String)> {
    let date = parse_req_date(&body.date)?;
    if !(1..=7).contains(&body.day_of_week) {
        return Err((
            StatusCode::BAD_REQUEST,
            "day_of_week must be between 1 (Mon) and 7 (Sun)".into(),
        ));
    }
    if body.name.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "name must be non-empty".into()));
    }

    let session = WorkoutSession::start(
        &state.db,
        user_id,
        date,
        body.day_of_week,
        body.name.trim(),
        body.target_duration_minutes,
    )
    .await
    .map_err(tracking_error)?;

    info!(user_id = %user_id, date = %body.date, name = %session.name, "workout started");
    Ok((StatusCode::CREATED, Json(session.into())))
}

#[instrument(skip(state))]
pub async fn complete_workout(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<CompleteWorkoutRequest>,
) -> Result<Json<WorkoutResponse>, (StatusCode, String)> {
    let date = parse_req_date(&body.date)?;

    let session =
        WorkoutSession::complete(&state.db, user_id, date, body.actual_duration_minutes)
            .await
            .map_err(tracking_error)?;

    info!(user_id = %user_id, date = %body.date, "workout completed");
    Ok(Json(session.into()))
}

#[instrument(skip(state, body))]
pub async fn upsert_sleep(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<SleepRequest>,
) -> Result<Json<SleepResponse>, (StatusCode, String)> {
    let date = parse_req_date(&body.date)?;
    if !(1..=5).contains(&body.quality_rating) {
        return Err((
            StatusCode::BAD_REQUEST,
            "quality_rating must be between 1 and 5".into(),
        ));
    }
    if !(0.0..=24.0).contains(&body.hours_slept) {
        return Err((
            StatusCode::BAD_REQUEST,
            "hours_slept must be between 0 and 24".into(),
        ));
    }

    let record = SleepRecord::upsert(
        &state.db,
        user_id,
        date,
        body.hours_slept,
        body.quality_rating,
        body.feeling.as_deref(),
        body.notes.as_deref(),
    )
    .await
    .map_err(tracking_error)?;

    info!(user_id = %user_id, date = %body.date, "sleep recorded");
    Ok(Json(record.into()))
}

#[instrument(skip(state))]
pub async fn upsert_supplements(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<SupplementRequest>,
) -> Result<Json<SupplementResponse>, (StatusCode, String)> {
    let date = parse_req_date(&body.date)?;

    let dose = SupplementDose::upsert(
        &state.db,
        user_id,
        date,
        body.morning_taken,
        body.evening_taken,
    )
    .await
    .map_err(tracking_error)?;

    info!(user_id = %user_id, date = %body.date, "supplement doses recorded");
    Ok(Json(dose.into()))
}
