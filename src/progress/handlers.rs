use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use time::Date;
use tracing::{error, instrument};

use crate::auth::AuthUser;
use crate::dates::parse_date;
use crate::progress::dto::{DailyCompletion, DayDetail, ProgramStats, StreakResult};
use crate::progress::service::ProgressService;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/progress/daily", get(daily))
        .route("/progress/calendar", get(calendar))
        .route("/progress/day/:date", get(day_detail))
        .route("/progress/streaks", get(streaks))
        .route("/progress/stats", get(stats))
}

#[derive(Debug, Deserialize)]
pub struct DailyQuery {
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub as_of: Option<String>,
}

fn bad_date() -> (StatusCode, String) {
    (
        StatusCode::BAD_REQUEST,
        "Invalid date, expected YYYY-MM-DD".to_string(),
    )
}

fn parse_query_date(s: &str) -> Result<Date, (StatusCode, String)> {
    parse_date(s).map_err(|_| bad_date())
}

fn internal<E: std::fmt::Display>(e: E) -> (StatusCode, String) {
    error!(error = %e, "progress aggregation failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Something went wrong, try again".to_string(),
    )
}

#[instrument(skip(svc))]
pub async fn daily(
    State(svc): State<ProgressService>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<DailyQuery>,
) -> Result<Json<DailyCompletion>, (StatusCode, String)> {
    let date = match q.date.as_deref() {
        Some(s) => parse_query_date(s)?,
        None => svc.today(),
    };

    let summary = svc
        .daily_completion(user_id, date)
        .await
        .map_err(internal)?;
    Ok(Json(summary))
}

#[instrument(skip(svc))]
pub async fn calendar(
    State(svc): State<ProgressService>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<CalendarQuery>,
) -> Result<Json<BTreeMap<String, DailyCompletion>>, (StatusCode, String)> {
    let start = parse_query_date(&q.start)?;
    let end = parse_query_date(&q.end)?;

    // An inverted range comes back as an empty map, not an error.
    let days = svc
        .range_completion(user_id, start, end)
        .await
        .map_err(internal)?;
    Ok(Json(days))
}

#[instrument(skip(svc))]
pub async fn day_detail(
    State(svc): State<ProgressService>,
    AuthUser(user_id): AuthUser,
    Path(date): Path<String>,
) -> Result<Json<DayDetail>, (StatusCode, String)> {
    let date = parse_query_date(&date)?;

    let detail = svc.day_detail(user_id, date).await.map_err(internal)?;
    Ok(Json(detail))
}

#[instrument(skip(svc))]
pub async fn streaks(
    State(svc): State<ProgressService>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<StreakResult>, (StatusCode, String)> {
    let res = svc.streaks(user_id).await.map_err(internal)?;
    Ok(Json(res))
}

#[instrument(skip(svc))]
pub async fn stats(
    State(svc): State<ProgressService>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<StatsQuery>,
) -> Result<Json<ProgramStats>, (StatusCode, String)> {
    let as_of = match q.as_of.as_deref() {
        Some(s) => Some(parse_query_date(s)?),
        None => None,
    };

    let stats = svc.stats(user_id, as_of).await.map_err(internal)?;
    Ok(Json(stats))
}
