use axum::Router;

use crate::state::AppState;

pub mod dto;
pub mod handlers;
pub mod service;
pub mod streaks;

pub fn router() -> Router<AppState> {
    handlers::routes()
}
