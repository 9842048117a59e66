use axum::{
    extract::{Query, State},
    routing::get,
    Extension, Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{AppState, ListResponse};
use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::{Caller, Movie, TvEpisode, TvShow},
    services::CalendarWindow,
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/movies", get(movies))
        .route("/tvshows", get(shows))
}

#[derive(Debug, Default, Deserialize)]
pub struct MonthQuery {
    month: Option<u32>,
    year: Option<i32>,
}

impl MonthQuery {
    /// The requested month, or the current one when neither field is given
    fn window(&self, state: &AppState) -> AppResult<CalendarWindow> {
        match (self.year, self.month) {
            (Some(year), Some(month)) => CalendarWindow::month(year, month, state.calendar_offset),
            (None, None) => CalendarWindow::current_month(Utc::now(), state.calendar_offset),
            _ => Err(AppError::InvalidInput(
                "month and year must be given together".to_string(),
            )),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ShowCalendarResponse {
    pub results: Vec<TvEpisode>,
    pub presence: Vec<bool>,
    pub shows: Vec<TvShow>,
}

pub async fn movies(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    caller: Caller,
    Query(params): Query<MonthQuery>,
) -> AppResult<Json<ListResponse<Movie>>> {
    let window = params.window(&state)?;
    tracing::info!(
        request_id = %request_id,
        user_id = %caller.user_id,
        start = %window.start,
        "Fetching movie calendar"
    );

    let movies = state.calendar.movies(&caller.user_id, window).await?;
    Ok(Json(movies.into()))
}

pub async fn shows(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    caller: Caller,
    Query(params): Query<MonthQuery>,
) -> AppResult<Json<ShowCalendarResponse>> {
    let window = params.window(&state)?;
    tracing::info!(
        request_id = %request_id,
        user_id = %caller.user_id,
        start = %window.start,
        "Fetching show calendar"
    );

    let calendar = state.calendar.shows(&caller.user_id, window).await?;
    let (results, presence) = calendar.episodes.into_parts();
    Ok(Json(ShowCalendarResponse {
        results,
        presence,
        shows: calendar.shows,
    }))
}
