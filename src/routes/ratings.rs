use axum::{
    extract::{Path, Query, State},
    routing::get,
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use super::{
    comments::{CountQuery, CountResponse, PageQuery},
    parse_page, positive_id, AppState,
};
use crate::{
    error::AppResult,
    middleware::request_id::RequestId,
    models::{Caller, Paginated, Rating, TitleKind},
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/count", get(count))
        .nest("/movie", kind_routes(TitleKind::Movie))
        .nest("/tv", kind_routes(TitleKind::TvShow))
}

fn kind_routes(kind: TitleKind) -> Router<Arc<AppState>> {
    Router::new()
        .route("/user/:user", get(for_user))
        .route("/:id", get(for_title).post(rate))
        .route("/:id/own", get(own))
        .layer(Extension(kind))
}

#[derive(Debug, Deserialize)]
pub struct RatingBody {
    pub rating: i32,
}

pub async fn for_title(
    State(state): State<Arc<AppState>>,
    Extension(kind): Extension<TitleKind>,
    Path(id): Path<i64>,
    Query(params): Query<PageQuery>,
) -> AppResult<Json<Paginated<Rating>>> {
    let ratings = state
        .ratings
        .for_title(kind, positive_id(id)?, parse_page(params.page.as_deref()))
        .await?;
    Ok(Json(ratings))
}

pub async fn for_user(
    State(state): State<Arc<AppState>>,
    Extension(kind): Extension<TitleKind>,
    Path(user): Path<String>,
    Query(params): Query<PageQuery>,
) -> AppResult<Json<Paginated<Rating>>> {
    let ratings = state
        .ratings
        .for_user(kind, &user, parse_page(params.page.as_deref()))
        .await?;
    Ok(Json(ratings))
}

/// The caller's own rating, zero when they never rated the title
pub async fn own(
    State(state): State<Arc<AppState>>,
    Extension(kind): Extension<TitleKind>,
    caller: Caller,
    Path(id): Path<i64>,
) -> AppResult<Json<Rating>> {
    let rating = state
        .ratings
        .own(kind, &caller.user_id, positive_id(id)?)
        .await?;
    Ok(Json(rating))
}

pub async fn rate(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Extension(kind): Extension<TitleKind>,
    caller: Caller,
    Path(id): Path<i64>,
    Json(body): Json<RatingBody>,
) -> AppResult<Json<Rating>> {
    tracing::info!(
        request_id = %request_id,
        user_id = %caller.user_id,
        kind = %kind,
        media_id = id,
        "Rating title"
    );
    let rating = state
        .ratings
        .rate(kind, &caller.user_id, positive_id(id)?, body.rating)
        .await?;
    Ok(Json(rating))
}

pub async fn count(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CountQuery>,
) -> AppResult<Json<CountResponse>> {
    let count = state.ratings.count(params.user.as_deref()).await?;
    Ok(Json(CountResponse { count }))
}
