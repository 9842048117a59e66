use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use super::{parse_page, positive_id, AppState};
use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::{Caller, Comment, Paginated, TitleKind},
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/count", get(count))
        .nest("/movie", kind_routes(TitleKind::Movie))
        .nest("/tv", kind_routes(TitleKind::TvShow))
}

fn kind_routes(kind: TitleKind) -> Router<Arc<AppState>> {
    Router::new()
        .route("/range", get(in_range))
        .route("/user/:user", get(for_user))
        .route("/entry/:comment", put(update).delete(delete))
        .route("/:id", get(for_title).post(add))
        .layer(Extension(kind))
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CommentBody {
    pub content: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    start: Option<String>,
    end: Option<String>,
    user: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CountQuery {
    pub user: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: u64,
}

pub async fn for_title(
    State(state): State<Arc<AppState>>,
    Extension(kind): Extension<TitleKind>,
    Path(id): Path<i64>,
    Query(params): Query<PageQuery>,
) -> AppResult<Json<Paginated<Comment>>> {
    let comments = state
        .comments
        .for_title(kind, positive_id(id)?, parse_page(params.page.as_deref()))
        .await?;
    Ok(Json(comments))
}

pub async fn for_user(
    State(state): State<Arc<AppState>>,
    Extension(kind): Extension<TitleKind>,
    Path(user): Path<String>,
    Query(params): Query<PageQuery>,
) -> AppResult<Json<Paginated<Comment>>> {
    let comments = state
        .comments
        .for_user(kind, &user, parse_page(params.page.as_deref()))
        .await?;
    Ok(Json(comments))
}

pub async fn add(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Extension(kind): Extension<TitleKind>,
    caller: Caller,
    Path(id): Path<i64>,
    Json(body): Json<CommentBody>,
) -> AppResult<(StatusCode, Json<Comment>)> {
    tracing::info!(
        request_id = %request_id,
        user_id = %caller.user_id,
        kind = %kind,
        media_id = id,
        "Adding comment"
    );
    let comment = state
        .comments
        .add(kind, &caller, positive_id(id)?, &body.content)
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Extension(kind): Extension<TitleKind>,
    caller: Caller,
    Path(comment_id): Path<Uuid>,
    Json(body): Json<CommentBody>,
) -> AppResult<Json<Comment>> {
    tracing::info!(
        request_id = %request_id,
        user_id = %caller.user_id,
        comment_id = %comment_id,
        "Updating comment"
    );
    let comment = state
        .comments
        .update(kind, &caller, comment_id, &body.content)
        .await?;
    Ok(Json(comment))
}

pub async fn delete(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Extension(kind): Extension<TitleKind>,
    caller: Caller,
    Path(comment_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    tracing::info!(
        request_id = %request_id,
        user_id = %caller.user_id,
        comment_id = %comment_id,
        "Deleting comment"
    );
    state.comments.delete(kind, &caller, comment_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn in_range(
    State(state): State<Arc<AppState>>,
    Extension(kind): Extension<TitleKind>,
    Query(params): Query<RangeQuery>,
) -> AppResult<Json<Vec<Comment>>> {
    let (Some(start), Some(end)) = (params.start.as_deref(), params.end.as_deref()) else {
        return Err(AppError::InvalidInput(
            "'start' and 'end' are required".to_string(),
        ));
    };
    let comments = state
        .comments
        .in_range(kind, params.user.as_deref(), start, end)
        .await?;
    Ok(Json(comments))
}

pub async fn count(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CountQuery>,
) -> AppResult<Json<CountResponse>> {
    let count = state.comments.count(params.user.as_deref()).await?;
    Ok(Json(CountResponse { count }))
}
