use axum::{
    extract::{Path, Query, State},
    routing::get,
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use super::{parse_ids, positive_id, AppState, ListResponse};
use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::{Actor, Genre, Movie, Studio, TitleKind, TvEpisode, TvShow},
    services::MediaDetails,
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/movie/:id", get(movie))
        .route("/movies", get(movies))
        .route("/tv/:id", get(show))
        .route("/tvshows", get(shows))
        .route("/tv/:id/episodes", get(show_episodes))
        .route("/tv/:id/season/:season", get(season_episodes))
        .route("/tv/:id/season/:season/episode/:episode", get(episode))
        .route("/genres/movie", get(movie_genres))
        .route("/genres/movie/:id", get(movie_genre))
        .route("/genres/tv", get(show_genres))
        .route("/genres/tv/:id", get(show_genre))
        .route("/studio/:id", get(studio))
        .route("/network/:id", get(network))
        .route("/actor/:id", get(actor))
}

/// `?ids=603,550,13`
#[derive(Debug, Deserialize)]
pub struct IdsQuery {
    ids: Option<String>,
}

impl IdsQuery {
    fn ids(&self) -> AppResult<Vec<i64>> {
        parse_ids(self.ids.as_deref(), "ids")
    }
}

pub async fn movie(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> AppResult<Json<MediaDetails<Movie>>> {
    tracing::info!(request_id = %request_id, external_id = id, "Fetching movie details");
    let details = state.media_info.movie_details(positive_id(id)?).await?;
    Ok(Json(details))
}

pub async fn movies(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<IdsQuery>,
) -> AppResult<Json<ListResponse<Movie>>> {
    let ids = params.ids()?;
    tracing::info!(request_id = %request_id, count = ids.len(), "Fetching movies by id");
    let list = state.media_info.movies(&ids).await?;
    Ok(Json(list.into()))
}

pub async fn show(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> AppResult<Json<MediaDetails<TvShow>>> {
    tracing::info!(request_id = %request_id, external_id = id, "Fetching show details");
    let details = state.media_info.show_details(positive_id(id)?).await?;
    Ok(Json(details))
}

pub async fn shows(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<IdsQuery>,
) -> AppResult<Json<ListResponse<TvShow>>> {
    let ids = params.ids()?;
    tracing::info!(request_id = %request_id, count = ids.len(), "Fetching shows by id");
    let list = state.media_info.shows(&ids).await?;
    Ok(Json(list.into()))
}

pub async fn show_episodes(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> AppResult<Json<ListResponse<TvEpisode>>> {
    let list = state.media_info.show_episodes(positive_id(id)?).await?;
    Ok(Json(list.into()))
}

pub async fn season_episodes(
    State(state): State<Arc<AppState>>,
    Path((id, season)): Path<(i64, i32)>,
) -> AppResult<Json<ListResponse<TvEpisode>>> {
    if season < 0 {
        return Err(AppError::InvalidInput(format!("no season {}", season)));
    }
    let list = state
        .media_info
        .season_episodes(positive_id(id)?, season)
        .await?;
    Ok(Json(list.into()))
}

pub async fn episode(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Path((id, season, number)): Path<(i64, i32, i32)>,
) -> AppResult<Json<MediaDetails<TvEpisode>>> {
    tracing::info!(
        request_id = %request_id,
        external_id = id,
        season,
        episode = number,
        "Fetching episode details"
    );
    if season < 0 || number <= 0 {
        return Err(AppError::InvalidInput(format!(
            "no episode {} in season {}",
            number, season
        )));
    }
    let details = state
        .media_info
        .episode_details(positive_id(id)?, season, number)
        .await?;
    Ok(Json(details))
}

pub async fn movie_genres(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<Genre>>> {
    Ok(Json(state.assets.genres(TitleKind::Movie).await?))
}

pub async fn movie_genre(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> AppResult<Json<Genre>> {
    Ok(Json(state.assets.genre(TitleKind::Movie, id).await?))
}

pub async fn show_genres(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<Genre>>> {
    Ok(Json(state.assets.genres(TitleKind::TvShow).await?))
}

pub async fn show_genre(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> AppResult<Json<Genre>> {
    Ok(Json(state.assets.genre(TitleKind::TvShow, id).await?))
}

pub async fn studio(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> AppResult<Json<Studio>> {
    Ok(Json(state.assets.studio(positive_id(id)?).await?))
}

pub async fn network(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> AppResult<Json<Studio>> {
    Ok(Json(state.assets.network(positive_id(id)?).await?))
}

pub async fn actor(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> AppResult<Json<Actor>> {
    Ok(Json(state.assets.actor(positive_id(id)?).await?))
}
