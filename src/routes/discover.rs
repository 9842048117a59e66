use axum::{
    extract::{Path, Query, State},
    routing::get,
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use super::{parse_id, positive_id, AppState, ListResponse, ListingQuery, PageResponse};
use crate::{
    error::AppResult,
    middleware::request_id::RequestId,
    models::{Movie, Paginated, Person, TitleKind, TvShow},
    services::DiscoveryStrategy,
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/movie", movie_routes())
        .nest("/tv", show_routes())
        .route("/actor/search", get(search_actors))
}

fn movie_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/search", get(search_movies))
        .route("/popular", get(popular_movies))
        .route("/recent", get(recent_movies))
        .route("/genre", get(movies_by_genre))
        .route("/actor", get(movies_by_actor))
        .route("/director", get(movies_by_director))
        .route("/studio", get(movies_by_studio))
        .route("/recommendations/:id", get(movie_recommendations))
        .route("/comments", get(most_commented))
        .layer(Extension(TitleKind::Movie))
}

fn show_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/search", get(search_shows))
        .route("/popular", get(popular_shows))
        .route("/recent", get(recent_shows))
        .route("/genre", get(shows_by_genre))
        .route("/actor", get(shows_by_actor))
        .route("/network", get(shows_by_network))
        .route("/recommendations/:id", get(show_recommendations))
        .route("/comments", get(most_commented))
        .layer(Extension(TitleKind::TvShow))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    query: String,
    #[serde(flatten)]
    listing: ListingQuery,
}

/// Listing filtered by one catalog id (genre, person, company...)
#[derive(Debug, Deserialize)]
pub struct ByIdQuery {
    id: Option<String>,
    #[serde(flatten)]
    listing: ListingQuery,
}

impl ByIdQuery {
    fn id(&self) -> AppResult<i64> {
        parse_id(self.id.as_deref(), "id")
    }
}

fn strategy(listing: &ListingQuery) -> DiscoveryStrategy {
    DiscoveryStrategy::from_available_flag(listing.available())
}

pub async fn search_movies(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<PageResponse<Movie>>> {
    tracing::info!(
        request_id = %request_id,
        query = %params.query,
        page = params.listing.page(),
        available = params.listing.available(),
        "Searching movies"
    );
    let page = state
        .discovery
        .search_movies(&params.query, params.listing.page(), strategy(&params.listing))
        .await?;
    Ok(Json(page.into()))
}

pub async fn search_shows(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<PageResponse<TvShow>>> {
    tracing::info!(
        request_id = %request_id,
        query = %params.query,
        page = params.listing.page(),
        available = params.listing.available(),
        "Searching shows"
    );
    let page = state
        .discovery
        .search_shows(&params.query, params.listing.page(), strategy(&params.listing))
        .await?;
    Ok(Json(page.into()))
}

pub async fn search_actors(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<Paginated<Person>>> {
    tracing::info!(
        request_id = %request_id,
        query = %params.query,
        page = params.listing.page(),
        "Searching actors"
    );
    let people = state
        .discovery
        .search_actors(&params.query, params.listing.page())
        .await?;
    Ok(Json(people))
}

pub async fn popular_movies(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListingQuery>,
) -> AppResult<Json<PageResponse<Movie>>> {
    let page = state
        .discovery
        .popular_movies(params.page(), strategy(&params))
        .await?;
    Ok(Json(page.into()))
}

pub async fn popular_shows(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListingQuery>,
) -> AppResult<Json<PageResponse<TvShow>>> {
    let page = state
        .discovery
        .popular_shows(params.page(), strategy(&params))
        .await?;
    Ok(Json(page.into()))
}

pub async fn recent_movies(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListingQuery>,
) -> AppResult<Json<ListResponse<Movie>>> {
    let list = state.discovery.recent_movies(strategy(&params)).await?;
    Ok(Json(list.into()))
}

pub async fn recent_shows(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListingQuery>,
) -> AppResult<Json<ListResponse<TvShow>>> {
    let list = state.discovery.recent_shows(strategy(&params)).await?;
    Ok(Json(list.into()))
}

pub async fn movies_by_genre(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ByIdQuery>,
) -> AppResult<Json<PageResponse<Movie>>> {
    let page = state
        .discovery
        .movies_by_genre(params.id()?, params.listing.page(), strategy(&params.listing))
        .await?;
    Ok(Json(page.into()))
}

pub async fn shows_by_genre(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ByIdQuery>,
) -> AppResult<Json<PageResponse<TvShow>>> {
    let page = state
        .discovery
        .shows_by_genre(params.id()?, params.listing.page(), strategy(&params.listing))
        .await?;
    Ok(Json(page.into()))
}

pub async fn movies_by_actor(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ByIdQuery>,
) -> AppResult<Json<PageResponse<Movie>>> {
    let page = state
        .discovery
        .movies_by_actor(params.id()?, params.listing.page())
        .await?;
    Ok(Json(page.into()))
}

pub async fn shows_by_actor(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ByIdQuery>,
) -> AppResult<Json<PageResponse<TvShow>>> {
    let page = state
        .discovery
        .shows_by_actor(params.id()?, params.listing.page())
        .await?;
    Ok(Json(page.into()))
}

pub async fn movies_by_director(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ByIdQuery>,
) -> AppResult<Json<PageResponse<Movie>>> {
    let page = state
        .discovery
        .movies_by_director(params.id()?, params.listing.page())
        .await?;
    Ok(Json(page.into()))
}

pub async fn movies_by_studio(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ByIdQuery>,
) -> AppResult<Json<PageResponse<Movie>>> {
    let page = state
        .discovery
        .movies_by_studio(params.id()?, params.listing.page())
        .await?;
    Ok(Json(page.into()))
}

pub async fn shows_by_network(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ByIdQuery>,
) -> AppResult<Json<PageResponse<TvShow>>> {
    let page = state
        .discovery
        .shows_by_network(params.id()?, params.listing.page())
        .await?;
    Ok(Json(page.into()))
}

pub async fn movie_recommendations(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> AppResult<Json<ListResponse<Movie>>> {
    let list = state
        .discovery
        .movie_recommendations(positive_id(id)?)
        .await?;
    Ok(Json(list.into()))
}

pub async fn show_recommendations(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> AppResult<Json<ListResponse<TvShow>>> {
    let list = state
        .discovery
        .show_recommendations(positive_id(id)?)
        .await?;
    Ok(Json(list.into()))
}

/// Ids of the most commented titles of the route's kind
pub async fn most_commented(
    State(state): State<Arc<AppState>>,
    Extension(kind): Extension<TitleKind>,
    Query(params): Query<ListingQuery>,
) -> AppResult<Json<Vec<i64>>> {
    let ids = state
        .discovery
        .most_commented(kind, strategy(&params))
        .await?;
    Ok(Json(ids))
}
