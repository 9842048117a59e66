//! Metadata catalog abstraction
//!
//! Every title shown to users is described by a remote catalog (TMDB in
//! production). The discovery engine only relies on this trait, so the catalog
//! can be swapped for a fake in tests.

use chrono::NaiveDate;

use crate::{
    error::AppResult,
    models::{Actor, Genre, Movie, Paginated, Person, Studio, TvEpisode, TvShow},
};

pub mod tmdb;

pub use tmdb::TmdbGateway;

/// Trait for remote metadata catalogs
///
/// Lookups of an unknown id fail with `AppError::NotFound`; every other
/// failure is an upstream error. Paginated listings keep the catalog's own
/// ordering and totals.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogGateway: Send + Sync {
    /// Full movie record, with cast and crew
    async fn get_movie(&self, id: i64) -> AppResult<Movie>;

    /// Movie record without credits, enough for listings
    async fn get_movie_short(&self, id: i64) -> AppResult<Movie>;

    async fn get_show(&self, id: i64) -> AppResult<TvShow>;

    async fn get_show_short(&self, id: i64) -> AppResult<TvShow>;

    async fn get_episode(&self, show_id: i64, season: i32, number: i32) -> AppResult<TvEpisode>;

    /// Every episode of one season, in episode order
    async fn season_episodes(&self, show_id: i64, season: i32) -> AppResult<Vec<TvEpisode>>;

    async fn search_movies(&self, query: &str, page: u32) -> AppResult<Paginated<Movie>>;

    async fn search_shows(&self, query: &str, page: u32) -> AppResult<Paginated<TvShow>>;

    async fn popular_movies(&self, page: u32) -> AppResult<Paginated<Movie>>;

    async fn popular_shows(&self, page: u32) -> AppResult<Paginated<TvShow>>;

    /// Movies currently in theaters
    async fn recent_movies(&self) -> AppResult<Vec<Movie>>;

    /// Shows currently airing
    async fn recent_shows(&self) -> AppResult<Vec<TvShow>>;

    async fn movies_by_genre(&self, genre_id: i64, page: u32) -> AppResult<Paginated<Movie>>;

    async fn shows_by_genre(&self, genre_id: i64, page: u32) -> AppResult<Paginated<TvShow>>;

    async fn movies_by_actor(&self, actor_id: i64, page: u32) -> AppResult<Paginated<Movie>>;

    async fn shows_by_actor(&self, actor_id: i64, page: u32) -> AppResult<Paginated<TvShow>>;

    async fn movies_by_director(&self, director_id: i64, page: u32)
        -> AppResult<Paginated<Movie>>;

    async fn movies_by_studio(&self, studio_id: i64, page: u32) -> AppResult<Paginated<Movie>>;

    async fn shows_by_network(&self, network_id: i64, page: u32) -> AppResult<Paginated<TvShow>>;

    async fn search_actors(&self, query: &str, page: u32) -> AppResult<Paginated<Person>>;

    async fn movie_genres(&self) -> AppResult<Vec<Genre>>;

    async fn show_genres(&self) -> AppResult<Vec<Genre>>;

    async fn get_studio(&self, id: i64) -> AppResult<Studio>;

    async fn get_network(&self, id: i64) -> AppResult<Studio>;

    async fn get_actor(&self, id: i64) -> AppResult<Actor>;

    async fn movie_recommendations(&self, movie_id: i64) -> AppResult<Vec<Movie>>;

    async fn show_recommendations(&self, show_id: i64) -> AppResult<Vec<TvShow>>;

    /// Movies among `ids` released in `[start, end)`
    async fn movie_releases(
        &self,
        ids: &[i64],
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<Vec<Movie>>;

    /// Episodes of the shows in `ids` airing in `[start, end)`, with the shows
    /// they belong to
    async fn show_releases(
        &self,
        ids: &[i64],
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<(Vec<TvEpisode>, Vec<TvShow>)>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

/// True when an ISO `YYYY-MM-DD` date falls in `[start, end)`.
///
/// Missing or malformed dates are never in a window.
pub fn released_in(date: &str, start: NaiveDate, end: NaiveDate) -> bool {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|d| d >= start && d < end)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_released_in_window_bounds() {
        let start = day(2024, 3, 1);
        let end = day(2024, 4, 1);
        assert!(released_in("2024-03-01", start, end));
        assert!(released_in("2024-03-31", start, end));
        assert!(!released_in("2024-04-01", start, end));
        assert!(!released_in("2024-02-29", start, end));
    }

    #[test]
    fn test_released_in_rejects_unknown_dates() {
        let start = day(2024, 3, 1);
        let end = day(2024, 4, 1);
        assert!(!released_in("", start, end));
        assert!(!released_in("March 2024", start, end));
    }
}
