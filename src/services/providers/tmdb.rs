/// TMDB catalog gateway
///
/// Title lookups go through the Redis cache; listings always hit the API since
/// their contents move with popularity.
///
/// API Flow:
/// 1. Details: /movie/{id}, /tv/{id} (`append_to_response=credits` for full records)
/// 2. Listings: /search, /popular, /discover with `with_*` filters
/// 3. Releases: per followed title, then the relevant seasons of followed shows
/// 4. Assets: /genre/{movie,tv}/list, /company/{id}, /network/{id}, /person/{id}
use crate::{
    cached,
    db::{
        redis::cache::{ASSET_CACHE_TTL, TITLE_CACHE_TTL},
        Cache, CacheKey,
    },
    error::{AppError, AppResult},
    models::{
        tmdb::{
            TmdbCompany, TmdbEpisode, TmdbGenreList, TmdbMovie, TmdbPage, TmdbPerson,
            TmdbPersonResult, TmdbPersonTvCredits, TmdbSeason, TmdbShow,
        },
        Actor, Genre, Movie, Paginated, Person, Studio, TvEpisode, TvShow, PAGE_SIZE,
    },
    services::providers::{released_in, CatalogGateway},
};
use chrono::NaiveDate;
use reqwest::{Client as HttpClient, StatusCode};
use serde::de::DeserializeOwned;
use std::collections::BTreeSet;

#[derive(Clone)]
pub struct TmdbGateway {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    language: String,
    cache: Cache,
}

impl TmdbGateway {
    pub fn new(cache: Cache, api_key: String, api_url: String, language: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            language,
            cache,
        }
    }

    /// GETs a TMDB path and decodes the JSON body. 404 becomes `NotFound`.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> AppResult<T> {
        let url = format!("{}{}", self.api_url, path);

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("language", self.language.as_str()),
            ])
            .query(params)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(format!("TMDB resource {}", path)));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(path = %path, status = %status, body = %body, "TMDB request failed");
            return Err(AppError::ExternalApi(format!(
                "TMDB API returned status {}: {}",
                status, body
            )));
        }

        Ok(response.json().await?)
    }

    async fn fetch_movie(&self, id: i64, with_credits: bool) -> AppResult<Movie> {
        let params = credits_param(with_credits);
        let raw: TmdbMovie = self.get_json(&format!("/movie/{}", id), &params).await?;
        Ok(raw.into())
    }

    async fn fetch_show(&self, id: i64, with_credits: bool) -> AppResult<TvShow> {
        let params = credits_param(with_credits);
        let raw: TmdbShow = self.get_json(&format!("/tv/{}", id), &params).await?;
        Ok(raw.into())
    }

    async fn movie_page(
        &self,
        path: &str,
        params: Vec<(&str, String)>,
    ) -> AppResult<Paginated<Movie>> {
        let page: TmdbPage<TmdbMovie> = self.get_json(path, &params).await?;
        Ok(page.into_paginated())
    }

    async fn show_page(
        &self,
        path: &str,
        params: Vec<(&str, String)>,
    ) -> AppResult<Paginated<TvShow>> {
        let page: TmdbPage<TmdbShow> = self.get_json(path, &params).await?;
        Ok(page.into_paginated())
    }

    async fn genre_list(&self, path: &str) -> AppResult<Vec<Genre>> {
        let raw: TmdbGenreList = self.get_json(path, &[]).await?;
        Ok(raw.genres.into_iter().map(Genre::from).collect())
    }

    async fn company(&self, path: String) -> AppResult<Studio> {
        let raw: TmdbCompany = self.get_json(&path, &[]).await?;
        Ok(raw.into())
    }
}

fn credits_param(with_credits: bool) -> Vec<(&'static str, String)> {
    if with_credits {
        vec![("append_to_response", "credits".to_string())]
    } else {
        Vec::new()
    }
}

fn discover_params(filter: &'static str, id: i64, page: u32) -> Vec<(&'static str, String)> {
    vec![
        (filter, id.to_string()),
        ("page", page.to_string()),
        ("sort_by", "popularity.desc".to_string()),
    ]
}

/// Slices an unpaginated list into fixed-size pages
fn paginate_locally<T>(items: Vec<T>, page: u32) -> Paginated<T> {
    let total = items.len() as u64;
    let start = (page.max(1) as usize - 1).saturating_mul(PAGE_SIZE as usize);
    let results = items
        .into_iter()
        .skip(start)
        .take(PAGE_SIZE as usize)
        .collect();
    Paginated {
        results,
        total_result_count: total,
        total_page_count: crate::models::total_pages(total, PAGE_SIZE),
    }
}

/// Seasons worth scanning for upcoming or recent episodes: the latest one and
/// the one holding the next episode.
fn release_seasons(show: &TvShow) -> BTreeSet<i32> {
    let mut seasons = BTreeSet::new();
    if show.seasons_count > 0 {
        seasons.insert(show.seasons_count);
    }
    if let Some(next) = &show.next_episode {
        seasons.insert(next.season_number);
    }
    seasons
}

#[async_trait::async_trait]
impl CatalogGateway for TmdbGateway {
    async fn get_movie(&self, id: i64) -> AppResult<Movie> {
        cached!(self.cache, CacheKey::Movie(id), TITLE_CACHE_TTL, async move {
            self.fetch_movie(id, true).await
        })
    }

    async fn get_movie_short(&self, id: i64) -> AppResult<Movie> {
        cached!(self.cache, CacheKey::MovieShort(id), TITLE_CACHE_TTL, async move {
            self.fetch_movie(id, false).await
        })
    }

    async fn get_show(&self, id: i64) -> AppResult<TvShow> {
        cached!(self.cache, CacheKey::Show(id), TITLE_CACHE_TTL, async move {
            self.fetch_show(id, true).await
        })
    }

    async fn get_show_short(&self, id: i64) -> AppResult<TvShow> {
        cached!(self.cache, CacheKey::ShowShort(id), TITLE_CACHE_TTL, async move {
            self.fetch_show(id, false).await
        })
    }

    async fn get_episode(&self, show_id: i64, season: i32, number: i32) -> AppResult<TvEpisode> {
        cached!(
            self.cache,
            CacheKey::Episode {
                show_id,
                season,
                number
            },
            TITLE_CACHE_TTL,
            async move {
                let raw: TmdbEpisode = self
                    .get_json(
                        &format!("/tv/{}/season/{}/episode/{}", show_id, season, number),
                        &[],
                    )
                    .await?;
                Ok::<_, AppError>(raw.into_episode(show_id))
            }
        )
    }

    async fn season_episodes(&self, show_id: i64, season: i32) -> AppResult<Vec<TvEpisode>> {
        cached!(
            self.cache,
            CacheKey::Season { show_id, season },
            TITLE_CACHE_TTL,
            async move {
                let raw: TmdbSeason = self
                    .get_json(&format!("/tv/{}/season/{}", show_id, season), &[])
                    .await?;
                Ok::<_, AppError>(
                    raw.episodes
                        .into_iter()
                        .map(|episode| episode.into_episode(show_id))
                        .collect::<Vec<_>>(),
                )
            }
        )
    }

    async fn search_movies(&self, query: &str, page: u32) -> AppResult<Paginated<Movie>> {
        if query.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Search query cannot be empty".to_string(),
            ));
        }
        let params = vec![("query", query.to_string()), ("page", page.to_string())];
        let results = self.movie_page("/search/movie", params).await?;

        tracing::info!(
            query = %query,
            page,
            result_count = results.results.len(),
            "TMDB movie search"
        );

        Ok(results)
    }

    async fn search_shows(&self, query: &str, page: u32) -> AppResult<Paginated<TvShow>> {
        if query.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Search query cannot be empty".to_string(),
            ));
        }
        let params = vec![("query", query.to_string()), ("page", page.to_string())];
        let results = self.show_page("/search/tv", params).await?;

        tracing::info!(
            query = %query,
            page,
            result_count = results.results.len(),
            "TMDB show search"
        );

        Ok(results)
    }

    async fn popular_movies(&self, page: u32) -> AppResult<Paginated<Movie>> {
        self.movie_page("/movie/popular", vec![("page", page.to_string())])
            .await
    }

    async fn popular_shows(&self, page: u32) -> AppResult<Paginated<TvShow>> {
        self.show_page("/tv/popular", vec![("page", page.to_string())])
            .await
    }

    async fn recent_movies(&self) -> AppResult<Vec<Movie>> {
        let page = self.movie_page("/movie/now_playing", Vec::new()).await?;
        Ok(page.results)
    }

    async fn recent_shows(&self) -> AppResult<Vec<TvShow>> {
        let page = self.show_page("/tv/on_the_air", Vec::new()).await?;
        Ok(page.results)
    }

    async fn movies_by_genre(&self, genre_id: i64, page: u32) -> AppResult<Paginated<Movie>> {
        self.movie_page("/discover/movie", discover_params("with_genres", genre_id, page))
            .await
    }

    async fn shows_by_genre(&self, genre_id: i64, page: u32) -> AppResult<Paginated<TvShow>> {
        self.show_page("/discover/tv", discover_params("with_genres", genre_id, page))
            .await
    }

    async fn movies_by_actor(&self, actor_id: i64, page: u32) -> AppResult<Paginated<Movie>> {
        self.movie_page("/discover/movie", discover_params("with_cast", actor_id, page))
            .await
    }

    async fn shows_by_actor(&self, actor_id: i64, page: u32) -> AppResult<Paginated<TvShow>> {
        // TV discovery has no cast filter
        let credits: TmdbPersonTvCredits = self
            .get_json(&format!("/person/{}/tv_credits", actor_id), &[])
            .await?;
        let shows = credits.cast.into_iter().map(TvShow::from).collect();
        Ok(paginate_locally(shows, page))
    }

    async fn movies_by_director(
        &self,
        director_id: i64,
        page: u32,
    ) -> AppResult<Paginated<Movie>> {
        self.movie_page("/discover/movie", discover_params("with_crew", director_id, page))
            .await
    }

    async fn movies_by_studio(&self, studio_id: i64, page: u32) -> AppResult<Paginated<Movie>> {
        self.movie_page(
            "/discover/movie",
            discover_params("with_companies", studio_id, page),
        )
        .await
    }

    async fn shows_by_network(&self, network_id: i64, page: u32) -> AppResult<Paginated<TvShow>> {
        self.show_page("/discover/tv", discover_params("with_networks", network_id, page))
            .await
    }

    async fn search_actors(&self, query: &str, page: u32) -> AppResult<Paginated<Person>> {
        if query.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Search query cannot be empty".to_string(),
            ));
        }
        let params = vec![("query", query.to_string()), ("page", page.to_string())];
        let results: TmdbPage<TmdbPersonResult> =
            self.get_json("/search/person", &params).await?;

        tracing::info!(
            query = %query,
            page,
            result_count = results.results.len(),
            "TMDB person search"
        );

        Ok(results.into_paginated())
    }

    async fn movie_genres(&self) -> AppResult<Vec<Genre>> {
        cached!(self.cache, CacheKey::MovieGenres, ASSET_CACHE_TTL, async move {
            self.genre_list("/genre/movie/list").await
        })
    }

    async fn show_genres(&self) -> AppResult<Vec<Genre>> {
        cached!(self.cache, CacheKey::ShowGenres, ASSET_CACHE_TTL, async move {
            self.genre_list("/genre/tv/list").await
        })
    }

    async fn get_studio(&self, id: i64) -> AppResult<Studio> {
        cached!(self.cache, CacheKey::Studio(id), ASSET_CACHE_TTL, async move {
            self.company(format!("/company/{}", id)).await
        })
    }

    async fn get_network(&self, id: i64) -> AppResult<Studio> {
        cached!(self.cache, CacheKey::Network(id), ASSET_CACHE_TTL, async move {
            self.company(format!("/network/{}", id)).await
        })
    }

    async fn get_actor(&self, id: i64) -> AppResult<Actor> {
        cached!(self.cache, CacheKey::Actor(id), ASSET_CACHE_TTL, async move {
            let raw: TmdbPerson = self.get_json(&format!("/person/{}", id), &[]).await?;
            Ok::<_, AppError>(Actor::from(raw))
        })
    }

    async fn movie_recommendations(&self, movie_id: i64) -> AppResult<Vec<Movie>> {
        let page = self
            .movie_page(&format!("/movie/{}/recommendations", movie_id), Vec::new())
            .await?;
        Ok(page.results)
    }

    async fn show_recommendations(&self, show_id: i64) -> AppResult<Vec<TvShow>> {
        let page = self
            .show_page(&format!("/tv/{}/recommendations", show_id), Vec::new())
            .await?;
        Ok(page.results)
    }

    async fn movie_releases(
        &self,
        ids: &[i64],
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<Vec<Movie>> {
        let mut releases = Vec::new();
        for &id in ids {
            match self.get_movie_short(id).await {
                Ok(movie) if released_in(&movie.release_date, start, end) => releases.push(movie),
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(external_id = id, error = %e, "Skipping followed movie");
                }
            }
        }
        Ok(releases)
    }

    async fn show_releases(
        &self,
        ids: &[i64],
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<(Vec<TvEpisode>, Vec<TvShow>)> {
        let mut episodes = Vec::new();
        let mut shows = Vec::new();

        for &id in ids {
            let show = match self.get_show_short(id).await {
                Ok(show) => show,
                Err(e) => {
                    tracing::warn!(external_id = id, error = %e, "Skipping followed show");
                    continue;
                }
            };

            let mut airing = Vec::new();
            for season in release_seasons(&show) {
                match self.season_episodes(id, season).await {
                    Ok(season_episodes) => airing.extend(
                        season_episodes
                            .into_iter()
                            .filter(|e| released_in(&e.air_date, start, end)),
                    ),
                    Err(e) => {
                        tracing::warn!(external_id = id, season, error = %e, "Skipping season");
                    }
                }
            }

            if !airing.is_empty() {
                episodes.extend(airing);
                shows.push(show);
            }
        }

        Ok((episodes, shows))
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}
