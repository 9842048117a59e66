//! Raw TMDB payloads and their conversion into catalog titles.
//!
//! Listing endpoints and detail endpoints share one shape per title type; fields
//! a given endpoint omits fall back to their defaults.

use serde::Deserialize;

use super::{Actor, Genre, Movie, Paginated, Person, Studio, TvEpisode, TvShow};

pub const IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p/original";

/// Number of cast members kept on a full title
const MAX_ACTORS: usize = 20;

/// Crew jobs kept on a full title
const CREW_JOBS: [&str; 4] = ["Director", "Producer", "Screenplay", "Writer"];

fn image_url(path: Option<String>) -> Option<String> {
    path.filter(|p| !p.is_empty())
        .map(|p| format!("{}{}", IMAGE_BASE_URL, p))
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbPage<T> {
    #[serde(default)]
    pub page: u32,
    pub results: Vec<T>,
    #[serde(default)]
    pub total_pages: u64,
    #[serde(default)]
    pub total_results: u64,
}

impl<T> TmdbPage<T> {
    /// Converts every result, keeping the remote ordering and totals
    pub fn into_paginated<U: From<T>>(self) -> Paginated<U> {
        Paginated {
            results: self.results.into_iter().map(U::from).collect(),
            total_result_count: self.total_results,
            total_page_count: self.total_pages,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbGenre {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbCompany {
    pub id: i64,
    pub name: String,
    pub logo_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbCast {
    pub id: i64,
    pub name: String,
    pub character: Option<String>,
    pub profile_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbCrew {
    pub id: i64,
    pub name: String,
    pub job: Option<String>,
    pub profile_path: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TmdbCredits {
    #[serde(default)]
    pub cast: Vec<TmdbCast>,
    #[serde(default)]
    pub crew: Vec<TmdbCrew>,
}

impl TmdbCredits {
    fn actors(&self) -> Vec<Person> {
        self.cast
            .iter()
            .take(MAX_ACTORS)
            .map(|c| Person {
                id: c.id,
                name: c.name.clone(),
                role: c.character.clone(),
                profile_url: image_url(c.profile_path.clone()),
            })
            .collect()
    }

    fn crew(&self) -> Vec<Person> {
        self.crew
            .iter()
            .filter(|c| {
                c.job
                    .as_deref()
                    .is_some_and(|job| CREW_JOBS.contains(&job))
            })
            .map(|c| Person {
                id: c.id,
                name: c.name.clone(),
                role: c.job.clone(),
                profile_url: image_url(c.profile_path.clone()),
            })
            .collect()
    }
}

impl From<TmdbGenre> for Genre {
    fn from(raw: TmdbGenre) -> Self {
        Genre {
            id: raw.id,
            name: raw.name,
        }
    }
}

/// `/genre/{movie,tv}/list` response
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbGenreList {
    #[serde(default)]
    pub genres: Vec<TmdbGenre>,
}

impl From<TmdbCompany> for Studio {
    fn from(raw: TmdbCompany) -> Self {
        Studio {
            id: raw.id,
            name: raw.name,
            logo_url: image_url(raw.logo_path),
        }
    }
}

fn genres(raw: Vec<TmdbGenre>) -> Vec<Genre> {
    raw.into_iter().map(Genre::from).collect()
}

fn studios(raw: Vec<TmdbCompany>) -> Vec<Studio> {
    raw.into_iter().map(Studio::from).collect()
}

/// `/person/{id}` response
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbPerson {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub biography: String,
    pub profile_path: Option<String>,
}

impl From<TmdbPerson> for Actor {
    fn from(raw: TmdbPerson) -> Self {
        Actor {
            id: raw.id,
            name: raw.name,
            overview: raw.biography,
            profile_url: image_url(raw.profile_path),
        }
    }
}

/// `/search/person` result; the department lands in `role`
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbPersonResult {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    pub known_for_department: Option<String>,
    pub profile_path: Option<String>,
}

impl From<TmdbPersonResult> for Person {
    fn from(raw: TmdbPersonResult) -> Self {
        Person {
            id: raw.id,
            name: raw.name,
            role: raw.known_for_department,
            profile_url: image_url(raw.profile_path),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbMovie {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub overview: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub release_date: String,
    #[serde(default)]
    pub genres: Vec<TmdbGenre>,
    #[serde(default)]
    pub production_companies: Vec<TmdbCompany>,
    pub credits: Option<TmdbCredits>,
    #[serde(default)]
    pub vote_average: f32,
    #[serde(default)]
    pub vote_count: i64,
}

impl From<TmdbMovie> for Movie {
    fn from(raw: TmdbMovie) -> Self {
        let credits = raw.credits.unwrap_or_default();
        Movie {
            id: raw.id,
            title: raw.title,
            overview: raw.overview,
            poster_url: image_url(raw.poster_path),
            backdrop_url: image_url(raw.backdrop_path),
            release_date: raw.release_date,
            genres: genres(raw.genres),
            actors: credits.actors(),
            crew: credits.crew(),
            studios: studios(raw.production_companies),
            vote_average: raw.vote_average,
            vote_count: raw.vote_count,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbEpisode {
    pub id: i64,
    #[serde(default)]
    pub show_id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub overview: String,
    pub air_date: Option<String>,
    #[serde(default)]
    pub episode_number: i32,
    #[serde(default)]
    pub season_number: i32,
    pub still_path: Option<String>,
}

impl TmdbEpisode {
    /// Episode payloads do not always carry their show id, so the caller supplies it.
    pub fn into_episode(self, show_id: i64) -> TvEpisode {
        TvEpisode {
            id: self.id,
            tv_show_id: show_id,
            poster_url: image_url(self.still_path),
            episode_number: self.episode_number,
            season_number: self.season_number,
            name: self.name,
            overview: self.overview,
            air_date: self.air_date.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbSeason {
    #[serde(default)]
    pub season_number: i32,
    #[serde(default)]
    pub episodes: Vec<TmdbEpisode>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbShow {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub overview: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub first_air_date: String,
    #[serde(default)]
    pub genres: Vec<TmdbGenre>,
    #[serde(default)]
    pub networks: Vec<TmdbCompany>,
    #[serde(default)]
    pub status: String,
    pub next_episode_to_air: Option<TmdbEpisode>,
    pub last_episode_to_air: Option<TmdbEpisode>,
    #[serde(default)]
    pub number_of_seasons: i32,
    #[serde(default)]
    pub number_of_episodes: i32,
    pub credits: Option<TmdbCredits>,
    #[serde(default)]
    pub vote_average: f32,
    #[serde(default)]
    pub vote_count: i64,
}

impl From<TmdbShow> for TvShow {
    fn from(raw: TmdbShow) -> Self {
        let credits = raw.credits.unwrap_or_default();
        let show_id = raw.id;
        TvShow {
            id: raw.id,
            title: raw.name,
            overview: raw.overview,
            poster_url: image_url(raw.poster_path),
            backdrop_url: image_url(raw.backdrop_path),
            release_date: raw.first_air_date,
            genres: genres(raw.genres),
            actors: credits.actors(),
            crew: credits.crew(),
            networks: studios(raw.networks),
            status: raw.status,
            next_episode: raw
                .next_episode_to_air
                .map(|episode| episode.into_episode(show_id)),
            seasons_count: raw.number_of_seasons,
            episodes_count: raw.number_of_episodes,
            vote_average: raw.vote_average,
            vote_count: raw.vote_count,
        }
    }
}

/// `/person/{id}/tv_credits` response
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbPersonTvCredits {
    #[serde(default)]
    pub cast: Vec<TmdbShow>,
}
