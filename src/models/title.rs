use serde::{Deserialize, Serialize};

use super::{RatingAggregate, TitleKind};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

/// Cast or crew member. For crew, `role` holds the job title.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: i64,
    pub name: String,
    pub role: Option<String>,
    pub profile_url: Option<String>,
}

/// Production company or broadcast network
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Studio {
    pub id: i64,
    pub name: String,
    pub logo_url: Option<String>,
}

/// A person's own catalog page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub id: i64,
    pub name: String,
    pub overview: String,
    pub profile_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub overview: String,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    /// ISO date, empty when unknown
    pub release_date: String,
    pub genres: Vec<Genre>,
    pub actors: Vec<Person>,
    pub crew: Vec<Person>,
    pub studios: Vec<Studio>,
    pub vote_average: f32,
    pub vote_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TvShow {
    pub id: i64,
    pub title: String,
    pub overview: String,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub release_date: String,
    pub genres: Vec<Genre>,
    pub actors: Vec<Person>,
    pub crew: Vec<Person>,
    pub networks: Vec<Studio>,
    pub status: String,
    pub next_episode: Option<TvEpisode>,
    pub seasons_count: i32,
    pub episodes_count: i32,
    pub vote_average: f32,
    pub vote_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TvEpisode {
    pub id: i64,
    pub tv_show_id: i64,
    pub poster_url: Option<String>,
    pub episode_number: i32,
    pub season_number: i32,
    pub name: String,
    pub overview: String,
    pub air_date: String,
}

/// A catalog title that can appear in discovery listings and carry a rating.
pub trait CatalogTitle: Clone + Send + Sync + 'static {
    const KIND: TitleKind;

    fn external_id(&self) -> i64;

    /// Replaces the catalog-supplied vote figures with the local aggregate
    fn apply_local_rating(&mut self, rating: &RatingAggregate);
}

impl CatalogTitle for Movie {
    const KIND: TitleKind = TitleKind::Movie;

    fn external_id(&self) -> i64 {
        self.id
    }

    fn apply_local_rating(&mut self, rating: &RatingAggregate) {
        self.vote_average = rating.average;
        self.vote_count = rating.count;
    }
}

impl CatalogTitle for TvShow {
    const KIND: TitleKind = TitleKind::TvShow;

    fn external_id(&self) -> i64 {
        self.id
    }

    fn apply_local_rating(&mut self, rating: &RatingAggregate) {
        self.vote_average = rating.average;
        self.vote_count = rating.count;
    }
}
