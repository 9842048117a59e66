//! In-memory stand-ins for the catalog and the local stores.

#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use uuid::Uuid;

use marquee_api::{
    db::{feedback::Page, AvailabilityStore, FeedbackStore},
    error::{AppError, AppResult},
    models::{
        Actor, AvailabilityRecord, Comment, Genre, ListFilter, MediaKind, Movie, Paginated,
        Person, RankMode, Rating, RatingAggregate, Studio, TitleKind, TvEpisode, TvShow,
        PAGE_SIZE,
    },
    services::providers::{released_in, CatalogGateway},
};

pub fn movie(id: i64, title: &str) -> Movie {
    Movie {
        id,
        title: title.to_string(),
        overview: String::new(),
        poster_url: None,
        backdrop_url: None,
        release_date: "2023-04-07".to_string(),
        genres: vec![],
        actors: vec![],
        crew: vec![],
        studios: vec![],
        vote_average: 7.2,
        vote_count: 278,
    }
}

pub fn show(id: i64, title: &str) -> TvShow {
    TvShow {
        id,
        title: title.to_string(),
        overview: String::new(),
        poster_url: None,
        backdrop_url: None,
        release_date: "2019-01-01".to_string(),
        genres: vec![],
        actors: vec![],
        crew: vec![],
        networks: vec![],
        status: "Returning Series".to_string(),
        next_episode: None,
        seasons_count: 1,
        episodes_count: 10,
        vote_average: 6.7,
        vote_count: 11,
    }
}

pub fn episode(id: i64, show_id: i64, number: i32, air_date: &str) -> TvEpisode {
    TvEpisode {
        id,
        tv_show_id: show_id,
        poster_url: None,
        episode_number: number,
        season_number: 1,
        name: format!("Episode {}", number),
        overview: String::new(),
        air_date: air_date.to_string(),
    }
}

pub fn record(id: i64, name: &str, average_rating: Option<f64>) -> AvailabilityRecord {
    AvailabilityRecord {
        id,
        name: name.to_string(),
        release_date: None,
        created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
            + chrono::Duration::days(id),
        average_rating,
    }
}

fn page_of<T: Clone>(items: &[T], page: u32, page_size: u32) -> Vec<T> {
    let skip = (page.saturating_sub(1) * page_size) as usize;
    items
        .iter()
        .skip(skip)
        .take(page_size as usize)
        .cloned()
        .collect()
}

/// Catalog fake. Lookups can be slowed down or made to fail per id.
#[derive(Default)]
pub struct FakeCatalog {
    pub movies: HashMap<i64, Movie>,
    pub shows: HashMap<i64, TvShow>,
    pub episodes: Vec<TvEpisode>,
    pub delays: HashMap<i64, Duration>,
    pub failing: HashSet<i64>,
    /// Listing returned by every paginated movie endpoint
    pub movie_listing: Option<Paginated<Movie>>,
    pub show_listing: Option<Paginated<TvShow>>,
    pub listing_calls: AtomicUsize,
    pub genres: HashMap<TitleKind, Vec<Genre>>,
    pub networks: HashMap<i64, Studio>,
    pub studios: HashMap<i64, Studio>,
    pub actors: HashMap<i64, Actor>,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_movie(mut self, movie: Movie) -> Self {
        self.movies.insert(movie.id, movie);
        self
    }

    pub fn with_show(mut self, show: TvShow) -> Self {
        self.shows.insert(show.id, show);
        self
    }

    pub fn with_episode(mut self, episode: TvEpisode) -> Self {
        self.episodes.push(episode);
        self
    }

    pub fn with_delay(mut self, id: i64, delay: Duration) -> Self {
        self.delays.insert(id, delay);
        self
    }

    pub fn failing_on(mut self, id: i64) -> Self {
        self.failing.insert(id);
        self
    }

    pub fn with_movie_listing(mut self, listing: Paginated<Movie>) -> Self {
        self.movie_listing = Some(listing);
        self
    }

    pub fn with_show_listing(mut self, listing: Paginated<TvShow>) -> Self {
        self.show_listing = Some(listing);
        self
    }

    pub fn with_genres(mut self, kind: TitleKind, genres: Vec<Genre>) -> Self {
        self.genres.insert(kind, genres);
        self
    }

    pub fn with_network(mut self, network: Studio) -> Self {
        self.networks.insert(network.id, network);
        self
    }

    pub fn with_actor(mut self, actor: Actor) -> Self {
        self.actors.insert(actor.id, actor);
        self
    }

    pub fn listing_calls(&self) -> usize {
        self.listing_calls.load(Ordering::SeqCst)
    }

    async fn lookup<T: Clone>(&self, id: i64, items: &HashMap<i64, T>) -> AppResult<T> {
        if let Some(delay) = self.delays.get(&id) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing.contains(&id) {
            return Err(AppError::ExternalApi(format!("catalog unavailable for {}", id)));
        }
        items
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("title {}", id)))
    }

    fn movies_listing(&self) -> Paginated<Movie> {
        self.listing_calls.fetch_add(1, Ordering::SeqCst);
        self.movie_listing.clone().unwrap_or_else(Paginated::empty)
    }

    fn shows_listing(&self) -> Paginated<TvShow> {
        self.listing_calls.fetch_add(1, Ordering::SeqCst);
        self.show_listing.clone().unwrap_or_else(Paginated::empty)
    }
}

#[async_trait::async_trait]
impl CatalogGateway for FakeCatalog {
    async fn get_movie(&self, id: i64) -> AppResult<Movie> {
        self.lookup(id, &self.movies).await
    }

    async fn get_movie_short(&self, id: i64) -> AppResult<Movie> {
        self.lookup(id, &self.movies).await
    }

    async fn get_show(&self, id: i64) -> AppResult<TvShow> {
        self.lookup(id, &self.shows).await
    }

    async fn get_show_short(&self, id: i64) -> AppResult<TvShow> {
        self.lookup(id, &self.shows).await
    }

    async fn get_episode(&self, show_id: i64, season: i32, number: i32) -> AppResult<TvEpisode> {
        self.episodes
            .iter()
            .find(|e| {
                e.tv_show_id == show_id && e.season_number == season && e.episode_number == number
            })
            .cloned()
            .ok_or_else(|| {
                AppError::NotFound(format!("episode {} {}x{}", show_id, season, number))
            })
    }

    async fn season_episodes(&self, show_id: i64, season: i32) -> AppResult<Vec<TvEpisode>> {
        let episodes: Vec<TvEpisode> = self
            .episodes
            .iter()
            .filter(|e| e.tv_show_id == show_id && e.season_number == season)
            .cloned()
            .collect();
        if episodes.is_empty() {
            return Err(AppError::NotFound(format!("season {} of {}", season, show_id)));
        }
        Ok(episodes)
    }

    async fn search_actors(&self, query: &str, page: u32) -> AppResult<Paginated<Person>> {
        let mut matches: Vec<Person> = self
            .actors
            .values()
            .filter(|a| a.name.to_lowercase().contains(&query.to_lowercase()))
            .map(|a| Person {
                id: a.id,
                name: a.name.clone(),
                role: Some("Acting".to_string()),
                profile_url: a.profile_url.clone(),
            })
            .collect();
        matches.sort_by_key(|person| person.id);
        let total = matches.len() as u64;
        Ok(Paginated::new(page_of(&matches, page, PAGE_SIZE), total, PAGE_SIZE))
    }

    async fn movie_genres(&self) -> AppResult<Vec<Genre>> {
        Ok(self.genres.get(&TitleKind::Movie).cloned().unwrap_or_default())
    }

    async fn show_genres(&self) -> AppResult<Vec<Genre>> {
        Ok(self.genres.get(&TitleKind::TvShow).cloned().unwrap_or_default())
    }

    async fn get_studio(&self, id: i64) -> AppResult<Studio> {
        self.lookup(id, &self.studios).await
    }

    async fn get_network(&self, id: i64) -> AppResult<Studio> {
        self.lookup(id, &self.networks).await
    }

    async fn get_actor(&self, id: i64) -> AppResult<Actor> {
        self.lookup(id, &self.actors).await
    }

    async fn search_movies(&self, _query: &str, _page: u32) -> AppResult<Paginated<Movie>> {
        Ok(self.movies_listing())
    }

    async fn search_shows(&self, _query: &str, _page: u32) -> AppResult<Paginated<TvShow>> {
        Ok(self.shows_listing())
    }

    async fn popular_movies(&self, _page: u32) -> AppResult<Paginated<Movie>> {
        Ok(self.movies_listing())
    }

    async fn popular_shows(&self, _page: u32) -> AppResult<Paginated<TvShow>> {
        Ok(self.shows_listing())
    }

    async fn recent_movies(&self) -> AppResult<Vec<Movie>> {
        Ok(self.movies_listing().results)
    }

    async fn recent_shows(&self) -> AppResult<Vec<TvShow>> {
        Ok(self.shows_listing().results)
    }

    async fn movies_by_genre(&self, _genre_id: i64, _page: u32) -> AppResult<Paginated<Movie>> {
        Ok(self.movies_listing())
    }

    async fn shows_by_genre(&self, _genre_id: i64, _page: u32) -> AppResult<Paginated<TvShow>> {
        Ok(self.shows_listing())
    }

    async fn movies_by_actor(&self, _actor_id: i64, _page: u32) -> AppResult<Paginated<Movie>> {
        Ok(self.movies_listing())
    }

    async fn shows_by_actor(&self, _actor_id: i64, _page: u32) -> AppResult<Paginated<TvShow>> {
        Ok(self.shows_listing())
    }

    async fn movies_by_director(
        &self,
        _director_id: i64,
        _page: u32,
    ) -> AppResult<Paginated<Movie>> {
        Ok(self.movies_listing())
    }

    async fn movies_by_studio(&self, _studio_id: i64, _page: u32) -> AppResult<Paginated<Movie>> {
        Ok(self.movies_listing())
    }

    async fn shows_by_network(&self, _network_id: i64, _page: u32) -> AppResult<Paginated<TvShow>> {
        Ok(self.shows_listing())
    }

    async fn movie_recommendations(&self, _movie_id: i64) -> AppResult<Vec<Movie>> {
        Ok(self.movies_listing().results)
    }

    async fn show_recommendations(&self, _show_id: i64) -> AppResult<Vec<TvShow>> {
        Ok(self.shows_listing().results)
    }

    async fn movie_releases(
        &self,
        ids: &[i64],
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<Vec<Movie>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.movies.get(id))
            .filter(|m| released_in(&m.release_date, start, end))
            .cloned()
            .collect())
    }

    async fn show_releases(
        &self,
        ids: &[i64],
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<(Vec<TvEpisode>, Vec<TvShow>)> {
        let episodes: Vec<TvEpisode> = self
            .episodes
            .iter()
            .filter(|e| ids.contains(&e.tv_show_id) && released_in(&e.air_date, start, end))
            .cloned()
            .collect();
        let shows = ids
            .iter()
            .filter(|id| episodes.iter().any(|e| e.tv_show_id == **id))
            .filter_map(|id| self.shows.get(id))
            .cloned()
            .collect();
        Ok((episodes, shows))
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// Local store fake with ranked listings computed in memory
#[derive(Default)]
pub struct FakeAvailability {
    pub present: HashSet<(i64, MediaKind)>,
    pub ratings: HashMap<(i64, TitleKind), RatingAggregate>,
    pub records: HashMap<TitleKind, Vec<AvailabilityRecord>>,
    pub genres: HashMap<i64, Vec<i64>>,
    pub followed: HashMap<(String, TitleKind), Vec<i64>>,
    pub commented: Vec<i64>,
    /// Ids whose local rating query fails
    pub failing_ratings: HashSet<i64>,
    pub presence_broken: bool,
    pub broken: bool,
}

impl FakeAvailability {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_present(mut self, id: i64, kind: MediaKind) -> Self {
        self.present.insert((id, kind));
        self
    }

    pub fn with_rating(mut self, id: i64, kind: TitleKind, average: f32, count: i64) -> Self {
        self.ratings
            .insert((id, kind), RatingAggregate { average, count });
        self
    }

    /// Registers an available title; it is also marked present
    pub fn with_record(mut self, kind: TitleKind, record: AvailabilityRecord) -> Self {
        self.present.insert((record.id, MediaKind::from(kind)));
        self.records.entry(kind).or_default().push(record);
        self
    }

    pub fn with_genre(mut self, genre_id: i64, ids: Vec<i64>) -> Self {
        self.genres.insert(genre_id, ids);
        self
    }

    pub fn with_followed(mut self, user_id: &str, kind: TitleKind, ids: Vec<i64>) -> Self {
        self.followed.insert((user_id.to_string(), kind), ids);
        self
    }

    pub fn failing_rating_for(mut self, id: i64) -> Self {
        self.failing_ratings.insert(id);
        self
    }

    pub fn presence_broken(mut self) -> Self {
        self.presence_broken = true;
        self
    }

    pub fn broken(mut self) -> Self {
        self.broken = true;
        self
    }

    fn check(&self) -> AppResult<()> {
        if self.broken {
            return Err(AppError::Internal("local store unreachable".to_string()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl AvailabilityStore for FakeAvailability {
    async fn is_present(&self, external_id: i64, kind: MediaKind) -> AppResult<bool> {
        self.check()?;
        if self.presence_broken {
            return Err(AppError::Internal("presence query failed".to_string()));
        }
        Ok(self.present.contains(&(external_id, kind)))
    }

    async fn local_rating(
        &self,
        external_id: i64,
        kind: TitleKind,
        _window_days: Option<u32>,
    ) -> AppResult<Option<RatingAggregate>> {
        self.check()?;
        if self.failing_ratings.contains(&external_id) {
            return Err(AppError::Internal("rating query failed".to_string()));
        }
        Ok(self.ratings.get(&(external_id, kind)).copied())
    }

    async fn list_available(
        &self,
        kind: TitleKind,
        page: u32,
        page_size: u32,
        filter: ListFilter,
        rank: RankMode,
    ) -> AppResult<(Vec<AvailabilityRecord>, u64)> {
        self.check()?;
        let mut rows: Vec<AvailabilityRecord> = self
            .records
            .get(&kind)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(|r| match &filter {
                ListFilter::All => true,
                ListFilter::NameContains(query) => {
                    r.name.to_lowercase().contains(&query.to_lowercase())
                }
                ListFilter::Genre(genre_id) => self
                    .genres
                    .get(genre_id)
                    .is_some_and(|ids| ids.contains(&r.id)),
            })
            .collect();

        match rank {
            RankMode::RatingWindow { .. } => rows.sort_by(|a, b| {
                let by_rating = match (a.average_rating, b.average_rating) {
                    (Some(x), Some(y)) => y.total_cmp(&x),
                    (Some(_), None) => std::cmp::Ordering::Less,
                    (None, Some(_)) => std::cmp::Ordering::Greater,
                    (None, None) => std::cmp::Ordering::Equal,
                };
                by_rating.then_with(|| a.name.cmp(&b.name)).then(a.id.cmp(&b.id))
            }),
            RankMode::Name => rows.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id))),
            RankMode::CreatedAt => rows.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        }

        let total = rows.len() as u64;
        Ok((page_of(&rows, page, page_size), total))
    }

    async fn followed_ids(&self, user_id: &str, kind: TitleKind) -> AppResult<Vec<i64>> {
        self.check()?;
        Ok(self
            .followed
            .get(&(user_id.to_string(), kind))
            .cloned()
            .unwrap_or_default())
    }

    async fn most_commented(&self, _kind: TitleKind, only_available: bool) -> AppResult<Vec<i64>> {
        self.check()?;
        Ok(self
            .commented
            .iter()
            .copied()
            .filter(|id| {
                !only_available
                    || self.present.contains(&(*id, MediaKind::Movie))
                    || self.present.contains(&(*id, MediaKind::TvShow))
            })
            .collect())
    }
}

/// Comments and ratings kept in memory, newest first
#[derive(Default)]
pub struct FakeFeedback {
    comments: Mutex<Vec<(TitleKind, Comment)>>,
    ratings: Mutex<Vec<(TitleKind, Rating)>>,
}

impl FakeFeedback {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a comment with a fixed creation time
    pub fn seed_comment(
        &self,
        kind: TitleKind,
        user_id: &str,
        media_id: i64,
        content: &str,
        created_at: DateTime<Utc>,
    ) -> Uuid {
        let id = Uuid::new_v4();
        self.comments.lock().unwrap().push((
            kind,
            Comment {
                id,
                user_id: user_id.to_string(),
                media_id,
                content: content.to_string(),
                created_at,
                updated_at: created_at,
            },
        ));
        id
    }

    fn comments_where(
        &self,
        kind: TitleKind,
        keep: impl Fn(&Comment) -> bool,
    ) -> Vec<Comment> {
        let mut comments: Vec<Comment> = self
            .comments
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, c)| *k == kind && keep(c))
            .map(|(_, c)| c.clone())
            .collect();
        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        comments
    }

    fn ratings_where(&self, kind: TitleKind, keep: impl Fn(&Rating) -> bool) -> Vec<Rating> {
        let mut ratings: Vec<Rating> = self
            .ratings
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, r)| *k == kind && keep(r))
            .map(|(_, r)| r.clone())
            .collect();
        ratings.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        ratings
    }
}

#[async_trait::async_trait]
impl FeedbackStore for FakeFeedback {
    async fn comments_for_title(
        &self,
        kind: TitleKind,
        media_id: i64,
        page: u32,
        page_size: u32,
    ) -> AppResult<Page<Comment>> {
        let all = self.comments_where(kind, |c| c.media_id == media_id);
        Ok((page_of(&all, page, page_size), all.len() as u64))
    }

    async fn comments_for_user(
        &self,
        kind: TitleKind,
        user_id: &str,
        page: u32,
        page_size: u32,
    ) -> AppResult<Page<Comment>> {
        let all = self.comments_where(kind, |c| c.user_id == user_id);
        Ok((page_of(&all, page, page_size), all.len() as u64))
    }

    async fn comments_in_range(
        &self,
        kind: TitleKind,
        user_id: Option<&str>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<Comment>> {
        Ok(self.comments_where(kind, |c| {
            c.created_at >= start
                && c.created_at < end
                && user_id.map_or(true, |user| c.user_id == user)
        }))
    }

    async fn comment(&self, kind: TitleKind, comment_id: Uuid) -> AppResult<Option<Comment>> {
        Ok(self
            .comments_where(kind, |c| c.id == comment_id)
            .into_iter()
            .next())
    }

    async fn add_comment(
        &self,
        kind: TitleKind,
        user_id: &str,
        media_id: i64,
        content: &str,
    ) -> AppResult<Comment> {
        let id = self.seed_comment(kind, user_id, media_id, content, Utc::now());
        self.comment(kind, id)
            .await?
            .ok_or_else(|| AppError::Internal("comment vanished".to_string()))
    }

    async fn update_comment(
        &self,
        kind: TitleKind,
        comment_id: Uuid,
        content: &str,
    ) -> AppResult<Comment> {
        let mut comments = self.comments.lock().unwrap();
        let (_, comment) = comments
            .iter_mut()
            .find(|(k, c)| *k == kind && c.id == comment_id)
            .ok_or_else(|| AppError::NotFound(format!("comment {}", comment_id)))?;
        comment.content = content.to_string();
        comment.updated_at = Utc::now();
        Ok(comment.clone())
    }

    async fn delete_comment(&self, kind: TitleKind, comment_id: Uuid) -> AppResult<()> {
        self.comments
            .lock()
            .unwrap()
            .retain(|(k, c)| !(*k == kind && c.id == comment_id));
        Ok(())
    }

    async fn count_comments(&self, kind: TitleKind, user_id: Option<&str>) -> AppResult<u64> {
        Ok(self
            .comments_where(kind, |c| user_id.map_or(true, |user| c.user_id == user))
            .len() as u64)
    }

    async fn ratings_for_title(
        &self,
        kind: TitleKind,
        media_id: i64,
        page: u32,
        page_size: u32,
    ) -> AppResult<Page<Rating>> {
        let all = self.ratings_where(kind, |r| r.media_id == media_id);
        Ok((page_of(&all, page, page_size), all.len() as u64))
    }

    async fn ratings_for_user(
        &self,
        kind: TitleKind,
        user_id: &str,
        page: u32,
        page_size: u32,
    ) -> AppResult<Page<Rating>> {
        let all = self.ratings_where(kind, |r| r.user_id == user_id);
        Ok((page_of(&all, page, page_size), all.len() as u64))
    }

    async fn user_rating(
        &self,
        kind: TitleKind,
        user_id: &str,
        media_id: i64,
    ) -> AppResult<Option<Rating>> {
        Ok(self
            .ratings_where(kind, |r| r.user_id == user_id && r.media_id == media_id)
            .into_iter()
            .next())
    }

    async fn save_rating(
        &self,
        kind: TitleKind,
        user_id: &str,
        media_id: i64,
        rating: i32,
    ) -> AppResult<Rating> {
        let mut ratings = self.ratings.lock().unwrap();
        let now = Utc::now();
        if let Some((_, existing)) = ratings
            .iter_mut()
            .find(|(k, r)| *k == kind && r.user_id == user_id && r.media_id == media_id)
        {
            existing.rating = rating;
            existing.updated_at = now;
            return Ok(existing.clone());
        }
        let created = Rating {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            media_id,
            rating,
            created_at: now,
            updated_at: now,
        };
        ratings.push((kind, created.clone()));
        Ok(created)
    }

    async fn count_ratings(&self, kind: TitleKind, user_id: Option<&str>) -> AppResult<u64> {
        Ok(self
            .ratings_where(kind, |r| user_id.map_or(true, |user| r.user_id == user))
            .len() as u64)
    }
}
