//! Discovery entry points.
//!
//! Every listing can be answered from the whole catalog or from the titles on
//! disk only. The two strategies rank and paginate differently: the catalog's
//! own ordering for the former, the local store's SQL ranking for the latter.

use std::{future::Future, sync::Arc, time::Duration};

use crate::{
    db::AvailabilityStore,
    error::{AppError, AppResult},
    models::{
        CatalogTitle, DiscoveryPage, ListFilter, Movie, Paginated, Person, RankMode, TitleKind,
        TitleList, TvShow, POPULAR_WINDOW_DAYS,
    },
    services::{
        availability::{AvailabilityFetcher, Hydrate},
        catalog::CatalogFetcher,
        providers::CatalogGateway,
    },
};

/// Which result set a discovery call is answered from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryStrategy {
    /// The remote catalog ranks and paginates; local data only annotates
    AllCatalog,
    /// Only titles with a file on disk, ranked by the local store
    AvailableOnly,
}

impl DiscoveryStrategy {
    pub fn from_available_flag(available: bool) -> Self {
        if available {
            DiscoveryStrategy::AvailableOnly
        } else {
            DiscoveryStrategy::AllCatalog
        }
    }
}

#[derive(Clone)]
pub struct DiscoveryService {
    gateway: Arc<dyn CatalogGateway>,
    store: Arc<dyn AvailabilityStore>,
    catalog: CatalogFetcher,
    available: AvailabilityFetcher,
}

fn validate_query(query: &str) -> AppResult<&str> {
    let query = query.trim();
    if query.is_empty() {
        return Err(AppError::InvalidInput(
            "Search query cannot be empty".to_string(),
        ));
    }
    Ok(query)
}

impl DiscoveryService {
    pub fn new(
        gateway: Arc<dyn CatalogGateway>,
        store: Arc<dyn AvailabilityStore>,
        hydration_timeout: Duration,
    ) -> Self {
        Self {
            catalog: CatalogFetcher::new(Arc::clone(&store)),
            available: AvailabilityFetcher::new(
                Arc::clone(&store),
                Arc::clone(&gateway),
                hydration_timeout,
            ),
            gateway,
            store,
        }
    }

    /// Runs `remote` for the catalog strategy, or the ranked local listing
    /// otherwise. `remote` is never polled on the local path.
    async fn route<T, F>(
        &self,
        strategy: DiscoveryStrategy,
        page: u32,
        filter: ListFilter,
        rank: RankMode,
        remote: F,
    ) -> AppResult<DiscoveryPage<T>>
    where
        T: Hydrate,
        F: Future<Output = AppResult<Paginated<T>>> + Send,
    {
        match strategy {
            DiscoveryStrategy::AllCatalog => {
                let results = remote.await?;
                self.catalog.annotate_page(results).await
            }
            DiscoveryStrategy::AvailableOnly => self.available.fetch(page, filter, rank).await,
        }
    }

    /// Remote-only listing: no local equivalent exists for these filters
    async fn remote_only<T: CatalogTitle>(
        &self,
        remote: impl Future<Output = AppResult<Paginated<T>>> + Send,
    ) -> AppResult<DiscoveryPage<T>> {
        let results = remote.await?;
        self.catalog.annotate_page(results).await
    }

    async fn annotate_all<T: CatalogTitle>(&self, titles: Vec<T>) -> AppResult<TitleList<T>> {
        self.catalog.annotate(titles).await
    }

    /// Recently added titles: a single page, newest first
    async fn recent<T, F>(&self, strategy: DiscoveryStrategy, remote: F) -> AppResult<TitleList<T>>
    where
        T: Hydrate,
        F: Future<Output = AppResult<Vec<T>>> + Send,
    {
        match strategy {
            DiscoveryStrategy::AllCatalog => self.annotate_all(remote.await?).await,
            DiscoveryStrategy::AvailableOnly => {
                let page = self
                    .available
                    .fetch::<T>(1, ListFilter::All, RankMode::CreatedAt)
                    .await?;
                Ok(page.titles)
            }
        }
    }

    pub async fn search_movies(
        &self,
        query: &str,
        page: u32,
        strategy: DiscoveryStrategy,
    ) -> AppResult<DiscoveryPage<Movie>> {
        let query = validate_query(query)?;
        tracing::info!(query = %query, page, ?strategy, "Searching movies");
        self.route(
            strategy,
            page,
            ListFilter::NameContains(query.to_string()),
            RankMode::Name,
            self.gateway.search_movies(query, page),
        )
        .await
    }

    pub async fn search_shows(
        &self,
        query: &str,
        page: u32,
        strategy: DiscoveryStrategy,
    ) -> AppResult<DiscoveryPage<TvShow>> {
        let query = validate_query(query)?;
        tracing::info!(query = %query, page, ?strategy, "Searching shows");
        self.route(
            strategy,
            page,
            ListFilter::NameContains(query.to_string()),
            RankMode::Name,
            self.gateway.search_shows(query, page),
        )
        .await
    }

    pub async fn popular_movies(
        &self,
        page: u32,
        strategy: DiscoveryStrategy,
    ) -> AppResult<DiscoveryPage<Movie>> {
        self.route(
            strategy,
            page,
            ListFilter::All,
            RankMode::RatingWindow {
                days: POPULAR_WINDOW_DAYS,
            },
            self.gateway.popular_movies(page),
        )
        .await
    }

    pub async fn popular_shows(
        &self,
        page: u32,
        strategy: DiscoveryStrategy,
    ) -> AppResult<DiscoveryPage<TvShow>> {
        self.route(
            strategy,
            page,
            ListFilter::All,
            RankMode::RatingWindow {
                days: POPULAR_WINDOW_DAYS,
            },
            self.gateway.popular_shows(page),
        )
        .await
    }

    pub async fn recent_movies(&self, strategy: DiscoveryStrategy) -> AppResult<TitleList<Movie>> {
        self.recent(strategy, self.gateway.recent_movies()).await
    }

    pub async fn recent_shows(&self, strategy: DiscoveryStrategy) -> AppResult<TitleList<TvShow>> {
        self.recent(strategy, self.gateway.recent_shows()).await
    }

    pub async fn movies_by_genre(
        &self,
        genre_id: i64,
        page: u32,
        strategy: DiscoveryStrategy,
    ) -> AppResult<DiscoveryPage<Movie>> {
        self.route(
            strategy,
            page,
            ListFilter::Genre(genre_id),
            RankMode::RatingWindow {
                days: POPULAR_WINDOW_DAYS,
            },
            self.gateway.movies_by_genre(genre_id, page),
        )
        .await
    }

    pub async fn shows_by_genre(
        &self,
        genre_id: i64,
        page: u32,
        strategy: DiscoveryStrategy,
    ) -> AppResult<DiscoveryPage<TvShow>> {
        self.route(
            strategy,
            page,
            ListFilter::Genre(genre_id),
            RankMode::RatingWindow {
                days: POPULAR_WINDOW_DAYS,
            },
            self.gateway.shows_by_genre(genre_id, page),
        )
        .await
    }

    /// People matching `query`, in the catalog's order. Feeds the by-actor
    /// listings.
    pub async fn search_actors(&self, query: &str, page: u32) -> AppResult<Paginated<Person>> {
        let query = validate_query(query)?;
        tracing::info!(query = %query, page, "Searching actors");
        self.gateway.search_actors(query, page).await
    }

    pub async fn movies_by_actor(
        &self,
        actor_id: i64,
        page: u32,
    ) -> AppResult<DiscoveryPage<Movie>> {
        self.remote_only(self.gateway.movies_by_actor(actor_id, page))
            .await
    }

    pub async fn shows_by_actor(
        &self,
        actor_id: i64,
        page: u32,
    ) -> AppResult<DiscoveryPage<TvShow>> {
        self.remote_only(self.gateway.shows_by_actor(actor_id, page))
            .await
    }

    pub async fn movies_by_director(
        &self,
        director_id: i64,
        page: u32,
    ) -> AppResult<DiscoveryPage<Movie>> {
        self.remote_only(self.gateway.movies_by_director(director_id, page))
            .await
    }

    pub async fn movies_by_studio(
        &self,
        studio_id: i64,
        page: u32,
    ) -> AppResult<DiscoveryPage<Movie>> {
        self.remote_only(self.gateway.movies_by_studio(studio_id, page))
            .await
    }

    pub async fn shows_by_network(
        &self,
        network_id: i64,
        page: u32,
    ) -> AppResult<DiscoveryPage<TvShow>> {
        self.remote_only(self.gateway.shows_by_network(network_id, page))
            .await
    }

    pub async fn movie_recommendations(&self, movie_id: i64) -> AppResult<TitleList<Movie>> {
        let movies = self.gateway.movie_recommendations(movie_id).await?;
        self.annotate_all(movies).await
    }

    pub async fn show_recommendations(&self, show_id: i64) -> AppResult<TitleList<TvShow>> {
        let shows = self.gateway.show_recommendations(show_id).await?;
        self.annotate_all(shows).await
    }

    /// Ids of the most commented titles, most commented first
    pub async fn most_commented(
        &self,
        kind: TitleKind,
        strategy: DiscoveryStrategy,
    ) -> AppResult<Vec<i64>> {
        let only_available = strategy == DiscoveryStrategy::AvailableOnly;
        let ids = self.store.most_commented(kind, only_available).await?;
        tracing::debug!(kind = %kind, only_available, count = ids.len(), "Most commented titles");
        Ok(ids)
    }
}
