use std::{sync::Arc, time::Duration};

use serde::Serialize;

use crate::{
    db::AvailabilityStore,
    error::{AppError, AppResult},
    models::{CatalogTitle, MediaKind, Movie, TitleList, TvEpisode, TvShow},
    services::{
        availability::{AvailabilityFetcher, Hydrate},
        presence::PresenceResolver,
        providers::CatalogGateway,
        rating::RatingOverlay,
    },
};

/// Most ids one batch lookup accepts
pub const MAX_BATCH_IDS: usize = 50;

/// A single title and whether it can be played
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaDetails<T> {
    #[serde(flatten)]
    pub media: T,
    pub present: bool,
}

/// Title lookups by id.
///
/// Single-title lookups return any failure as-is. Batch lookups by id drop the
/// titles the catalog cannot describe and keep the rest in request order.
#[derive(Clone)]
pub struct MediaInfoService {
    gateway: Arc<dyn CatalogGateway>,
    overlay: RatingOverlay,
    presence: PresenceResolver,
    batch: AvailabilityFetcher,
}

impl MediaInfoService {
    pub fn new(
        store: Arc<dyn AvailabilityStore>,
        gateway: Arc<dyn CatalogGateway>,
        hydration_timeout: Duration,
    ) -> Self {
        Self {
            overlay: RatingOverlay::new(Arc::clone(&store)),
            presence: PresenceResolver::new(Arc::clone(&store)),
            batch: AvailabilityFetcher::new(store, Arc::clone(&gateway), hydration_timeout),
            gateway,
        }
    }

    pub async fn movie_details(&self, id: i64) -> AppResult<MediaDetails<Movie>> {
        let movie = self.gateway.get_movie(id).await?;
        let movie = self.overlay.apply(movie).await?;
        let present = self.presence.is_available(id, MediaKind::Movie).await?;
        Ok(MediaDetails {
            media: movie,
            present,
        })
    }

    pub async fn show_details(&self, id: i64) -> AppResult<MediaDetails<TvShow>> {
        let show = self.gateway.get_show(id).await?;
        let show = self.overlay.apply(show).await?;
        let present = self.presence.is_available(id, MediaKind::TvShow).await?;
        Ok(MediaDetails {
            media: show,
            present,
        })
    }

    pub async fn episode_details(
        &self,
        show_id: i64,
        season: i32,
        number: i32,
    ) -> AppResult<MediaDetails<TvEpisode>> {
        let episode = self.gateway.get_episode(show_id, season, number).await?;
        let present = self
            .presence
            .is_available(episode.id, MediaKind::Episode)
            .await?;
        Ok(MediaDetails {
            media: episode,
            present,
        })
    }

    /// Short records of `ids`, fetched concurrently
    pub async fn movies(&self, ids: &[i64]) -> AppResult<TitleList<Movie>> {
        self.by_ids(ids).await
    }

    pub async fn shows(&self, ids: &[i64]) -> AppResult<TitleList<TvShow>> {
        self.by_ids(ids).await
    }

    async fn by_ids<T: Hydrate>(&self, ids: &[i64]) -> AppResult<TitleList<T>> {
        if ids.len() > MAX_BATCH_IDS {
            return Err(AppError::InvalidInput(format!(
                "at most {} ids per lookup, got {}",
                MAX_BATCH_IDS,
                ids.len()
            )));
        }

        let slots = self.batch.hydrate_all::<T>(ids).await;
        let mut list = TitleList::with_capacity(slots.len());
        for title in slots.into_iter().flatten() {
            let present = self
                .presence
                .is_available(title.external_id(), MediaKind::from(T::KIND))
                .await?;
            list.push(title, present);
        }

        tracing::debug!(
            kind = %T::KIND,
            requested = ids.len(),
            found = list.len(),
            "Batch lookup"
        );
        Ok(list)
    }

    pub async fn season_episodes(
        &self,
        show_id: i64,
        season: i32,
    ) -> AppResult<TitleList<TvEpisode>> {
        let episodes = self.gateway.season_episodes(show_id, season).await?;
        self.with_episode_presence(episodes).await
    }

    /// Every episode of every regular season, specials excluded
    pub async fn show_episodes(&self, show_id: i64) -> AppResult<TitleList<TvEpisode>> {
        let show = self.gateway.get_show_short(show_id).await?;
        let mut episodes = Vec::new();
        for season in 1..=show.seasons_count {
            episodes.extend(self.gateway.season_episodes(show_id, season).await?);
        }
        self.with_episode_presence(episodes).await
    }

    async fn with_episode_presence(
        &self,
        episodes: Vec<TvEpisode>,
    ) -> AppResult<TitleList<TvEpisode>> {
        let mut list = TitleList::with_capacity(episodes.len());
        for episode in episodes {
            let present = self
                .presence
                .is_available(episode.id, MediaKind::Episode)
                .await?;
            list.push(episode, present);
        }
        Ok(list)
    }
}
