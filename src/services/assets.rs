use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{Actor, Genre, Studio, TitleKind},
    services::providers::CatalogGateway,
};

/// Catalog reference data: the ids clients pass to the genre, actor, studio
/// and network listings
#[derive(Clone)]
pub struct AssetService {
    gateway: Arc<dyn CatalogGateway>,
}

impl AssetService {
    pub fn new(gateway: Arc<dyn CatalogGateway>) -> Self {
        Self { gateway }
    }

    pub async fn genres(&self, kind: TitleKind) -> AppResult<Vec<Genre>> {
        match kind {
            TitleKind::Movie => self.gateway.movie_genres().await,
            TitleKind::TvShow => self.gateway.show_genres().await,
        }
    }

    /// One genre, looked up in the kind's genre list
    pub async fn genre(&self, kind: TitleKind, id: i64) -> AppResult<Genre> {
        self.genres(kind)
            .await?
            .into_iter()
            .find(|genre| genre.id == id)
            .ok_or_else(|| AppError::NotFound(format!("{} genre {}", kind, id)))
    }

    pub async fn studio(&self, id: i64) -> AppResult<Studio> {
        self.gateway.get_studio(id).await
    }

    pub async fn network(&self, id: i64) -> AppResult<Studio> {
        self.gateway.get_network(id).await
    }

    pub async fn actor(&self, id: i64) -> AppResult<Actor> {
        self.gateway.get_actor(id).await
    }
}
