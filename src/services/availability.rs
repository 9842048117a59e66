use std::{sync::Arc, time::Duration};

use crate::{
    db::AvailabilityStore,
    error::{AppError, AppResult},
    models::{
        CatalogTitle, DiscoveryPage, ListFilter, Movie, RankMode, TitleList, TvShow, PAGE_SIZE,
    },
    services::{providers::CatalogGateway, rating::RatingOverlay},
};

/// A title that can be looked up in the catalog by external id
#[async_trait::async_trait]
pub trait Hydrate: CatalogTitle {
    async fn hydrate(gateway: &dyn CatalogGateway, external_id: i64) -> AppResult<Self>;
}

#[async_trait::async_trait]
impl Hydrate for Movie {
    async fn hydrate(gateway: &dyn CatalogGateway, external_id: i64) -> AppResult<Self> {
        gateway.get_movie_short(external_id).await
    }
}

#[async_trait::async_trait]
impl Hydrate for TvShow {
    async fn hydrate(gateway: &dyn CatalogGateway, external_id: i64) -> AppResult<Self> {
        gateway.get_show_short(external_id).await
    }
}

/// Lists locally available titles and describes them through the catalog.
///
/// Ranking and pagination come from the local store; each row of the page is
/// hydrated by its own task, and results keep the store's order whatever the
/// completion order of those tasks.
#[derive(Clone)]
pub struct AvailabilityFetcher {
    store: Arc<dyn AvailabilityStore>,
    gateway: Arc<dyn CatalogGateway>,
    overlay: RatingOverlay,
    task_timeout: Duration,
}

impl AvailabilityFetcher {
    pub fn new(
        store: Arc<dyn AvailabilityStore>,
        gateway: Arc<dyn CatalogGateway>,
        task_timeout: Duration,
    ) -> Self {
        Self {
            overlay: RatingOverlay::new(Arc::clone(&store)),
            store,
            gateway,
            task_timeout,
        }
    }

    /// One page of available titles, every one of them marked present.
    ///
    /// Titles whose hydration failed are dropped from the page; the totals
    /// still count them.
    pub async fn fetch<T: Hydrate>(
        &self,
        page: u32,
        filter: ListFilter,
        rank: RankMode,
    ) -> AppResult<DiscoveryPage<T>> {
        let (records, total) = self
            .store
            .list_available(T::KIND, page, PAGE_SIZE, filter, rank)
            .await?;

        let ids: Vec<i64> = records.iter().map(|record| record.id).collect();
        let slots = self.hydrate_all::<T>(&ids).await;
        let titles = into_present_list(slots);

        tracing::info!(
            kind = %T::KIND,
            page,
            rows = ids.len(),
            hydrated = titles.len(),
            total,
            "Fetched available titles"
        );

        Ok(DiscoveryPage::new(titles, total, PAGE_SIZE))
    }

    /// Hydrates every id concurrently, one task per id.
    ///
    /// Slot `i` holds the title for `ids[i]`, or `None` when its catalog lookup
    /// failed or timed out. A failed local rating keeps the catalog's figures.
    /// Returns once every task has finished.
    pub async fn hydrate_all<T: Hydrate>(&self, ids: &[i64]) -> Vec<Option<T>> {
        let mut tasks = Vec::with_capacity(ids.len());

        for &external_id in ids {
            let gateway = Arc::clone(&self.gateway);
            let overlay = self.overlay.clone();
            let task_timeout = self.task_timeout;

            let task = tokio::spawn(async move {
                let hydration = T::hydrate(gateway.as_ref(), external_id);
                let title = match tokio::time::timeout(task_timeout, hydration).await {
                    Ok(result) => result?,
                    Err(_) => {
                        return Err(AppError::Timeout(format!("{} {}", T::KIND, external_id)))
                    }
                };
                Ok::<_, AppError>(overlay.apply_or_keep(title).await)
            });
            tasks.push(task);
        }

        let mut slots: Vec<Option<T>> = vec![None; tasks.len()];
        let mut failures = 0usize;

        for (index, task) in tasks.into_iter().enumerate() {
            let external_id = ids[index];
            match task.await {
                Ok(Ok(title)) => slots[index] = Some(title),
                Ok(Err(e)) => {
                    failures += 1;
                    tracing::warn!(
                        external_id,
                        kind = %T::KIND,
                        operation = "hydrate",
                        error = %e,
                        "Hydration failed, leaving slot empty"
                    );
                }
                Err(e) => {
                    failures += 1;
                    tracing::error!(external_id, error = %e, "Hydration task join error");
                }
            }
        }

        if failures > 0 {
            tracing::warn!(
                success_count = slots.len() - failures,
                error_count = failures,
                "Partial hydration failure"
            );
        }

        slots
    }
}

/// Drops empty slots; every remaining title is present on disk.
fn into_present_list<T>(slots: Vec<Option<T>>) -> TitleList<T> {
    slots.into_iter().flatten().map(|title| (title, true)).collect()
}
