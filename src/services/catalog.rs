use std::sync::Arc;

use crate::{
    db::AvailabilityStore,
    error::AppResult,
    models::{CatalogTitle, DiscoveryPage, MediaKind, Paginated, TitleList},
    services::{presence::PresenceResolver, rating::RatingOverlay},
};

/// Annotates catalog-ranked results with local ratings and presence.
///
/// Both lookups are local point queries, so titles are processed one after
/// the other.
#[derive(Clone)]
pub struct CatalogFetcher {
    overlay: RatingOverlay,
    presence: PresenceResolver,
}

impl CatalogFetcher {
    pub fn new(store: Arc<dyn AvailabilityStore>) -> Self {
        Self {
            overlay: RatingOverlay::new(Arc::clone(&store)),
            presence: PresenceResolver::new(store),
        }
    }

    /// Applies the local rating to every title and resolves its presence,
    /// keeping the catalog order. A failed rating query keeps the catalog's
    /// figures; a failed presence query fails the call.
    pub async fn annotate<T: CatalogTitle>(&self, titles: Vec<T>) -> AppResult<TitleList<T>> {
        let mut list = TitleList::with_capacity(titles.len());

        for title in titles {
            let title = self.overlay.apply_or_keep(title).await;
            let present = self
                .presence
                .is_available(title.external_id(), MediaKind::from(T::KIND))
                .await?;
            list.push(title, present);
        }

        Ok(list)
    }

    /// Annotates one catalog page, keeping the catalog's own totals
    pub async fn annotate_page<T: CatalogTitle>(
        &self,
        page: Paginated<T>,
    ) -> AppResult<DiscoveryPage<T>> {
        let titles = self.annotate(page.results).await?;

        tracing::debug!(
            kind = %T::KIND,
            results = titles.len(),
            total = page.total_result_count,
            "Annotated catalog page"
        );

        Ok(DiscoveryPage {
            titles,
            total_result_count: page.total_result_count,
            total_page_count: page.total_page_count,
        })
    }
}
