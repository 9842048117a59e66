use std::sync::Arc;

use crate::{
    db::AvailabilityStore,
    error::AppResult,
    models::{CatalogTitle, RatingAggregate},
};

/// Replaces catalog vote figures with the locally computed rating
#[derive(Clone)]
pub struct RatingOverlay {
    store: Arc<dyn AvailabilityStore>,
}

impl RatingOverlay {
    pub fn new(store: Arc<dyn AvailabilityStore>) -> Self {
        Self { store }
    }

    /// Returns `title` with its all-time local rating applied.
    ///
    /// A title nobody rated locally comes back untouched. Store failures are
    /// errors; batch callers use [`apply_or_keep`](Self::apply_or_keep).
    pub async fn apply<T: CatalogTitle>(&self, mut title: T) -> AppResult<T> {
        if let Some(rating) = self.lookup::<T>(title.external_id()).await? {
            title.apply_local_rating(&rating);
        }
        Ok(title)
    }

    /// Like [`apply`](Self::apply), but a failed rating query keeps the
    /// catalog's vote figures. Used inside listings, where one title's rating
    /// must not cost the page.
    pub async fn apply_or_keep<T: CatalogTitle>(&self, mut title: T) -> T {
        let external_id = title.external_id();
        match self.lookup::<T>(external_id).await {
            Ok(Some(rating)) => title.apply_local_rating(&rating),
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(
                    external_id,
                    kind = %T::KIND,
                    operation = "rating_overlay",
                    error = %e,
                    "Local rating unavailable, keeping catalog rating"
                );
            }
        }
        title
    }

    async fn lookup<T: CatalogTitle>(
        &self,
        external_id: i64,
    ) -> AppResult<Option<RatingAggregate>> {
        let rating = self.store.local_rating(external_id, T::KIND, None).await?;
        match &rating {
            Some(rating) => tracing::debug!(
                external_id,
                kind = %T::KIND,
                average = rating.average,
                count = rating.count,
                "Applying local rating"
            ),
            None => tracing::trace!(external_id, kind = %T::KIND, "No local rating"),
        }
        Ok(rating)
    }
}
