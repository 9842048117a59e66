use std::sync::Arc;

use crate::{db::AvailabilityStore, error::AppResult, models::MediaKind};

/// Answers "is there a playable file for this id"
#[derive(Clone)]
pub struct PresenceResolver {
    store: Arc<dyn AvailabilityStore>,
}

impl PresenceResolver {
    pub fn new(store: Arc<dyn AvailabilityStore>) -> Self {
        Self { store }
    }

    /// `Ok(false)` when nothing is on disk; `Err` only when the store fails.
    pub async fn is_available(&self, external_id: i64, kind: MediaKind) -> AppResult<bool> {
        let present = self.store.is_present(external_id, kind).await?;
        tracing::trace!(external_id, kind = %kind, present, "Resolved presence");
        Ok(present)
    }
}
