use std::sync::Arc;

use crate::{
    db::FeedbackStore,
    error::{AppError, AppResult},
    models::{Paginated, Rating, TitleKind},
};

pub const RATING_PAGE_SIZE: u32 = 10;
pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

pub fn validate_score(score: i32) -> AppResult<i32> {
    if !(MIN_RATING..=MAX_RATING).contains(&score) {
        return Err(AppError::InvalidInput(format!(
            "rating must be between {} and {}",
            MIN_RATING, MAX_RATING
        )));
    }
    Ok(score)
}

#[derive(Clone)]
pub struct RatingService {
    store: Arc<dyn FeedbackStore>,
}

impl RatingService {
    pub fn new(store: Arc<dyn FeedbackStore>) -> Self {
        Self { store }
    }

    pub async fn for_title(
        &self,
        kind: TitleKind,
        media_id: i64,
        page: u32,
    ) -> AppResult<Paginated<Rating>> {
        let (ratings, total) = self
            .store
            .ratings_for_title(kind, media_id, page, RATING_PAGE_SIZE)
            .await?;
        Ok(Paginated::new(ratings, total, RATING_PAGE_SIZE))
    }

    pub async fn for_user(
        &self,
        kind: TitleKind,
        user_id: &str,
        page: u32,
    ) -> AppResult<Paginated<Rating>> {
        let (ratings, total) = self
            .store
            .ratings_for_user(kind, user_id, page, RATING_PAGE_SIZE)
            .await?;
        Ok(Paginated::new(ratings, total, RATING_PAGE_SIZE))
    }

    /// The user's rating of a title; a zero rating when they have not rated it
    pub async fn own(&self, kind: TitleKind, user_id: &str, media_id: i64) -> AppResult<Rating> {
        let rating = self.store.user_rating(kind, user_id, media_id).await?;
        Ok(rating.unwrap_or_else(|| Rating::unrated(user_id, media_id)))
    }

    pub async fn rate(
        &self,
        kind: TitleKind,
        user_id: &str,
        media_id: i64,
        score: i32,
    ) -> AppResult<Rating> {
        let score = validate_score(score)?;
        let rating = self.store.save_rating(kind, user_id, media_id, score).await?;
        tracing::info!(kind = %kind, media_id, score, "Rating saved");
        Ok(rating)
    }

    /// Number of ratings across every kind, optionally for one user
    pub async fn count(&self, user_id: Option<&str>) -> AppResult<u64> {
        let movies = self.store.count_ratings(TitleKind::Movie, user_id).await?;
        let shows = self.store.count_ratings(TitleKind::TvShow, user_id).await?;
        Ok(movies + shows)
    }
}
