use std::sync::Arc;

use chrono::{Days, NaiveDate, NaiveTime};
use uuid::Uuid;

use crate::{
    db::FeedbackStore,
    error::{AppError, AppResult},
    models::{Caller, Comment, Paginated, TitleKind},
};

pub const COMMENT_PAGE_SIZE: u32 = 5;
pub const MAX_COMMENT_LENGTH: usize = 1000;

/// Trims a comment body and checks it is non-empty and not too long
pub fn validate_content(content: &str) -> AppResult<&str> {
    let content = content.trim();
    if content.is_empty() {
        return Err(AppError::InvalidInput(
            "comment must not be empty".to_string(),
        ));
    }
    if content.chars().count() > MAX_COMMENT_LENGTH {
        return Err(AppError::InvalidInput(format!(
            "comment must not be longer than {} characters",
            MAX_COMMENT_LENGTH
        )));
    }
    Ok(content)
}

fn parse_date(value: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        AppError::InvalidInput(format!("Invalid date '{}', expected YYYY-MM-DD", value))
    })
}

#[derive(Clone)]
pub struct CommentService {
    store: Arc<dyn FeedbackStore>,
}

impl CommentService {
    pub fn new(store: Arc<dyn FeedbackStore>) -> Self {
        Self { store }
    }

    pub async fn for_title(
        &self,
        kind: TitleKind,
        media_id: i64,
        page: u32,
    ) -> AppResult<Paginated<Comment>> {
        let (comments, total) = self
            .store
            .comments_for_title(kind, media_id, page, COMMENT_PAGE_SIZE)
            .await?;
        Ok(Paginated::new(comments, total, COMMENT_PAGE_SIZE))
    }

    pub async fn for_user(
        &self,
        kind: TitleKind,
        user_id: &str,
        page: u32,
    ) -> AppResult<Paginated<Comment>> {
        let (comments, total) = self
            .store
            .comments_for_user(kind, user_id, page, COMMENT_PAGE_SIZE)
            .await?;
        Ok(Paginated::new(comments, total, COMMENT_PAGE_SIZE))
    }

    pub async fn add(
        &self,
        kind: TitleKind,
        caller: &Caller,
        media_id: i64,
        content: &str,
    ) -> AppResult<Comment> {
        let content = validate_content(content)?;
        let comment = self
            .store
            .add_comment(kind, &caller.user_id, media_id, content)
            .await?;
        tracing::info!(comment_id = %comment.id, kind = %kind, media_id, "Comment added");
        Ok(comment)
    }

    /// Loads a comment the caller is allowed to change
    async fn owned(
        &self,
        kind: TitleKind,
        caller: &Caller,
        comment_id: Uuid,
    ) -> AppResult<Comment> {
        let comment = self
            .store
            .comment(kind, comment_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("comment {}", comment_id)))?;

        if !caller.can_modify(&comment.user_id) {
            tracing::warn!(
                comment_id = %comment_id,
                user_id = %caller.user_id,
                "Refusing to modify another user's comment"
            );
            return Err(AppError::Forbidden(
                "you are not allowed to modify this comment".to_string(),
            ));
        }
        Ok(comment)
    }

    pub async fn update(
        &self,
        kind: TitleKind,
        caller: &Caller,
        comment_id: Uuid,
        content: &str,
    ) -> AppResult<Comment> {
        let content = validate_content(content)?;
        self.owned(kind, caller, comment_id).await?;
        self.store.update_comment(kind, comment_id, content).await
    }

    pub async fn delete(
        &self,
        kind: TitleKind,
        caller: &Caller,
        comment_id: Uuid,
    ) -> AppResult<()> {
        self.owned(kind, caller, comment_id).await?;
        self.store.delete_comment(kind, comment_id).await?;
        tracing::info!(comment_id = %comment_id, kind = %kind, "Comment deleted");
        Ok(())
    }

    /// Comments created between two ISO dates, both days included
    pub async fn in_range(
        &self,
        kind: TitleKind,
        user_id: Option<&str>,
        start: &str,
        end: &str,
    ) -> AppResult<Vec<Comment>> {
        let start = parse_date(start)?;
        let end = parse_date(end)?;
        if start > end {
            return Err(AppError::InvalidInput(
                "start date must not be after end date".to_string(),
            ));
        }
        let end_exclusive = end
            .checked_add_days(Days::new(1))
            .ok_or_else(|| AppError::InvalidInput("end date out of range".to_string()))?;

        self.store
            .comments_in_range(
                kind,
                user_id,
                start.and_time(NaiveTime::MIN).and_utc(),
                end_exclusive.and_time(NaiveTime::MIN).and_utc(),
            )
            .await
    }

    /// Number of comments across every kind, optionally for one user
    pub async fn count(&self, user_id: Option<&str>) -> AppResult<u64> {
        let movies = self.store.count_comments(TitleKind::Movie, user_id).await?;
        let shows = self.store.count_comments(TitleKind::TvShow, user_id).await?;
        Ok(movies + shows)
    }
}
