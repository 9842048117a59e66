//! User comments and ratings, one pair of tables per title kind.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::schema::tables;
use crate::{
    error::AppResult,
    models::{Comment, Rating, TitleKind},
};

/// Newest-first page of rows plus the total number of matching rows
pub type Page<T> = (Vec<T>, u64);

#[async_trait::async_trait]
pub trait FeedbackStore: Send + Sync {
    async fn comments_for_title(
        &self,
        kind: TitleKind,
        media_id: i64,
        page: u32,
        page_size: u32,
    ) -> AppResult<Page<Comment>>;

    async fn comments_for_user(
        &self,
        kind: TitleKind,
        user_id: &str,
        page: u32,
        page_size: u32,
    ) -> AppResult<Page<Comment>>;

    /// Comments created in `[start, end)`, newest first, optionally for one user
    async fn comments_in_range(
        &self,
        kind: TitleKind,
        user_id: Option<&str>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<Comment>>;

    async fn comment(&self, kind: TitleKind, comment_id: Uuid) -> AppResult<Option<Comment>>;

    async fn add_comment(
        &self,
        kind: TitleKind,
        user_id: &str,
        media_id: i64,
        content: &str,
    ) -> AppResult<Comment>;

    async fn update_comment(
        &self,
        kind: TitleKind,
        comment_id: Uuid,
        content: &str,
    ) -> AppResult<Comment>;

    async fn delete_comment(&self, kind: TitleKind, comment_id: Uuid) -> AppResult<()>;

    async fn count_comments(&self, kind: TitleKind, user_id: Option<&str>) -> AppResult<u64>;

    async fn ratings_for_title(
        &self,
        kind: TitleKind,
        media_id: i64,
        page: u32,
        page_size: u32,
    ) -> AppResult<Page<Rating>>;

    async fn ratings_for_user(
        &self,
        kind: TitleKind,
        user_id: &str,
        page: u32,
        page_size: u32,
    ) -> AppResult<Page<Rating>>;

    async fn user_rating(
        &self,
        kind: TitleKind,
        user_id: &str,
        media_id: i64,
    ) -> AppResult<Option<Rating>>;

    /// Inserts or replaces the user's single rating of a title
    async fn save_rating(
        &self,
        kind: TitleKind,
        user_id: &str,
        media_id: i64,
        rating: i32,
    ) -> AppResult<Rating>;

    async fn count_ratings(&self, kind: TitleKind, user_id: Option<&str>) -> AppResult<u64>;
}

fn offset(page: u32, page_size: u32) -> i64 {
    i64::from(page.saturating_sub(1)) * i64::from(page_size)
}

fn comment_columns(kind: TitleKind) -> String {
    format!(
        "id, user_id, {}::int8 AS media_id, content, created_at, updated_at",
        tables(kind).title_fk
    )
}

fn rating_columns(kind: TitleKind) -> String {
    format!(
        "id, user_id, {}::int8 AS media_id, rating, created_at, updated_at",
        tables(kind).title_fk
    )
}

/// Postgres-backed comment and rating store
#[derive(Clone)]
pub struct PgFeedbackStore {
    pool: PgPool,
}

impl PgFeedbackStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn count_where(&self, table: &str, column: &str, value: &str) -> AppResult<u64> {
        let sql = format!("SELECT COUNT(*) FROM {} WHERE {} = $1", table, column);
        let count: i64 = sqlx::query_scalar(&sql)
            .bind(value)
            .fetch_one(&self.pool)
            .await?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn count_id(&self, table: &str, column: &str, value: i64) -> AppResult<u64> {
        let sql = format!("SELECT COUNT(*) FROM {} WHERE {} = $1", table, column);
        let count: i64 = sqlx::query_scalar(&sql)
            .bind(value)
            .fetch_one(&self.pool)
            .await?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}

#[async_trait::async_trait]
impl FeedbackStore for PgFeedbackStore {
    async fn comments_for_title(
        &self,
        kind: TitleKind,
        media_id: i64,
        page: u32,
        page_size: u32,
    ) -> AppResult<Page<Comment>> {
        let t = tables(kind);
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3",
            comment_columns(kind),
            t.comments,
            t.title_fk
        );
        let comments = sqlx::query_as::<_, Comment>(&sql)
            .bind(media_id)
            .bind(i64::from(page_size))
            .bind(offset(page, page_size))
            .fetch_all(&self.pool)
            .await?;
        let total = self.count_id(t.comments, t.title_fk, media_id).await?;
        Ok((comments, total))
    }

    async fn comments_for_user(
        &self,
        kind: TitleKind,
        user_id: &str,
        page: u32,
        page_size: u32,
    ) -> AppResult<Page<Comment>> {
        let t = tables(kind);
        let sql = format!(
            "SELECT {} FROM {} WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3",
            comment_columns(kind),
            t.comments
        );
        let comments = sqlx::query_as::<_, Comment>(&sql)
            .bind(user_id)
            .bind(i64::from(page_size))
            .bind(offset(page, page_size))
            .fetch_all(&self.pool)
            .await?;
        let total = self.count_where(t.comments, "user_id", user_id).await?;
        Ok((comments, total))
    }

    async fn comments_in_range(
        &self,
        kind: TitleKind,
        user_id: Option<&str>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<Comment>> {
        let t = tables(kind);
        let user_filter = if user_id.is_some() {
            " AND user_id = $3"
        } else {
            ""
        };
        let sql = format!(
            "SELECT {} FROM {} WHERE created_at >= $1 AND created_at < $2{} ORDER BY created_at DESC",
            comment_columns(kind),
            t.comments,
            user_filter
        );
        let mut query = sqlx::query_as::<_, Comment>(&sql).bind(start).bind(end);
        if let Some(user_id) = user_id {
            query = query.bind(user_id);
        }
        Ok(query.fetch_all(&self.pool).await?)
    }

    async fn comment(&self, kind: TitleKind, comment_id: Uuid) -> AppResult<Option<Comment>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE id = $1",
            comment_columns(kind),
            tables(kind).comments
        );
        let comment = sqlx::query_as::<_, Comment>(&sql)
            .bind(comment_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(comment)
    }

    async fn add_comment(
        &self,
        kind: TitleKind,
        user_id: &str,
        media_id: i64,
        content: &str,
    ) -> AppResult<Comment> {
        let t = tables(kind);
        let sql = format!(
            "INSERT INTO {} (id, user_id, {}, content, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, NOW(), NOW()) RETURNING {}",
            t.comments,
            t.title_fk,
            comment_columns(kind)
        );
        let comment = sqlx::query_as::<_, Comment>(&sql)
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(media_id)
            .bind(content)
            .fetch_one(&self.pool)
            .await?;
        Ok(comment)
    }

    async fn update_comment(
        &self,
        kind: TitleKind,
        comment_id: Uuid,
        content: &str,
    ) -> AppResult<Comment> {
        let sql = format!(
            "UPDATE {} SET content = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            tables(kind).comments,
            comment_columns(kind)
        );
        let comment = sqlx::query_as::<_, Comment>(&sql)
            .bind(comment_id)
            .bind(content)
            .fetch_one(&self.pool)
            .await?;
        Ok(comment)
    }

    async fn delete_comment(&self, kind: TitleKind, comment_id: Uuid) -> AppResult<()> {
        let sql = format!("DELETE FROM {} WHERE id = $1", tables(kind).comments);
        sqlx::query(&sql)
            .bind(comment_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn count_comments(&self, kind: TitleKind, user_id: Option<&str>) -> AppResult<u64> {
        let table = tables(kind).comments;
        match user_id {
            Some(user_id) => self.count_where(table, "user_id", user_id).await,
            None => {
                let sql = format!("SELECT COUNT(*) FROM {}", table);
                let count: i64 = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;
                Ok(u64::try_from(count).unwrap_or(0))
            }
        }
    }

    async fn ratings_for_title(
        &self,
        kind: TitleKind,
        media_id: i64,
        page: u32,
        page_size: u32,
    ) -> AppResult<Page<Rating>> {
        let t = tables(kind);
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3",
            rating_columns(kind),
            t.ratings,
            t.title_fk
        );
        let ratings = sqlx::query_as::<_, Rating>(&sql)
            .bind(media_id)
            .bind(i64::from(page_size))
            .bind(offset(page, page_size))
            .fetch_all(&self.pool)
            .await?;
        let total = self.count_id(t.ratings, t.title_fk, media_id).await?;
        Ok((ratings, total))
    }

    async fn ratings_for_user(
        &self,
        kind: TitleKind,
        user_id: &str,
        page: u32,
        page_size: u32,
    ) -> AppResult<Page<Rating>> {
        let t = tables(kind);
        let sql = format!(
            "SELECT {} FROM {} WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3",
            rating_columns(kind),
            t.ratings
        );
        let ratings = sqlx::query_as::<_, Rating>(&sql)
            .bind(user_id)
            .bind(i64::from(page_size))
            .bind(offset(page, page_size))
            .fetch_all(&self.pool)
            .await?;
        let total = self.count_where(t.ratings, "user_id", user_id).await?;
        Ok((ratings, total))
    }

    async fn user_rating(
        &self,
        kind: TitleKind,
        user_id: &str,
        media_id: i64,
    ) -> AppResult<Option<Rating>> {
        let t = tables(kind);
        let sql = format!(
            "SELECT {} FROM {} WHERE user_id = $1 AND {} = $2",
            rating_columns(kind),
            t.ratings,
            t.title_fk
        );
        let rating = sqlx::query_as::<_, Rating>(&sql)
            .bind(user_id)
            .bind(media_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(rating)
    }

    async fn save_rating(
        &self,
        kind: TitleKind,
        user_id: &str,
        media_id: i64,
        rating: i32,
    ) -> AppResult<Rating> {
        let t = tables(kind);
        let sql = format!(
            "INSERT INTO {table} (id, user_id, {fk}, rating, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, NOW(), NOW()) \
             ON CONFLICT (user_id, {fk}) DO UPDATE SET rating = EXCLUDED.rating, updated_at = NOW() \
             RETURNING {columns}",
            table = t.ratings,
            fk = t.title_fk,
            columns = rating_columns(kind)
        );
        let saved = sqlx::query_as::<_, Rating>(&sql)
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(media_id)
            .bind(rating)
            .fetch_one(&self.pool)
            .await?;
        Ok(saved)
    }

    async fn count_ratings(&self, kind: TitleKind, user_id: Option<&str>) -> AppResult<u64> {
        let table = tables(kind).ratings;
        match user_id {
            Some(user_id) => self.count_where(table, "user_id", user_id).await,
            None => {
                let sql = format!("SELECT COUNT(*) FROM {}", table);
                let count: i64 = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;
                Ok(u64::try_from(count).unwrap_or(0))
            }
        }
    }
}
