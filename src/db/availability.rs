//! Local store of downloaded titles: presence, local ratings and ranked listings.

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;

use super::schema::{available_condition, tables};
use crate::{
    error::AppResult,
    models::{
        AvailabilityRecord, ListFilter, MediaKind, RankMode, RatingAggregate, TitleKind,
        WatchStatus,
    },
};

/// Maximum number of ids returned by the comment ranking
pub const MOST_COMMENTED_LIMIT: i64 = 20;

/// Read side of the local availability store
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait AvailabilityStore: Send + Sync {
    /// Whether a playable file exists for the id. Absence is `Ok(false)`.
    async fn is_present(&self, external_id: i64, kind: MediaKind) -> AppResult<bool>;

    /// Local average rating, optionally over the trailing `window_days` only.
    ///
    /// `Ok(None)` when no rating row matches.
    async fn local_rating(
        &self,
        external_id: i64,
        kind: TitleKind,
        window_days: Option<u32>,
    ) -> AppResult<Option<RatingAggregate>>;

    /// One ranked page of available titles and the total matching the filter
    async fn list_available(
        &self,
        kind: TitleKind,
        page: u32,
        page_size: u32,
        filter: ListFilter,
        rank: RankMode,
    ) -> AppResult<(Vec<AvailabilityRecord>, u64)>;

    /// Titles a user follows, excluding abandoned ones
    async fn followed_ids(&self, user_id: &str, kind: TitleKind) -> AppResult<Vec<i64>>;

    /// Ids with the most comments, most commented first
    async fn most_commented(&self, kind: TitleKind, only_available: bool) -> AppResult<Vec<i64>>;
}

/// A positional SQL parameter
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Text(String),
    Int(i64),
    Timestamp(DateTime<Utc>),
}

/// A ranked listing query and its `COUNT` companion.
///
/// Filter parameters come first, so `count_params` is always a prefix of
/// `params`.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingSql {
    pub select: String,
    pub count: String,
    pub params: Vec<SqlParam>,
    pub count_params: usize,
}

/// Escapes `LIKE` wildcards so user text only matches literally
fn escape_like(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Builds the ranked, paginated listing of available titles.
///
/// Ratings are outer-joined so unrated titles are listed too; their average is
/// NULL and sorts after every rated title.
pub fn listing_sql(
    kind: TitleKind,
    filter: &ListFilter,
    rank: RankMode,
    page: u32,
    page_size: u32,
    now: DateTime<Utc>,
) -> ListingSql {
    let t = tables(kind);
    let mut params = Vec::new();
    let mut conditions = vec![available_condition(kind, "t")];

    match filter {
        ListFilter::All => {}
        ListFilter::NameContains(query) => {
            params.push(SqlParam::Text(escape_like(query)));
            conditions.push(format!("t.name ILIKE ${}", params.len()));
        }
        ListFilter::Genre(genre_id) => {
            params.push(SqlParam::Int(*genre_id));
            conditions.push(format!(
                "EXISTS (SELECT 1 FROM {} c WHERE c.{} = t.id AND c.category_id = ${})",
                t.categories,
                t.title_fk,
                params.len()
            ));
        }
    }
    let where_clause = conditions.join(" AND ");
    let count_params = params.len();

    let mut join = format!("LEFT JOIN {} r ON r.{} = t.id", t.ratings, t.title_fk);
    if let RankMode::RatingWindow { days } = rank {
        params.push(SqlParam::Timestamp(now - Duration::days(i64::from(days))));
        join.push_str(&format!(" AND r.created_at > ${}", params.len()));
    }

    let order = match rank {
        RankMode::RatingWindow { .. } => "average_rating DESC NULLS LAST, t.name ASC, t.id ASC",
        RankMode::Name => "t.name ASC, average_rating DESC NULLS LAST, t.id ASC",
        RankMode::CreatedAt => "t.created_at DESC, t.updated_at DESC, t.id ASC",
    };

    let offset = u64::from(page.saturating_sub(1)) * u64::from(page_size);
    params.push(SqlParam::Int(i64::from(page_size)));
    let limit_idx = params.len();
    params.push(SqlParam::Int(i64::try_from(offset).unwrap_or(i64::MAX)));
    let offset_idx = params.len();

    let select = format!(
        "SELECT t.id, t.name, t.release_date, t.created_at, AVG(r.rating)::float8 AS average_rating \
         FROM {titles} t {join} \
         WHERE {where_clause} \
         GROUP BY t.id \
         ORDER BY {order} \
         LIMIT ${limit_idx} OFFSET ${offset_idx}",
        titles = t.titles,
    );
    let count = format!(
        "SELECT COUNT(*) FROM {} t WHERE {}",
        t.titles, where_clause
    );

    ListingSql {
        select,
        count,
        params,
        count_params,
    }
}

pub fn presence_sql(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Movie => {
            "SELECT EXISTS (SELECT 1 FROM movies WHERE id = $1 AND media_file_id IS NOT NULL)"
        }
        MediaKind::TvShow => {
            "SELECT EXISTS (SELECT 1 FROM episodes WHERE tv_show_id = $1 AND media_file_id IS NOT NULL)"
        }
        MediaKind::Episode => {
            "SELECT EXISTS (SELECT 1 FROM episodes WHERE id = $1 AND media_file_id IS NOT NULL)"
        }
    }
}

/// `SUM`/`COUNT` of a title's ratings; windowed queries take the cutoff as `$2`
pub fn rating_sql(kind: TitleKind, windowed: bool) -> String {
    let t = tables(kind);
    let mut sql = format!(
        "SELECT COALESCE(SUM(rating), 0)::int8 AS total, COUNT(*) AS count FROM {} WHERE {} = $1",
        t.ratings, t.title_fk
    );
    if windowed {
        sql.push_str(" AND created_at > $2");
    }
    sql
}

pub fn followed_sql(kind: TitleKind) -> String {
    let t = tables(kind);
    format!(
        "SELECT {fk}::int8 FROM {list} WHERE user_id = $1 AND status <> $2 ORDER BY {fk}",
        fk = t.title_fk,
        list = t.watch_list
    )
}

pub fn most_commented_sql(kind: TitleKind, only_available: bool) -> String {
    let t = tables(kind);
    let (join, filter) = if only_available {
        (
            format!("JOIN {} t ON t.id = c.{}", t.titles, t.title_fk),
            format!(" WHERE {}", available_condition(kind, "t")),
        )
    } else {
        (String::new(), String::new())
    };
    format!(
        "SELECT c.{fk}::int8 FROM {comments} c {join}{filter} \
         GROUP BY c.{fk} ORDER BY COUNT(c.id) DESC, c.{fk} ASC LIMIT $1",
        fk = t.title_fk,
        comments = t.comments,
    )
}

#[derive(sqlx::FromRow)]
struct RatingTotals {
    total: i64,
    count: i64,
}

/// Postgres-backed availability store
#[derive(Clone)]
pub struct PgAvailabilityStore {
    pool: PgPool,
}

impl PgAvailabilityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl AvailabilityStore for PgAvailabilityStore {
    async fn is_present(&self, external_id: i64, kind: MediaKind) -> AppResult<bool> {
        let present: bool = sqlx::query_scalar(presence_sql(kind))
            .bind(external_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(present)
    }

    async fn local_rating(
        &self,
        external_id: i64,
        kind: TitleKind,
        window_days: Option<u32>,
    ) -> AppResult<Option<RatingAggregate>> {
        let sql = rating_sql(kind, window_days.is_some());
        let mut query = sqlx::query_as::<_, RatingTotals>(&sql).bind(external_id);
        if let Some(days) = window_days {
            query = query.bind(Utc::now() - Duration::days(i64::from(days)));
        }
        let totals = query.fetch_one(&self.pool).await?;

        Ok(RatingAggregate::from_sum(totals.total, totals.count))
    }

    async fn list_available(
        &self,
        kind: TitleKind,
        page: u32,
        page_size: u32,
        filter: ListFilter,
        rank: RankMode,
    ) -> AppResult<(Vec<AvailabilityRecord>, u64)> {
        let sql = listing_sql(kind, &filter, rank, page, page_size, Utc::now());

        let mut select = sqlx::query_as::<_, AvailabilityRecord>(&sql.select);
        for param in &sql.params {
            select = match param {
                SqlParam::Text(v) => select.bind(v.clone()),
                SqlParam::Int(v) => select.bind(*v),
                SqlParam::Timestamp(v) => select.bind(*v),
            };
        }

        let mut count = sqlx::query_scalar::<_, i64>(&sql.count);
        for param in &sql.params[..sql.count_params] {
            count = match param {
                SqlParam::Text(v) => count.bind(v.clone()),
                SqlParam::Int(v) => count.bind(*v),
                SqlParam::Timestamp(v) => count.bind(*v),
            };
        }

        let rows = select.fetch_all(&self.pool).await?;
        let total = count.fetch_one(&self.pool).await?;

        tracing::debug!(
            kind = %kind,
            page,
            rows = rows.len(),
            total,
            "Listed available titles"
        );

        Ok((rows, u64::try_from(total).unwrap_or(0)))
    }

    async fn followed_ids(&self, user_id: &str, kind: TitleKind) -> AppResult<Vec<i64>> {
        let ids = sqlx::query_scalar::<_, i64>(&followed_sql(kind))
            .bind(user_id)
            .bind(WatchStatus::Abandoned.as_str())
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }

    async fn most_commented(&self, kind: TitleKind, only_available: bool) -> AppResult<Vec<i64>> {
        let ids = sqlx::query_scalar::<_, i64>(&most_commented_sql(kind, only_available))
            .bind(MOST_COMMENTED_LIMIT)
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }
}
