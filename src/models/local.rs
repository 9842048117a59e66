use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Locally known title, as returned by a ranked availability listing
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct AvailabilityRecord {
    /// External catalog id, also the local primary key
    pub id: i64,
    pub name: String,
    pub release_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    /// Average over the ranking window, `None` when nobody rated it in that window
    pub average_rating: Option<f64>,
}

/// Locally computed rating. Only ever built from at least one rating row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingAggregate {
    pub average: f32,
    pub count: i64,
}

impl RatingAggregate {
    /// Builds an aggregate from a `SUM`/`COUNT` pair; no rows means no aggregate.
    pub fn from_sum(sum: i64, count: i64) -> Option<Self> {
        if count <= 0 {
            return None;
        }
        Some(Self {
            average: sum as f32 / count as f32,
            count,
        })
    }
}

/// How a page of available titles is ordered before pagination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankMode {
    /// Average rating over the trailing `days`, best first, then name
    RatingWindow { days: u32 },
    /// Name ascending, then all-time average rating
    Name,
    /// Most recently added first
    CreatedAt,
}

/// Restricts which available titles are listed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListFilter {
    All,
    /// Case-insensitive substring match on the display name
    NameContains(String),
    /// Titles tagged with a catalog genre id
    Genre(i64),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub user_id: String,
    pub media_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    pub id: Uuid,
    pub user_id: String,
    pub media_id: i64,
    pub rating: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Rating {
    /// Placeholder returned when a user has not rated a title yet
    pub fn unrated(user_id: &str, media_id: i64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::nil(),
            user_id: user_id.to_string(),
            media_id,
            rating: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Status of a watch-list entry. Abandoned titles are not followed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WatchStatus {
    PlanToWatch,
    Watching,
    Finished,
    Abandoned,
}

impl WatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WatchStatus::PlanToWatch => "PLAN_TO_WATCH",
            WatchStatus::Watching => "WATCHING",
            WatchStatus::Finished => "FINISHED",
            WatchStatus::Abandoned => "ABANDONED",
        }
    }
}

/// Role that may edit or delete anybody's comments
pub const ADMIN_ROLE: &str = "bingemate-admin";

/// Identity forwarded by the gateway in front of the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: String,
    pub is_admin: bool,
}

impl Caller {
    pub fn new(user_id: impl Into<String>, roles: Option<&str>) -> Self {
        Self {
            user_id: user_id.into(),
            is_admin: roles.is_some_and(|roles| roles.contains(ADMIN_ROLE)),
        }
    }

    /// Whether this caller may change something owned by `owner_id`
    pub fn can_modify(&self, owner_id: &str) -> bool {
        self.is_admin || self.user_id == owner_id
    }
}
