use std::sync::Arc;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::{
    db::AvailabilityStore,
    error::{AppError, AppResult},
    models::{MediaKind, Movie, TitleKind, TitleList, TvEpisode, TvShow},
    services::{presence::PresenceResolver, providers::CatalogGateway},
};

/// A calendar month, `[first day, first day of next month)`, in a fixed time zone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarWindow {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

fn midnight(date: NaiveDate, offset: FixedOffset) -> AppResult<DateTime<FixedOffset>> {
    offset
        .from_local_datetime(&date.and_time(NaiveTime::MIN))
        .single()
        .ok_or_else(|| AppError::InvalidInput(format!("No midnight on {}", date)))
}

impl CalendarWindow {
    pub fn month(year: i32, month: u32, offset: FixedOffset) -> AppResult<Self> {
        let invalid = || AppError::InvalidInput(format!("Invalid month {}-{}", year, month));

        let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
        let next = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)
        }
        .ok_or_else(invalid)?;

        Ok(Self {
            start: midnight(first, offset)?,
            end: midnight(next, offset)?,
        })
    }

    /// The month containing `now`, as seen from `offset`
    pub fn current_month(now: DateTime<Utc>, offset: FixedOffset) -> AppResult<Self> {
        let local = now.with_timezone(&offset);
        Self::month(local.year(), local.month(), offset)
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start.date_naive()
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end.date_naive()
    }
}

/// Episodes airing in a window, their presence, and the shows they belong to
#[derive(Debug, Clone, PartialEq)]
pub struct ShowCalendar {
    pub episodes: TitleList<TvEpisode>,
    pub shows: Vec<TvShow>,
}

/// Releases of the titles a user follows
#[derive(Clone)]
pub struct CalendarService {
    store: Arc<dyn AvailabilityStore>,
    gateway: Arc<dyn CatalogGateway>,
    presence: PresenceResolver,
}

impl CalendarService {
    pub fn new(store: Arc<dyn AvailabilityStore>, gateway: Arc<dyn CatalogGateway>) -> Self {
        Self {
            presence: PresenceResolver::new(Arc::clone(&store)),
            store,
            gateway,
        }
    }

    /// Followed movies released in the window, in catalog order
    pub async fn movies(
        &self,
        user_id: &str,
        window: CalendarWindow,
    ) -> AppResult<TitleList<Movie>> {
        let followed = self.store.followed_ids(user_id, TitleKind::Movie).await?;
        if followed.is_empty() {
            return Ok(TitleList::new());
        }

        let movies = self
            .gateway
            .movie_releases(&followed, window.start_date(), window.end_date())
            .await?;

        let mut list = TitleList::with_capacity(movies.len());
        for movie in movies {
            let present = self.presence.is_available(movie.id, MediaKind::Movie).await?;
            list.push(movie, present);
        }

        tracing::info!(
            user_id = %user_id,
            followed = followed.len(),
            releases = list.len(),
            "Built movie calendar"
        );

        Ok(list)
    }

    /// Episodes of followed shows airing in the window, presence per episode
    pub async fn shows(&self, user_id: &str, window: CalendarWindow) -> AppResult<ShowCalendar> {
        let followed = self.store.followed_ids(user_id, TitleKind::TvShow).await?;
        if followed.is_empty() {
            return Ok(ShowCalendar {
                episodes: TitleList::new(),
                shows: Vec::new(),
            });
        }

        let (episodes, shows) = self
            .gateway
            .show_releases(&followed, window.start_date(), window.end_date())
            .await?;

        let mut list = TitleList::with_capacity(episodes.len());
        for episode in episodes {
            let present = self
                .presence
                .is_available(episode.id, MediaKind::Episode)
                .await?;
            list.push(episode, present);
        }

        tracing::info!(
            user_id = %user_id,
            followed = followed.len(),
            releases = list.len(),
            shows = shows.len(),
            "Built show calendar"
        );

        Ok(ShowCalendar {
            episodes: list,
            shows,
        })
    }
}
