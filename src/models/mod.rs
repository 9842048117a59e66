use serde::{Deserialize, Serialize};
use std::fmt::Display;

pub mod local;
pub mod title;
pub mod tmdb;

pub use local::{
    AvailabilityRecord, Caller, Comment, ListFilter, RankMode, Rating, RatingAggregate,
    WatchStatus,
};
pub use title::{Actor, CatalogTitle, Genre, Movie, Person, Studio, TvEpisode, TvShow};

/// Fixed page size of every discovery listing
pub const PAGE_SIZE: u32 = 20;

/// Trailing window used to rank "popular" available titles
pub const POPULAR_WINDOW_DAYS: u32 = 30;

/// Kind of title that can be listed, rated and commented on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TitleKind {
    #[serde(rename = "movie")]
    Movie,
    #[serde(rename = "tv")]
    TvShow,
}

impl Display for TitleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TitleKind::Movie => write!(f, "movie"),
            TitleKind::TvShow => write!(f, "tv"),
        }
    }
}

/// Anything that can have a media file on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Movie,
    TvShow,
    Episode,
}

impl From<TitleKind> for MediaKind {
    fn from(kind: TitleKind) -> Self {
        match kind {
            TitleKind::Movie => MediaKind::Movie,
            TitleKind::TvShow => MediaKind::TvShow,
        }
    }
}

impl Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Movie => write!(f, "movie"),
            MediaKind::TvShow => write!(f, "tv_show"),
            MediaKind::Episode => write!(f, "episode"),
        }
    }
}

/// Number of pages needed to hold `total_results` items
pub fn total_pages(total_results: u64, page_size: u32) -> u64 {
    if page_size == 0 {
        return 0;
    }
    total_results.div_ceil(u64::from(page_size))
}

/// One page of a remote listing, in the catalog's own order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    pub results: Vec<T>,
    pub total_result_count: u64,
    pub total_page_count: u64,
}

impl<T> Paginated<T> {
    /// Wraps one page of rows, deriving the page count from `page_size`
    pub fn new(results: Vec<T>, total_result_count: u64, page_size: u32) -> Self {
        Self {
            results,
            total_result_count,
            total_page_count: total_pages(total_result_count, page_size),
        }
    }

    pub fn empty() -> Self {
        Self {
            results: Vec::new(),
            total_result_count: 0,
            total_page_count: 0,
        }
    }
}

/// Titles paired index-for-index with their on-disk presence.
///
/// The two sequences can only be built and consumed together, so they never
/// drift out of alignment.
#[derive(Debug, Clone, PartialEq)]
pub struct TitleList<T> {
    results: Vec<T>,
    presence: Vec<bool>,
}

impl<T> TitleList<T> {
    pub fn new() -> Self {
        Self {
            results: Vec::new(),
            presence: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            results: Vec::with_capacity(capacity),
            presence: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, item: T, present: bool) {
        self.results.push(item);
        self.presence.push(present);
    }

    pub fn results(&self) -> &[T] {
        &self.results
    }

    pub fn presence(&self) -> &[bool] {
        &self.presence
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&T, bool)> {
        self.results.iter().zip(self.presence.iter().copied())
    }

    pub fn into_parts(self) -> (Vec<T>, Vec<bool>) {
        (self.results, self.presence)
    }
}

impl<T> Default for TitleList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<(T, bool)> for TitleList<T> {
    fn from_iter<I: IntoIterator<Item = (T, bool)>>(iter: I) -> Self {
        let mut list = TitleList::new();
        for (item, present) in iter {
            list.push(item, present);
        }
        list
    }
}

impl<T> IntoIterator for TitleList<T> {
    type Item = (T, bool);
    type IntoIter = std::iter::Zip<std::vec::IntoIter<T>, std::vec::IntoIter<bool>>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter().zip(self.presence)
    }
}

/// A discovery page: ordered titles, their presence, and pagination totals
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveryPage<T> {
    pub titles: TitleList<T>,
    pub total_result_count: u64,
    pub total_page_count: u64,
}

impl<T> DiscoveryPage<T> {
    pub fn new(titles: TitleList<T>, total_result_count: u64, page_size: u32) -> Self {
        Self {
            titles,
            total_result_count,
            total_page_count: total_pages(total_result_count, page_size),
        }
    }
}
