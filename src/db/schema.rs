use crate::models::TitleKind;

/// Table and column names holding one kind of title and its user data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindTables {
    pub titles: &'static str,
    /// Foreign key column naming the title in every child table
    pub title_fk: &'static str,
    pub ratings: &'static str,
    pub comments: &'static str,
    pub categories: &'static str,
    pub watch_list: &'static str,
}

const MOVIE_TABLES: KindTables = KindTables {
    titles: "movies",
    title_fk: "movie_id",
    ratings: "movie_ratings",
    comments: "movie_comments",
    categories: "movie_categories",
    watch_list: "movie_watch_list_item",
};

const TV_SHOW_TABLES: KindTables = KindTables {
    titles: "tv_shows",
    title_fk: "tv_show_id",
    ratings: "tv_show_ratings",
    comments: "tv_show_comments",
    categories: "tv_show_categories",
    watch_list: "tv_show_watch_list_item",
};

pub fn tables(kind: TitleKind) -> KindTables {
    match kind {
        TitleKind::Movie => MOVIE_TABLES,
        TitleKind::TvShow => TV_SHOW_TABLES,
    }
}

/// Condition, over a title aliased `alias`, that holds when it has a file on disk.
///
/// Movies carry their own file reference; a show counts once any of its
/// episodes has one.
pub fn available_condition(kind: TitleKind, alias: &str) -> String {
    match kind {
        TitleKind::Movie => format!("{}.media_file_id IS NOT NULL", alias),
        TitleKind::TvShow => format!(
            "EXISTS (SELECT 1 FROM episodes e WHERE e.tv_show_id = {}.id AND e.media_file_id IS NOT NULL)",
            alias
        ),
    }
}
