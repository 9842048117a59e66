use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    middleware,
    routing::get,
    Json, Router,
};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::{make_span_with_request_id, request_id_middleware},
    models::{Caller, DiscoveryPage, TitleList},
    services::{
        AssetService, CalendarService, CommentService, DiscoveryService, MediaInfoService,
        RatingService,
    },
};

pub mod calendar;
pub mod comments;
pub mod discover;
pub mod media;
pub mod ratings;

pub const USER_ID_HEADER: &str = "user-id";
pub const ROLES_HEADER: &str = "roles";

/// Shared application state
pub struct AppState {
    pub discovery: DiscoveryService,
    pub media_info: MediaInfoService,
    pub assets: AssetService,
    pub calendar: CalendarService,
    pub comments: CommentService,
    pub ratings: RatingService,
    /// Time zone of the "current month" calendar window
    pub calendar_offset: FixedOffset,
}

/// Creates the application router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/discover", discover::routes())
        .nest("/media", media::routes())
        .nest("/calendar", calendar::routes())
        .nest("/comments", comments::routes())
        .nest("/ratings", ratings::routes())
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// `page` and `available` as sent by clients. Garbage falls back to the
/// defaults instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct ListingQuery {
    page: Option<String>,
    available: Option<String>,
}

impl ListingQuery {
    pub fn page(&self) -> u32 {
        parse_page(self.page.as_deref())
    }

    pub fn available(&self) -> bool {
        self.available
            .as_deref()
            .and_then(|value| value.trim().parse::<bool>().ok())
            .unwrap_or(false)
    }
}

/// Page number from a raw query value; anything but a positive integer is page 1
pub fn parse_page(raw: Option<&str>) -> u32 {
    raw.and_then(|value| value.trim().parse::<u32>().ok())
        .filter(|page| *page > 0)
        .unwrap_or(1)
}

/// Parses a required positive id coming from a query string
pub fn parse_id(raw: Option<&str>, name: &str) -> AppResult<i64> {
    let raw = raw.ok_or_else(|| AppError::InvalidInput(format!("missing '{}'", name)))?;
    raw.trim()
        .parse::<i64>()
        .ok()
        .and_then(|id| positive_id(id).ok())
        .ok_or_else(|| AppError::InvalidInput(format!("'{}' must be a positive integer", name)))
}

/// Parses a required comma-separated list of positive ids, keeping its order
pub fn parse_ids(raw: Option<&str>, name: &str) -> AppResult<Vec<i64>> {
    let raw = raw.ok_or_else(|| AppError::InvalidInput(format!("missing '{}'", name)))?;
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| parse_id(Some(part), name))
        .collect()
}

pub fn positive_id(id: i64) -> AppResult<i64> {
    if id <= 0 {
        return Err(AppError::InvalidInput(format!(
            "id must be a positive integer, got {}",
            id
        )));
    }
    Ok(id)
}

/// Titles with their presence flags and pagination totals
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse<T> {
    pub results: Vec<T>,
    pub presence: Vec<bool>,
    pub total_result_count: u64,
    pub total_page_count: u64,
}

impl<T> From<DiscoveryPage<T>> for PageResponse<T> {
    fn from(page: DiscoveryPage<T>) -> Self {
        let (results, presence) = page.titles.into_parts();
        Self {
            results,
            presence,
            total_result_count: page.total_result_count,
            total_page_count: page.total_page_count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub results: Vec<T>,
    pub presence: Vec<bool>,
}

impl<T> From<TitleList<T>> for ListResponse<T> {
    fn from(list: TitleList<T>) -> Self {
        let (results, presence) = list.into_parts();
        Self { results, presence }
    }
}

/// The identity forwarded in the `user-id` and `roles` headers
#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                AppError::InvalidInput(format!("missing '{}' header", USER_ID_HEADER))
            })?;
        let roles = parts
            .headers
            .get(ROLES_HEADER)
            .and_then(|value| value.to_str().ok());

        Ok(Caller::new(user_id, roles))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_defaults_to_one() {
        assert_eq!(parse_page(None), 1);
        assert_eq!(parse_page(Some("abc")), 1);
        assert_eq!(parse_page(Some("0")), 1);
        assert_eq!(parse_page(Some("-3")), 1);
        assert_eq!(parse_page(Some(" 4 ")), 4);
    }

    #[test]
    fn test_parse_ids_keeps_order() {
        assert_eq!(parse_ids(Some("603, 550,,13"), "ids").unwrap(), vec![603, 550, 13]);
        assert_eq!(parse_ids(Some(""), "ids").unwrap(), Vec::<i64>::new());
        assert!(matches!(
            parse_ids(Some("603,abc"), "ids"),
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            parse_ids(Some("603,-1"), "ids"),
            Err(AppError::InvalidInput(_))
        ));
        assert!(parse_ids(None, "ids").is_err());
    }

    #[test]
    fn test_available_defaults_to_false() {
        let query = |available: Option<&str>| ListingQuery {
            page: None,
            available: available.map(str::to_string),
        };
        assert!(!query(None).available());
        assert!(!query(Some("yes")).available());
        assert!(!query(Some("false")).available());
        assert!(query(Some("true")).available());
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id(Some("28"), "id").unwrap(), 28);
        assert!(parse_id(None, "id").is_err());
        assert!(parse_id(Some("0"), "id").is_err());
        assert!(parse_id(Some("twelve"), "id").is_err());
    }

    #[test]
    fn test_page_response_shape() {
        let titles: TitleList<&str> = vec![("a", true), ("b", false)].into_iter().collect();
        let response = PageResponse::from(DiscoveryPage::new(titles, 21, 20));
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["results"], json!(["a", "b"]));
        assert_eq!(json["presence"], json!([true, false]));
        assert_eq!(json["totalResultCount"], 21);
        assert_eq!(json["totalPageCount"], 2);
    }
}
