mod common;

use std::{sync::Arc, time::Duration};

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use chrono::FixedOffset;
use serde_json::{json, Value};

use common::{episode, movie, record, show, FakeAvailability, FakeCatalog, FakeFeedback};
use marquee_api::{
    db::{AvailabilityStore, FeedbackStore},
    models::{Actor, Genre, MediaKind, Paginated, Studio, TitleKind, TvEpisode},
    routes::{create_router, AppState},
    services::{
        providers::CatalogGateway, AssetService, CalendarService, CommentService,
        DiscoveryService, MediaInfoService, RatingService,
    },
};

fn create_test_server(catalog: FakeCatalog, store: FakeAvailability) -> TestServer {
    let gateway: Arc<dyn CatalogGateway> = Arc::new(catalog);
    let availability: Arc<dyn AvailabilityStore> = Arc::new(store);
    let feedback: Arc<dyn FeedbackStore> = Arc::new(FakeFeedback::new());

    let state = Arc::new(AppState {
        discovery: DiscoveryService::new(
            Arc::clone(&gateway),
            Arc::clone(&availability),
            Duration::from_secs(5),
        ),
        media_info: MediaInfoService::new(
            Arc::clone(&availability),
            Arc::clone(&gateway),
            Duration::from_secs(5),
        ),
        assets: AssetService::new(Arc::clone(&gateway)),
        calendar: CalendarService::new(availability, gateway),
        comments: CommentService::new(Arc::clone(&feedback)),
        ratings: RatingService::new(feedback),
        calendar_offset: FixedOffset::east_opt(0).unwrap(),
    });

    TestServer::new(create_router(state)).unwrap()
}

fn empty_server() -> TestServer {
    create_test_server(FakeCatalog::new(), FakeAvailability::new())
}

fn user(id: &'static str) -> (HeaderName, HeaderValue) {
    (HeaderName::from_static("user-id"), HeaderValue::from_static(id))
}

#[tokio::test]
async fn test_health_check() {
    let server = empty_server();
    let response = server.get("/health").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["status"], "healthy");
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let server = empty_server();

    let response = server
        .get("/health")
        .add_header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_static("trace-abc"),
        )
        .await;

    assert_eq!(response.header("x-request-id"), "trace-abc");
}

#[tokio::test]
async fn test_popular_available_response_shape() {
    let mut catalog = FakeCatalog::new();
    let mut store = FakeAvailability::new();
    for id in 1..=25 {
        catalog = catalog.with_movie(movie(id, &format!("Movie {:02}", id)));
        store = store.with_record(
            TitleKind::Movie,
            record(id, &format!("Movie {:02}", id), Some(id as f64)),
        );
    }
    let server = create_test_server(catalog, store);

    let response = server
        .get("/api/v1/discover/movie/popular")
        .add_query_param("available", "true")
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["totalResultCount"], 25);
    assert_eq!(body["totalPageCount"], 2);
    assert_eq!(body["results"].as_array().unwrap().len(), 20);
    assert_eq!(body["results"][0]["id"], 25);
    assert_eq!(body["presence"].as_array().unwrap().len(), 20);
}

#[tokio::test]
async fn test_unparsable_flags_fall_back_to_defaults() {
    let listing = Paginated {
        results: vec![movie(1, "Remote")],
        total_result_count: 1,
        total_page_count: 1,
    };
    let catalog = FakeCatalog::new().with_movie_listing(listing);
    let server = create_test_server(catalog, FakeAvailability::new());

    let response = server
        .get("/api/v1/discover/movie/popular")
        .add_query_param("available", "maybe")
        .add_query_param("page", "first")
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["results"][0]["title"], "Remote");
    assert_eq!(body["presence"], json!([false]));
}

#[tokio::test]
async fn test_empty_search_is_bad_request() {
    let server = empty_server();

    let response = server
        .get("/api/v1/discover/tv/search")
        .add_query_param("query", " ")
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(response.json::<Value>()["error"].is_string());
}

#[tokio::test]
async fn test_genre_requires_positive_id() {
    let server = empty_server();

    let response = server
        .get("/api/v1/discover/movie/genre")
        .add_query_param("id", "-4")
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_movie_details() {
    let catalog = FakeCatalog::new().with_movie(movie(603, "The Matrix"));
    let store = FakeAvailability::new()
        .with_present(603, MediaKind::Movie)
        .with_rating(603, TitleKind::Movie, 4.0, 12);
    let server = create_test_server(catalog, store);

    let response = server.get("/api/v1/media/movie/603").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["title"], "The Matrix");
    assert_eq!(body["present"], true);
    assert_eq!(body["voteCount"], 12);
}

#[tokio::test]
async fn test_unknown_movie_is_not_found() {
    let server = empty_server();

    let response = server.get("/api/v1/media/movie/42").await;

    response.assert_status_not_found();
}

#[tokio::test]
async fn test_episode_details() {
    let catalog = FakeCatalog::new().with_episode(episode(63056, 1399, 1, "2011-04-17"));
    let server = create_test_server(catalog, FakeAvailability::new());

    let response = server
        .get("/api/v1/media/tv/1399/season/1/episode/1")
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["id"], 63056);
    assert_eq!(body["present"], false);
}

#[tokio::test]
async fn test_calendar_requires_user() {
    let server = empty_server();

    let response = server
        .get("/api/v1/calendar/movies")
        .add_query_param("month", "3")
        .add_query_param("year", "2024")
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_movie_calendar() {
    let mut released = movie(10, "Ten");
    released.release_date = "2024-03-08".to_string();
    let catalog = FakeCatalog::new().with_movie(released);
    let store = FakeAvailability::new()
        .with_followed("alice", TitleKind::Movie, vec![10])
        .with_present(10, MediaKind::Movie);
    let server = create_test_server(catalog, store);

    let (name, value) = user("alice");
    let response = server
        .get("/api/v1/calendar/movies")
        .add_query_param("month", "3")
        .add_query_param("year", "2024")
        .add_header(name, value)
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["results"][0]["id"], 10);
    assert_eq!(body["presence"], json!([true]));
}

#[tokio::test]
async fn test_comment_lifecycle() {
    let server = empty_server();

    let (name, value) = user("alice");
    let response = server
        .post("/api/v1/comments/movie/603")
        .add_header(name, value)
        .json(&json!({ "content": "  Whoa.  " }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let created: Value = response.json();
    assert_eq!(created["content"], "Whoa.");
    let comment_id = created["id"].as_str().unwrap().to_string();

    let (name, value) = user("mallory");
    let response = server
        .delete(&format!("/api/v1/comments/movie/entry/{}", comment_id))
        .add_header(name, value)
        .await;
    response.assert_status(StatusCode::FORBIDDEN);

    let response = server.get("/api/v1/comments/movie/603").await;
    response.assert_status_ok();
    let page: Value = response.json();
    assert_eq!(page["totalResultCount"], 1);

    let (name, value) = user("alice");
    let response = server
        .delete(&format!("/api/v1/comments/movie/entry/{}", comment_id))
        .add_header(name, value)
        .await;
    response.assert_status(StatusCode::NO_CONTENT);

    let response = server.get("/api/v1/comments/count").await;
    assert_eq!(response.json::<Value>()["count"], 0);
}

#[tokio::test]
async fn test_rating_round() {
    let server = empty_server();

    let (name, value) = user("alice");
    let response = server
        .get("/api/v1/ratings/tv/1399/own")
        .add_header(name, value)
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["rating"], 0);

    let (name, value) = user("alice");
    let response = server
        .post("/api/v1/ratings/tv/1399")
        .add_header(name, value)
        .json(&json!({ "rating": 9 }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let (name, value) = user("alice");
    let response = server
        .post("/api/v1/ratings/tv/1399")
        .add_header(name, value)
        .json(&json!({ "rating": 4 }))
        .await;
    response.assert_status_ok();

    let response = server
        .get("/api/v1/ratings/count")
        .add_query_param("user", "alice")
        .await;
    assert_eq!(response.json::<Value>()["count"], 1);
}

fn genre(id: i64, name: &str) -> Genre {
    Genre {
        id,
        name: name.to_string(),
    }
}

fn season_episode(id: i64, show_id: i64, season: i32, number: i32) -> TvEpisode {
    TvEpisode {
        season_number: season,
        ..episode(id, show_id, number, "2016-07-15")
    }
}

#[tokio::test]
async fn test_genre_lists_and_single_genre() {
    let catalog = FakeCatalog::new()
        .with_genres(TitleKind::Movie, vec![genre(28, "Action"), genre(18, "Drama")])
        .with_genres(TitleKind::TvShow, vec![genre(10765, "Sci-Fi & Fantasy")]);
    let server = create_test_server(catalog, FakeAvailability::new());

    let response = server.get("/api/v1/media/genres/movie").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body.as_array().map(Vec::len), Some(2));

    let response = server.get("/api/v1/media/genres/tv/10765").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["name"], "Sci-Fi & Fantasy");

    // movie genre ids are not tv genre ids
    let response = server.get("/api/v1/media/genres/tv/28").await;
    response.assert_status_not_found();
}

#[tokio::test]
async fn test_actor_search() {
    let catalog = FakeCatalog::new()
        .with_actor(Actor {
            id: 6384,
            name: "Keanu Reeves".to_string(),
            overview: String::new(),
            profile_url: None,
        })
        .with_actor(Actor {
            id: 1331,
            name: "Hugo Weaving".to_string(),
            overview: String::new(),
            profile_url: None,
        });
    let server = create_test_server(catalog, FakeAvailability::new());

    let response = server
        .get("/api/v1/discover/actor/search")
        .add_query_param("query", "  keanu ")
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["totalResultCount"], 1);
    assert_eq!(body["results"][0]["id"], 6384);

    let response = server
        .get("/api/v1/discover/actor/search")
        .add_query_param("query", " ")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_actor_studio_and_network_lookups() {
    let catalog = FakeCatalog::new()
        .with_actor(Actor {
            id: 6384,
            name: "Keanu Reeves".to_string(),
            overview: "Canadian actor".to_string(),
            profile_url: Some("https://image.tmdb.org/t/p/w185/keanu.jpg".to_string()),
        })
        .with_network(Studio {
            id: 49,
            name: "HBO".to_string(),
            logo_url: None,
        });
    let server = create_test_server(catalog, FakeAvailability::new());

    let response = server.get("/api/v1/media/actor/6384").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["name"], "Keanu Reeves");
    assert!(body["profileUrl"].is_string());

    let response = server.get("/api/v1/media/network/49").await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["name"], "HBO");

    server
        .get("/api/v1/media/studio/420")
        .await
        .assert_status_not_found();
    server
        .get("/api/v1/media/network/0")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_movies_by_ids() {
    let catalog = FakeCatalog::new()
        .with_movie(movie(603, "The Matrix"))
        .with_movie(movie(550, "Fight Club"));
    let store = FakeAvailability::new().with_present(550, MediaKind::Movie);
    let server = create_test_server(catalog, store);

    let response = server
        .get("/api/v1/media/movies")
        .add_query_param("ids", "550, 404,603")
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["results"][0]["id"], 550);
    assert_eq!(body["results"][1]["id"], 603);
    assert_eq!(body["presence"], json!([true, false]));

    let response = server
        .get("/api/v1/media/movies")
        .add_query_param("ids", "550,abc")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_shows_by_ids() {
    let catalog = FakeCatalog::new().with_show(show(66732, "Stranger Things"));
    let server = create_test_server(catalog, FakeAvailability::new());

    let response = server
        .get("/api/v1/media/tvshows")
        .add_query_param("ids", "66732")
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["results"][0]["title"], "Stranger Things");
    assert_eq!(body["presence"], json!([false]));
}

#[tokio::test]
async fn test_season_episodes() {
    let catalog = FakeCatalog::new()
        .with_episode(season_episode(1198665, 66732, 1, 1))
        .with_episode(season_episode(1198666, 66732, 1, 2))
        .with_episode(season_episode(1293271, 66732, 2, 1));
    let store = FakeAvailability::new().with_present(1198666, MediaKind::Episode);
    let server = create_test_server(catalog, store);

    let response = server.get("/api/v1/media/tv/66732/season/1").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["results"].as_array().map(Vec::len), Some(2));
    assert_eq!(body["presence"], json!([false, true]));

    server
        .get("/api/v1/media/tv/66732/season/-1")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    server
        .get("/api/v1/media/tv/66732/season/9")
        .await
        .assert_status_not_found();
}
