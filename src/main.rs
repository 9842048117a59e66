use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use marquee_api::{
    config::Config,
    db::{
        create_pool, create_redis_client, AvailabilityStore, Cache, FeedbackStore,
        PgAvailabilityStore, PgFeedbackStore,
    },
    routes::{create_router, AppState},
    services::{
        providers::{CatalogGateway, TmdbGateway},
        AssetService, CalendarService, CommentService, DiscoveryService, MediaInfoService,
        RatingService,
    },
};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("marquee_api=info,tower_http=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = Config::from_env()?;

    let pool = create_pool(&config.database_url, config.database_max_connections).await?;
    let redis_client = create_redis_client(&config.redis_url)?;
    let (cache, cache_handle) = Cache::new(redis_client).await;

    let gateway: Arc<dyn CatalogGateway> = Arc::new(TmdbGateway::new(
        cache,
        config.tmdb_api_key.clone(),
        config.tmdb_api_url.clone(),
        config.tmdb_language.clone(),
    ));
    let availability: Arc<dyn AvailabilityStore> =
        Arc::new(PgAvailabilityStore::new(pool.clone()));
    let feedback: Arc<dyn FeedbackStore> = Arc::new(PgFeedbackStore::new(pool));

    let state = Arc::new(AppState {
        discovery: DiscoveryService::new(
            Arc::clone(&gateway),
            Arc::clone(&availability),
            config.hydration_timeout(),
        ),
        media_info: MediaInfoService::new(
            Arc::clone(&availability),
            Arc::clone(&gateway),
            config.hydration_timeout(),
        ),
        assets: AssetService::new(Arc::clone(&gateway)),
        calendar: CalendarService::new(availability, gateway),
        comments: CommentService::new(Arc::clone(&feedback)),
        ratings: RatingService::new(feedback),
        calendar_offset: config.calendar_offset(),
    });

    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Flushing pending cache writes");
    cache_handle.shutdown().await;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Shutdown signal received (Ctrl+C)"),
        _ = terminate => tracing::info!("Shutdown signal received (SIGTERM)"),
    }
}
