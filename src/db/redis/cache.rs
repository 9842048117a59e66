use redis::{
    aio::{ConnectionManager, ConnectionManagerConfig},
    AsyncCommands, Client,
};
use serde::{de::DeserializeOwned, Serialize};
use std::{fmt::Display, sync::Arc, time::Duration};
use tokio::{
    sync::{mpsc, OnceCell},
    task::JoinHandle,
};

use crate::error::AppResult;

/// Time-to-live of cached catalog titles (6 hours)
pub const TITLE_CACHE_TTL: u64 = 21_600;

/// Time-to-live of genre lists, companies and people (1 day)
pub const ASSET_CACHE_TTL: u64 = 86_400;

/// Bound on a single Redis round trip or connection attempt
const REDIS_TIMEOUT: Duration = Duration::from_secs(1);

/// Catalog lookups that are worth caching
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Movie(i64),
    MovieShort(i64),
    Show(i64),
    ShowShort(i64),
    Episode { show_id: i64, season: i32, number: i32 },
    Season { show_id: i64, season: i32 },
    MovieGenres,
    ShowGenres,
    Studio(i64),
    Network(i64),
    Actor(i64),
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::Movie(id) => write!(f, "movie:{}", id),
            CacheKey::MovieShort(id) => write!(f, "movie_short:{}", id),
            CacheKey::Show(id) => write!(f, "tv:{}", id),
            CacheKey::ShowShort(id) => write!(f, "tv_short:{}", id),
            CacheKey::Episode {
                show_id,
                season,
                number,
            } => write!(f, "episode:{}:{}:{}", show_id, season, number),
            CacheKey::Season { show_id, season } => write!(f, "season:{}:{}", show_id, season),
            CacheKey::MovieGenres => write!(f, "genres:movie"),
            CacheKey::ShowGenres => write!(f, "genres:tv"),
            CacheKey::Studio(id) => write!(f, "studio:{}", id),
            CacheKey::Network(id) => write!(f, "network:{}", id),
            CacheKey::Actor(id) => write!(f, "actor:{}", id),
        }
    }
}

pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    Ok(Client::open(redis_url)?)
}

/// One Redis connection shared by readers and the writer task.
///
/// The manager is built on first use, so the service starts with Redis down;
/// once built it reconnects by itself.
struct SharedConnection {
    client: Client,
    manager: OnceCell<ConnectionManager>,
}

impl SharedConnection {
    fn new(client: Client) -> Self {
        Self {
            client,
            manager: OnceCell::new(),
        }
    }

    async fn get(&self) -> AppResult<ConnectionManager> {
        let manager = self
            .manager
            .get_or_try_init(|| {
                let config = ConnectionManagerConfig::new()
                    .set_number_of_retries(1)
                    .set_connection_timeout(REDIS_TIMEOUT)
                    .set_response_timeout(REDIS_TIMEOUT);
                ConnectionManager::new_with_config(self.client.clone(), config)
            })
            .await?;
        Ok(manager.clone())
    }
}

/// A serialized title waiting to be stored
#[derive(Debug)]
struct PendingWrite {
    key: String,
    json: String,
    ttl: u64,
}

/// Write-behind cache of catalog titles.
///
/// A lookup never fails because of the cache: an unreachable Redis or an entry
/// that no longer decodes is a miss. Stores are queued to a single writer task.
#[derive(Clone)]
pub struct Cache {
    connection: Arc<SharedConnection>,
    writes: mpsc::UnboundedSender<PendingWrite>,
}

/// Stops the writer task; see [`CacheWriterHandle::shutdown`]
pub struct CacheWriterHandle {
    stop: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl CacheWriterHandle {
    /// Stores everything already queued, then stops the writer
    pub async fn shutdown(self) {
        if self.stop.send(()).await.is_err() {
            tracing::warn!("Cache writer already stopped");
        }
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Cache writer task panicked");
        }
    }
}

impl Cache {
    pub async fn new(client: Client) -> (Self, CacheWriterHandle) {
        let connection = Arc::new(SharedConnection::new(client));
        let (writes, queue) = mpsc::unbounded_channel();
        let (stop, stop_rx) = mpsc::channel(1);

        let task = tokio::spawn(Writer::new(Arc::clone(&connection)).run(queue, stop_rx));

        (Self { connection, writes }, CacheWriterHandle { stop, task })
    }

    /// Cached value for `key`, `None` on a miss
    pub async fn get<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let raw: Option<String> = match self.read(key).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cache read failed, treating as miss");
                return None;
            }
        };

        match serde_json::from_str(&raw?) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Dropping undecodable cache entry");
                None
            }
        }
    }

    async fn read(&self, key: &CacheKey) -> AppResult<Option<String>> {
        let mut conn = self.connection.get().await?;
        Ok(conn.get(key.to_string()).await?)
    }

    /// Queues `value` for storage under `key`; never waits on Redis
    pub fn put<T: Serialize>(&self, key: &CacheKey, value: &T, ttl: u64) {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(key = %key, error = %e, "Cannot serialize cache entry");
                return;
            }
        };

        let write = PendingWrite {
            key: key.to_string(),
            json,
            ttl,
        };
        if self.writes.send(write).is_err() {
            tracing::debug!(key = %key, "Cache writer stopped, entry not stored");
        }
    }
}

/// Background task draining the write queue
struct Writer {
    connection: Arc<SharedConnection>,
    stored: u64,
    failed: u64,
}

impl Writer {
    fn new(connection: Arc<SharedConnection>) -> Self {
        Self {
            connection,
            stored: 0,
            failed: 0,
        }
    }

    async fn run(
        mut self,
        mut queue: mpsc::UnboundedReceiver<PendingWrite>,
        mut stop: mpsc::Receiver<()>,
    ) {
        tracing::info!("Cache writer started");

        loop {
            tokio::select! {
                Some(write) = queue.recv() => self.store(write).await,
                _ = stop.recv() => break,
            }
        }

        // Every Cache clone holds a sender, so the queue never closes on its own.
        while let Ok(write) = queue.try_recv() {
            self.store(write).await;
        }

        tracing::info!(stored = self.stored, failed = self.failed, "Cache writer stopped");
    }

    async fn store(&mut self, write: PendingWrite) {
        match self.set(&write).await {
            Ok(()) => self.stored += 1,
            Err(e) => {
                self.failed += 1;
                tracing::warn!(key = %write.key, error = %e, "Cache write failed");
            }
        }
    }

    async fn set(&self, write: &PendingWrite) -> AppResult<()> {
        let mut conn = self.connection.get().await?;
        let _: () = conn.set_ex(&write.key, &write.json, write.ttl).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_display_titles() {
        assert_eq!(CacheKey::Movie(603).to_string(), "movie:603");
        assert_eq!(CacheKey::MovieShort(603).to_string(), "movie_short:603");
        assert_eq!(CacheKey::Show(1399).to_string(), "tv:1399");
        assert_eq!(CacheKey::ShowShort(1399).to_string(), "tv_short:1399");
    }

    #[test]
    fn test_cache_key_display_episode() {
        let key = CacheKey::Episode {
            show_id: 1399,
            season: 1,
            number: 9,
        };
        assert_eq!(key.to_string(), "episode:1399:1:9");
    }

    #[test]
    fn test_cache_key_display_assets() {
        let season = CacheKey::Season {
            show_id: 1399,
            season: 2,
        };
        assert_eq!(season.to_string(), "season:1399:2");
        assert_eq!(CacheKey::MovieGenres.to_string(), "genres:movie");
        assert_eq!(CacheKey::ShowGenres.to_string(), "genres:tv");
        assert_eq!(CacheKey::Network(49).to_string(), "network:49");
        assert_eq!(CacheKey::Actor(6384).to_string(), "actor:6384");
    }

    #[tokio::test]
    async fn test_failed_connection_is_retried_on_next_lookup() {
        let client = create_redis_client("redis://127.0.0.1:1").unwrap();
        let connection = SharedConnection::new(client);

        assert!(connection.get().await.is_err());
        assert!(connection.manager.get().is_none());
        assert!(connection.get().await.is_err());
    }

    #[tokio::test]
    async fn test_unreachable_redis_is_a_miss() {
        // nothing listens on port 1
        let client = create_redis_client("redis://127.0.0.1:1").unwrap();
        let (cache, handle) = Cache::new(client).await;

        let hit: Option<String> = cache.get(&CacheKey::Movie(1)).await;
        assert!(hit.is_none());

        cache.put(&CacheKey::Movie(1), &"queued".to_string(), 60);
        handle.shutdown().await;
    }
}
