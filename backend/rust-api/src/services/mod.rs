use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use redis::aio::ConnectionManager;

use crate::config::{Config, StorageBackend};
use crate::store::{MemoryProgressStore, MongoProgressStore, ProgressStore};

pub mod leaderboard_service;
pub mod progress_service;

use leaderboard_service::LeaderboardService;
use progress_service::ProgressService;

pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn ProgressStore>,
    pub redis: Option<ConnectionManager>,
    pub progress: ProgressService,
    pub leaderboard: LeaderboardService,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store: Arc<dyn ProgressStore> = match config.storage_backend {
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory progress store; data is lost on restart");
                Arc::new(MemoryProgressStore::new())
            }
            StorageBackend::Mongo => {
                let uri = config
                    .mongo_uri
                    .as_deref()
                    .context("MongoDB backend selected without a URI")?;
                let client = mongodb::Client::with_uri_str(uri)
                    .await
                    .context("Failed to connect to MongoDB")?;
                let store = MongoProgressStore::new(client.database(&config.mongo_database));
                store.ensure_indexes().await?;
                tracing::info!("MongoDB connected (database: {})", config.mongo_database);
                Arc::new(store)
            }
        };

        let redis = match config.redis_uri.as_deref() {
            Some(uri) => Some(connect_redis(uri).await?),
            None => {
                tracing::info!("Redis not configured; leaderboard cache disabled");
                None
            }
        };

        Ok(Self::with_store(config, store, redis))
    }

    /// Builds the state around an existing store; used by tests and by `new`.
    pub fn with_store(
        config: Config,
        store: Arc<dyn ProgressStore>,
        redis: Option<ConnectionManager>,
    ) -> Self {
        let progress = ProgressService::new(
            store.clone(),
            config.streak_offset(),
            config.history_default_limit,
        );
        let leaderboard =
            LeaderboardService::new(store.clone(), redis.clone(), config.leaderboard_cache_ttl_secs);

        Self {
            config,
            store,
            redis,
            progress,
            leaderboard,
        }
    }
}

async fn connect_redis(uri: &str) -> anyhow::Result<ConnectionManager> {
    let client = redis::Client::open(uri).context("Failed to create Redis client")?;

    tracing::info!("Attempting to connect to Redis...");

    let manager = tokio::time::timeout(Duration::from_secs(30), ConnectionManager::new(client))
        .await
        .map_err(|_| anyhow::anyhow!("Redis connection timeout after 30s"))??;

    let mut conn = manager.clone();
    tokio::time::timeout(
        Duration::from_secs(5),
        redis::cmd("PING").query_async::<String>(&mut conn),
    )
    .await
    .map_err(|_| anyhow::anyhow!("Redis PING timeout after 5s"))??;

    tracing::info!("Redis connection established successfully");
    Ok(manager)
}
