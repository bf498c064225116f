use std::cmp::Ordering;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use redis::aio::ConnectionManager;

use crate::metrics::{record_cache_hit, record_cache_miss, track_cache_operation};
use crate::models::{LeaderboardEntry, LeaderboardResponse, UserStats};
use crate::progression::compute_level;
use crate::store::ProgressStore;

pub const DEFAULT_LIMIT: usize = 10;
pub const MAX_LIMIT: usize = 100;
const CACHE_KEY_PREFIX: &str = "leaderboard:global";
const GENERATION_KEY: &str = "leaderboard:generation";

/// Key for a ranking computed while `generation` was current. Invalidation
/// bumps the generation, so a ranking read from the store before a write can
/// only land under a key no later reader asks for.
pub fn cache_key(generation: u64) -> String {
    format!("{}:{}", CACHE_KEY_PREFIX, generation)
}

/// Orders learners by XP, highest first; ties go to the lower learner id so
/// the ranking is stable between calls.
pub fn rank_learners(mut learners: Vec<(String, UserStats)>) -> Vec<LeaderboardEntry> {
    learners.sort_by(|(a_id, a), (b_id, b)| match b.xp.cmp(&a.xp) {
        Ordering::Equal => a_id.cmp(b_id),
        other => other,
    });

    learners
        .into_iter()
        .enumerate()
        .map(|(index, (learner_id, stats))| LeaderboardEntry {
            rank: index as u32 + 1,
            learner_id,
            xp: stats.xp,
            level: compute_level(stats.xp),
            streak: stats.streak,
        })
        .collect()
}

/// Key/value cache holding serialized rankings plus a generation counter.
#[async_trait]
pub trait LeaderboardCache: Send + Sync {
    async fn generation(&self) -> Result<u64>;

    async fn bump_generation(&self) -> Result<()>;

    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: String, ttl_secs: u64) -> Result<()>;
}

pub struct RedisLeaderboardCache {
    redis: ConnectionManager,
}

impl RedisLeaderboardCache {
    pub fn new(redis: ConnectionManager) -> Self {
        Self { redis }
    }
}

#[async_trait]
impl LeaderboardCache for RedisLeaderboardCache {
    async fn generation(&self) -> Result<u64> {
        let mut conn = self.redis.clone();
        track_cache_operation("get", async {
            let generation: Option<u64> = redis::cmd("GET")
                .arg(GENERATION_KEY)
                .query_async(&mut conn)
                .await
                .context("Failed to read leaderboard generation")?;
            Ok(generation.unwrap_or(0))
        })
        .await
    }

    async fn bump_generation(&self) -> Result<()> {
        let mut conn = self.redis.clone();
        track_cache_operation("incr", async {
            redis::cmd("INCR")
                .arg(GENERATION_KEY)
                .query_async::<u64>(&mut conn)
                .await
                .context("Failed to bump leaderboard generation")?;
            Ok(())
        })
        .await
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.redis.clone();
        track_cache_operation("get", async {
            redis::cmd("GET")
                .arg(key)
                .query_async::<Option<String>>(&mut conn)
                .await
                .context("Failed to read leaderboard cache")
        })
        .await
    }

    async fn set(&self, key: &str, value: String, ttl_secs: u64) -> Result<()> {
        let mut conn = self.redis.clone();
        track_cache_operation("setex", async {
            redis::cmd("SETEX")
                .arg(key)
                .arg(ttl_secs)
                .arg(value)
                .query_async::<()>(&mut conn)
                .await
                .context("Failed to cache leaderboard")
        })
        .await
    }
}

pub struct LeaderboardService {
    store: Arc<dyn ProgressStore>,
    cache: Option<Arc<dyn LeaderboardCache>>,
    cache_ttl_secs: u64,
}

impl LeaderboardService {
    pub fn new(
        store: Arc<dyn ProgressStore>,
        redis: Option<ConnectionManager>,
        cache_ttl_secs: u64,
    ) -> Self {
        let cache = redis.map(|redis| {
            Arc::new(RedisLeaderboardCache::new(redis)) as Arc<dyn LeaderboardCache>
        });
        Self::with_cache(store, cache, cache_ttl_secs)
    }

    pub fn with_cache(
        store: Arc<dyn ProgressStore>,
        cache: Option<Arc<dyn LeaderboardCache>>,
        cache_ttl_secs: u64,
    ) -> Self {
        Self {
            store,
            cache,
            cache_ttl_secs,
        }
    }

    pub async fn top(&self, limit: Option<usize>) -> Result<LeaderboardResponse> {
        let limit = limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

        // Read the generation before the store so a concurrent write either
        // shows up in the snapshot or moves readers past its key.
        let key = self.current_key().await;

        if let Some(key) = key.as_deref() {
            if let Some(mut entries) = self.cached(key).await {
                entries.truncate(limit);
                return Ok(LeaderboardResponse {
                    entries,
                    cached: true,
                });
            }
        }

        let learners = self
            .store
            .list_stats()
            .await
            .context("Failed to load stats for leaderboard")?;
        let mut entries = rank_learners(learners);
        if let Some(key) = key.as_deref() {
            self.store_in_cache(key, &entries).await;
        }

        entries.truncate(limit);
        Ok(LeaderboardResponse {
            entries,
            cached: false,
        })
    }

    /// Retires every cached ranking. Cache errors are logged, never returned;
    /// entries under older generations expire on their TTL.
    pub async fn invalidate(&self) {
        let Some(cache) = &self.cache else {
            return;
        };
        if let Err(e) = cache.bump_generation().await {
            tracing::warn!("{:#}", e);
        }
    }

    async fn current_key(&self) -> Option<String> {
        let cache = self.cache.as_ref()?;
        match cache.generation().await {
            Ok(generation) => Some(cache_key(generation)),
            Err(e) => {
                tracing::warn!("{:#}; bypassing leaderboard cache", e);
                None
            }
        }
    }

    async fn cached(&self, key: &str) -> Option<Vec<LeaderboardEntry>> {
        let cache = self.cache.as_ref()?;

        match cache.get(key).await {
            Ok(Some(json)) => match serde_json::from_str(&json) {
                Ok(entries) => {
                    record_cache_hit();
                    Some(entries)
                }
                Err(e) => {
                    tracing::warn!("Discarding unreadable leaderboard cache: {}", e);
                    record_cache_miss();
                    None
                }
            },
            Ok(None) => {
                record_cache_miss();
                None
            }
            Err(e) => {
                tracing::warn!("{:#}; falling back to store", e);
                None
            }
        }
    }

    async fn store_in_cache(&self, key: &str, entries: &[LeaderboardEntry]) {
        let Some(cache) = &self.cache else {
            return;
        };
        let json = match serde_json::to_string(entries) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!("Failed to serialize leaderboard for cache: {}", e);
                return;
            }
        };

        if let Err(e) = cache.set(key, json, self.cache_ttl_secs).await {
            tracing::warn!("{:#}", e);
        }
    }
}
