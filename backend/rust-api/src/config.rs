use serde::Deserialize;
use std::env;

use chrono::{FixedOffset, Offset, Utc};

use crate::utils::time::offset_from_minutes;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Mongo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub bind_addr: String,
    pub storage_backend: StorageBackend,
    pub mongo_uri: Option<String>,
    pub mongo_database: String,
    pub redis_uri: Option<String>,
    /// Offset used to decide which calendar day an activity belongs to.
    pub streak_utc_offset_minutes: i32,
    pub leaderboard_cache_ttl_secs: u64,
    pub history_default_limit: usize,
    pub otlp_endpoint: Option<String>,
    pub log_format: LogFormat,
    /// `username:password` for Basic auth on `/metrics`; open when unset.
    pub metrics_auth: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8081".to_string(),
            storage_backend: StorageBackend::Memory,
            mongo_uri: None,
            mongo_database: "studyquest".to_string(),
            redis_uri: None,
            streak_utc_offset_minutes: 0,
            leaderboard_cache_ttl_secs: 60,
            history_default_limit: 50,
            otlp_endpoint: None,
            log_format: LogFormat::Pretty,
            metrics_auth: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        // Root .env first, then the crate-local one
        let skip_root_env = env::var("SKIP_ROOT_ENV").is_ok();
        if skip_root_env {
            dotenvy::dotenv().ok();
        } else if dotenvy::from_path("../../.env").is_err() {
            dotenvy::dotenv().ok();
        }

        let app_env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // config/*.toml + APP__SECTION__KEY overrides
        let settings = config::Config::builder()
            .add_source(config::File::with_name(&format!("config/{}", app_env)).required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        let defaults = Config::default();

        let bind_addr = settings
            .get_string("server.bind_addr")
            .or_else(|_| env::var("BIND_ADDR"))
            .unwrap_or(defaults.bind_addr);

        let mongo_uri = settings
            .get_string("database.mongo_uri")
            .or_else(|_| env::var("MONGO_URI"))
            .ok();

        let storage_backend = match settings
            .get_string("storage.backend")
            .or_else(|_| env::var("STORAGE_BACKEND"))
        {
            Ok(value) => parse_backend(&value)?,
            // A configured Mongo URI implies the Mongo backend
            Err(_) if mongo_uri.is_some() => StorageBackend::Mongo,
            Err(_) => StorageBackend::Memory,
        };

        if storage_backend == StorageBackend::Mongo && mongo_uri.is_none() {
            return Err(config::ConfigError::Message(
                "storage.backend is mongo but no database.mongo_uri / MONGO_URI is set".into(),
            ));
        }

        let mongo_database = settings
            .get_string("database.mongo_database")
            .or_else(|_| env::var("MONGO_DATABASE"))
            .unwrap_or(defaults.mongo_database);

        let redis_uri = settings
            .get_string("redis.uri")
            .or_else(|_| env::var("REDIS_URI"))
            .ok();

        let streak_utc_offset_minutes = match settings
            .get_int("progression.streak_utc_offset_minutes")
            .ok()
            .or_else(|| {
                env::var("STREAK_UTC_OFFSET_MINUTES")
                    .ok()
                    .and_then(|v| v.parse::<i64>().ok())
            }) {
            Some(minutes) => i32::try_from(minutes)
                .ok()
                .filter(|m| offset_from_minutes(*m).is_some())
                .ok_or_else(|| {
                    config::ConfigError::Message(format!(
                        "progression.streak_utc_offset_minutes out of range: {}",
                        minutes
                    ))
                })?,
            None => defaults.streak_utc_offset_minutes,
        };

        let leaderboard_cache_ttl_secs = settings
            .get_int("leaderboard.cache_ttl_secs")
            .ok()
            .and_then(|v| u64::try_from(v).ok())
            .filter(|v| *v > 0)
            .unwrap_or(defaults.leaderboard_cache_ttl_secs);

        let history_default_limit = settings
            .get_int("history.default_limit")
            .ok()
            .and_then(|v| usize::try_from(v).ok())
            .filter(|v| *v > 0)
            .unwrap_or(defaults.history_default_limit);

        let otlp_endpoint = settings
            .get_string("telemetry.otlp_endpoint")
            .or_else(|_| env::var("OTEL_EXPORTER_OTLP_ENDPOINT"))
            .ok();

        let log_format = match settings
            .get_string("telemetry.log_format")
            .or_else(|_| env::var("LOG_FORMAT"))
            .as_deref()
        {
            Ok("json") => LogFormat::Json,
            Ok("pretty") | Err(_) => LogFormat::Pretty,
            Ok(other) => {
                return Err(config::ConfigError::Message(format!(
                    "unknown telemetry.log_format: {}",
                    other
                )))
            }
        };

        let metrics_auth = settings
            .get_string("metrics.auth")
            .or_else(|_| env::var("METRICS_AUTH"))
            .ok();

        if app_env == "prod" && metrics_auth.is_none() {
            tracing::warn!("METRICS_AUTH is not set; /metrics is served without authentication");
        }

        Ok(Config {
            bind_addr,
            storage_backend,
            mongo_uri,
            mongo_database,
            redis_uri,
            streak_utc_offset_minutes,
            leaderboard_cache_ttl_secs,
            history_default_limit,
            otlp_endpoint,
            log_format,
            metrics_auth,
        })
    }

    pub fn streak_offset(&self) -> FixedOffset {
        offset_from_minutes(self.streak_utc_offset_minutes)
            .unwrap_or_else(|| Utc.fix())
    }
}

fn parse_backend(value: &str) -> Result<StorageBackend, config::ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "memory" => Ok(StorageBackend::Memory),
        "mongo" | "mongodb" => Ok(StorageBackend::Mongo),
        other => Err(config::ConfigError::Message(format!(
            "unknown storage.backend: {}",
            other
        ))),
    }
}
