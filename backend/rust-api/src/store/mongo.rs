use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{self, doc, DateTime as BsonDateTime, Document};
use mongodb::{Database, IndexModel};
use serde::{Deserialize, Serialize};

use super::ProgressStore;
use crate::metrics::track_db_operation;
use crate::models::{ActivityKind, ActivityLog, UserStats};
use crate::progression::compute_level;
use crate::utils::time::{bson_to_chrono, chrono_to_bson};

const STATS_COLLECTION: &str = "learner_stats";
const ACTIVITY_COLLECTION: &str = "activity_logs";

/// Stats document keyed by learner id. BSON has no unsigned integers, so
/// counters are stored as signed values and checked on the way back.
#[derive(Debug, Serialize, Deserialize)]
struct StatsDocument {
    #[serde(rename = "_id")]
    learner_id: String,
    xp: i64,
    level: i32,
    streak: i32,
    #[serde(rename = "lastActivityDate", default)]
    last_activity_date: Option<BsonDateTime>,
    sessions_completed: i32,
    labs_completed: i32,
    projects_completed: i32,
    quizzes_completed: i32,
    blogs_completed: i32,
    total_study_hours: f64,
    #[serde(rename = "updatedAt")]
    updated_at: BsonDateTime,
}

impl StatsDocument {
    fn from_stats(learner_id: &str, stats: &UserStats) -> Result<Self> {
        Ok(Self {
            learner_id: learner_id.to_string(),
            xp: i64::try_from(stats.xp).context("xp out of range")?,
            level: i32::try_from(stats.level)?,
            streak: i32::try_from(stats.streak)?,
            last_activity_date: stats.last_activity_date.map(chrono_to_bson),
            sessions_completed: i32::try_from(stats.sessions_completed)?,
            labs_completed: i32::try_from(stats.labs_completed)?,
            projects_completed: i32::try_from(stats.projects_completed)?,
            quizzes_completed: i32::try_from(stats.quizzes_completed)?,
            blogs_completed: i32::try_from(stats.blogs_completed)?,
            total_study_hours: stats.total_study_hours,
            updated_at: BsonDateTime::now(),
        })
    }

    fn into_stats(self) -> Result<UserStats> {
        let last_activity_date = match self.last_activity_date {
            Some(dt) => Some(bson_to_chrono(dt).ok_or_else(|| anyhow!("lastActivityDate out of range"))?),
            None => None,
        };
        if !self.total_study_hours.is_finite() || self.total_study_hours < 0.0 {
            return Err(anyhow!("total_study_hours must be a non-negative number"));
        }

        let xp = u64::try_from(self.xp).context("negative xp")?;
        let stored_level = u32::try_from(self.level).context("negative level")?;
        let level = compute_level(xp);
        if stored_level != level {
            tracing::warn!(
                "Stored level {} disagrees with xp {}; using derived level {}",
                stored_level,
                xp,
                level
            );
        }

        Ok(UserStats {
            xp,
            level,
            streak: u32::try_from(self.streak).context("negative streak")?,
            last_activity_date,
            sessions_completed: u32::try_from(self.sessions_completed)?,
            labs_completed: u32::try_from(self.labs_completed)?,
            projects_completed: u32::try_from(self.projects_completed)?,
            quizzes_completed: u32::try_from(self.quizzes_completed)?,
            blogs_completed: u32::try_from(self.blogs_completed)?,
            total_study_hours: self.total_study_hours,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ActivityDocument {
    #[serde(rename = "_id")]
    id: String,
    learner_id: String,
    kind: ActivityKind,
    description: String,
    xp_awarded: i64,
    timestamp: BsonDateTime,
    #[serde(default)]
    week: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    lab_id: Option<String>,
}

impl ActivityDocument {
    fn from_log(entry: &ActivityLog) -> Result<Self> {
        Ok(Self {
            id: entry.id.clone(),
            learner_id: entry.learner_id.clone(),
            kind: entry.kind,
            description: entry.description.clone(),
            xp_awarded: i64::try_from(entry.xp_awarded)?,
            timestamp: chrono_to_bson(entry.timestamp),
            week: entry.week.map(i32::try_from).transpose()?,
            lab_id: entry.lab_id.clone(),
        })
    }

    fn into_log(self) -> Result<ActivityLog> {
        Ok(ActivityLog {
            id: self.id,
            learner_id: self.learner_id,
            kind: self.kind,
            description: self.description,
            xp_awarded: u64::try_from(self.xp_awarded)?,
            timestamp: bson_to_chrono(self.timestamp)
                .ok_or_else(|| anyhow!("activity timestamp out of range"))?,
            week: self.week.map(u32::try_from).transpose()?,
            lab_id: self.lab_id,
        })
    }
}

pub struct MongoProgressStore {
    mongo: Database,
}

impl MongoProgressStore {
    pub fn new(mongo: Database) -> Self {
        Self { mongo }
    }

    pub async fn ensure_indexes(&self) -> Result<()> {
        self.mongo
            .collection::<Document>(ACTIVITY_COLLECTION)
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "learner_id": 1, "timestamp": -1 })
                    .build(),
            )
            .await
            .context("Failed to create activity_logs index")?;

        self.mongo
            .collection::<Document>(STATS_COLLECTION)
            .create_index(IndexModel::builder().keys(doc! { "xp": -1 }).build())
            .await
            .context("Failed to create learner_stats index")?;

        tracing::info!("MongoDB indexes ensured for progress collections");
        Ok(())
    }

    fn decode_stats(raw: Document) -> Option<(String, UserStats)> {
        let learner_id = raw.get_str("_id").unwrap_or("<unknown>").to_string();
        match bson::from_document::<StatsDocument>(raw)
            .map_err(anyhow::Error::from)
            .and_then(StatsDocument::into_stats)
        {
            Ok(stats) => Some((learner_id, stats)),
            Err(e) => {
                tracing::warn!(
                    "Corrupt stats record for learner {}, treating as absent: {:#}",
                    learner_id,
                    e
                );
                None
            }
        }
    }

    fn decode_activity(raw: Document) -> Option<ActivityLog> {
        let id = raw.get_str("_id").unwrap_or("<unknown>").to_string();
        match bson::from_document::<ActivityDocument>(raw)
            .map_err(anyhow::Error::from)
            .and_then(ActivityDocument::into_log)
        {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("Skipping corrupt activity log {}: {:#}", id, e);
                None
            }
        }
    }
}

#[async_trait]
impl ProgressStore for MongoProgressStore {
    async fn load_stats(&self, learner_id: &str) -> Result<Option<UserStats>> {
        let collection = self.mongo.collection::<Document>(STATS_COLLECTION);
        let raw = track_db_operation("find_one", STATS_COLLECTION, async {
            collection
                .find_one(doc! { "_id": learner_id })
                .await
                .context("Failed to query learner stats")
        })
        .await?;

        Ok(raw.and_then(Self::decode_stats).map(|(_, stats)| stats))
    }

    async fn save_stats(&self, learner_id: &str, stats: &UserStats) -> Result<()> {
        let document = StatsDocument::from_stats(learner_id, stats)?;
        let collection = self.mongo.collection::<StatsDocument>(STATS_COLLECTION);

        track_db_operation("replace_one", STATS_COLLECTION, async {
            collection
                .replace_one(doc! { "_id": learner_id }, &document)
                .upsert(true)
                .await
                .context("Failed to save learner stats")
        })
        .await?;

        Ok(())
    }

    async fn append_activity(&self, entry: &ActivityLog) -> Result<()> {
        let document = ActivityDocument::from_log(entry)?;
        let collection = self.mongo.collection::<ActivityDocument>(ACTIVITY_COLLECTION);

        track_db_operation("insert_one", ACTIVITY_COLLECTION, async {
            collection
                .insert_one(&document)
                .await
                .context("Failed to append activity log")
        })
        .await?;

        Ok(())
    }

    async fn load_history(&self, learner_id: &str, limit: usize) -> Result<Vec<ActivityLog>> {
        let collection = self.mongo.collection::<Document>(ACTIVITY_COLLECTION);
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let raw: Vec<Document> = track_db_operation("find", ACTIVITY_COLLECTION, async {
            collection
                .find(doc! { "learner_id": learner_id })
                .sort(doc! { "timestamp": -1, "_id": -1 })
                .limit(limit)
                .await
                .context("Failed to query activity history")?
                .try_collect()
                .await
                .context("Failed to read activity history")
        })
        .await?;

        Ok(raw.into_iter().filter_map(Self::decode_activity).collect())
    }

    async fn has_lab_credit(&self, learner_id: &str, lab_id: &str) -> Result<bool> {
        let collection = self.mongo.collection::<Document>(ACTIVITY_COLLECTION);

        let count = track_db_operation("count_documents", ACTIVITY_COLLECTION, async {
            collection
                .count_documents(doc! { "learner_id": learner_id, "lab_id": lab_id })
                .await
                .context("Failed to check lab credit")
        })
        .await?;

        Ok(count > 0)
    }

    async fn reset(&self, learner_id: &str) -> Result<()> {
        let stats = self.mongo.collection::<Document>(STATS_COLLECTION);
        let history = self.mongo.collection::<Document>(ACTIVITY_COLLECTION);

        track_db_operation("delete_one", STATS_COLLECTION, async {
            stats
                .delete_one(doc! { "_id": learner_id })
                .await
                .context("Failed to delete learner stats")
        })
        .await?;

        let deleted = track_db_operation("delete_many", ACTIVITY_COLLECTION, async {
            history
                .delete_many(doc! { "learner_id": learner_id })
                .await
                .context("Failed to delete activity history")
        })
        .await?;

        tracing::info!(
            "Reset learner {}: removed {} activity entries",
            learner_id,
            deleted.deleted_count
        );
        Ok(())
    }

    async fn list_stats(&self) -> Result<Vec<(String, UserStats)>> {
        let collection = self.mongo.collection::<Document>(STATS_COLLECTION);

        let raw: Vec<Document> = track_db_operation("find", STATS_COLLECTION, async {
            collection
                .find(doc! {})
                .await
                .context("Failed to query learner stats")?
                .try_collect()
                .await
                .context("Failed to read learner stats")
        })
        .await?;

        Ok(raw.into_iter().filter_map(Self::decode_stats).collect())
    }

    async fn ping(&self) -> Result<()> {
        self.mongo
            .run_command(doc! { "ping": 1 })
            .await
            .context("MongoDB ping failed")?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "mongodb"
    }
}
