use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;
use validator::Validate;

use crate::metrics::{
    ACTIVITIES_LOGGED_TOTAL, LAB_VERIFICATIONS_TOTAL, LEVEL_UPS_TOTAL, PROGRESS_RESETS_TOTAL,
    XP_AWARDED_TOTAL,
};
use crate::models::{
    AchievementStatus, AchievementsResponse, ActivityKind, ActivityLog, LabCheck,
    LogActivityRequest, LogActivityResponse, StatsResponse, UserStats, VerificationOutcome,
    VerifyLabResponse,
};
use crate::progression::{
    self, achievement_catalog, apply_activity, find_lab, parse_timestamp, pick_feedback,
    pick_feedback_with, verify_submission, ProgressionError,
};
use crate::store::ProgressStore;

const MAX_HISTORY_LIMIT: usize = 500;
/// Idle lock entries are pruned once the map grows past this size.
const LOCK_PRUNE_THRESHOLD: usize = 1024;

lazy_static! {
    static ref LEARNER_ID: Regex = Regex::new(r"^[A-Za-z0-9._@-]{1,64}$").expect("static regex");
}

pub fn validate_learner_id(learner_id: &str) -> Result<(), ProgressionError> {
    if LEARNER_ID.is_match(learner_id) {
        Ok(())
    } else {
        Err(ProgressionError::InvalidLearnerId(learner_id.to_string()))
    }
}

/// One async mutex per learner. Holding the guard makes a load-apply-save
/// sequence atomic with respect to other sequences for the same learner;
/// different learners never wait on each other.
#[derive(Default)]
pub struct LearnerLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl LearnerLocks {
    pub async fn lock(&self, learner_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            if locks.len() > LOCK_PRUNE_THRESHOLD {
                // Only the map holds an idle entry, so nobody is waiting on it.
                locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            }
            locks.entry(learner_id.to_string()).or_default().clone()
        };
        lock.lock_owned().await
    }

    pub fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

struct PendingActivity {
    kind: ActivityKind,
    description: String,
    timestamp: DateTime<Utc>,
    week: Option<u32>,
    lab_id: Option<&'static str>,
}

pub struct ProgressService {
    store: Arc<dyn ProgressStore>,
    locks: LearnerLocks,
    streak_offset: FixedOffset,
    history_default_limit: usize,
}

impl ProgressService {
    pub fn new(
        store: Arc<dyn ProgressStore>,
        streak_offset: FixedOffset,
        history_default_limit: usize,
    ) -> Self {
        Self {
            store,
            locks: LearnerLocks::default(),
            streak_offset,
            history_default_limit,
        }
    }

    /// Stored stats, or the zeroed defaults for a learner with no record.
    pub async fn get_stats(&self, learner_id: &str) -> Result<UserStats> {
        validate_learner_id(learner_id)?;
        self.load_current(learner_id).await
    }

    /// Loads the snapshot with `level` re-derived from `xp`.
    async fn load_current(&self, learner_id: &str) -> Result<UserStats> {
        let mut stats = self
            .store
            .load_stats(learner_id)
            .await
            .context("Failed to load learner stats")?
            .unwrap_or_default();
        stats.level = progression::compute_level(stats.xp);
        Ok(stats)
    }

    pub async fn stats_response(&self, learner_id: &str) -> Result<StatsResponse> {
        let stats = self.get_stats(learner_id).await?;
        Ok(StatsResponse {
            learner_id: learner_id.to_string(),
            xp_to_next_level: progression::xp_to_next_level(stats.xp),
            level_progress: progression::level_progress(stats.xp),
            stats,
        })
    }

    pub async fn log_activity(
        &self,
        learner_id: &str,
        req: LogActivityRequest,
    ) -> Result<LogActivityResponse> {
        validate_learner_id(learner_id)?;
        req.validate()
            .map_err(|e| ProgressionError::InvalidRequest(e.to_string()))?;
        let kind: ActivityKind = req.kind.trim().parse()?;
        let timestamp = parse_timestamp(req.timestamp.as_deref(), Utc::now(), self.streak_offset)?;

        let pending = PendingActivity {
            kind,
            description: req.description.trim().to_string(),
            timestamp,
            week: req.week,
            lab_id: None,
        };
        let logged = self.record_activity(learner_id, pending).await?;
        logged.context("Activity was not recorded")
    }

    /// Load, apply and save under the learner's lock. Returns `None` only
    /// for a lab credit the learner already holds.
    async fn record_activity(
        &self,
        learner_id: &str,
        pending: PendingActivity,
    ) -> Result<Option<LogActivityResponse>> {
        let PendingActivity {
            kind,
            description,
            timestamp,
            week,
            lab_id,
        } = pending;

        let _guard = self.locks.lock(learner_id).await;

        if let Some(lab_id) = lab_id {
            if self
                .store
                .has_lab_credit(learner_id, lab_id)
                .await
                .context("Failed to check lab credit")?
            {
                tracing::info!(
                    "Learner {} already credited for lab {}; no XP awarded",
                    learner_id,
                    lab_id
                );
                return Ok(None);
            }
        }

        let current = self.load_current(learner_id).await?;

        let outcome = apply_activity(&current, kind, timestamp, self.streak_offset);

        let entry = ActivityLog {
            id: Uuid::new_v4().to_string(),
            learner_id: learner_id.to_string(),
            kind,
            description,
            xp_awarded: outcome.xp_awarded,
            timestamp,
            week,
            lab_id: lab_id.map(str::to_string),
        };

        self.store
            .save_stats(learner_id, &outcome.stats)
            .await
            .context("Failed to save learner stats")?;
        self.store
            .append_activity(&entry)
            .await
            .context("Failed to append activity log")?;

        ACTIVITIES_LOGGED_TOTAL
            .with_label_values(&[kind.as_str()])
            .inc();
        XP_AWARDED_TOTAL.inc_by(outcome.xp_awarded);
        if outcome.leveled_up {
            LEVEL_UPS_TOTAL.inc();
            tracing::info!(
                "Learner {} reached level {}",
                learner_id,
                outcome.stats.level
            );
        }

        tracing::info!(
            learner_id = %learner_id,
            kind = %kind,
            xp_awarded = outcome.xp_awarded,
            xp_total = outcome.stats.xp,
            streak = outcome.stats.streak,
            "Activity logged"
        );

        Ok(Some(LogActivityResponse {
            activity: entry,
            xp_awarded: outcome.xp_awarded,
            leveled_up: outcome.leveled_up,
            stats: outcome.stats,
        }))
    }

    pub async fn history(&self, learner_id: &str, limit: Option<usize>) -> Result<Vec<ActivityLog>> {
        validate_learner_id(learner_id)?;
        let limit = limit
            .unwrap_or(self.history_default_limit)
            .clamp(1, MAX_HISTORY_LIMIT);
        self.store.load_history(learner_id, limit).await
    }

    pub async fn achievements(&self, learner_id: &str) -> Result<AchievementsResponse> {
        let stats = self.get_stats(learner_id).await?;
        let catalog = achievement_catalog();
        let unlocked = progression::evaluate_achievements(&stats, catalog);

        let achievements: Vec<AchievementStatus> = catalog
            .iter()
            .map(|achievement| AchievementStatus::new(achievement, unlocked.contains(achievement.id)))
            .collect();

        Ok(AchievementsResponse {
            learner_id: learner_id.to_string(),
            unlocked_count: unlocked.len(),
            achievements,
        })
    }

    pub async fn reset(&self, learner_id: &str) -> Result<()> {
        validate_learner_id(learner_id)?;
        let _guard = self.locks.lock(learner_id).await;

        self.store
            .reset(learner_id)
            .await
            .context("Failed to reset learner progress")?;

        PROGRESS_RESETS_TOTAL.inc();
        tracing::warn!("Progress reset for learner {}", learner_id);
        Ok(())
    }

    pub async fn verify_lab(
        &self,
        learner_id: &str,
        lab_id: &str,
        output: &str,
    ) -> Result<VerifyLabResponse> {
        validate_learner_id(learner_id)?;
        let lab = find_lab(lab_id)?;
        let outcome = verify_submission(lab, output);
        let feedback = pick_feedback(outcome.band, &mut rand::rng());
        self.finish_verification(learner_id, lab, outcome, feedback)
            .await
    }

    /// Same as [`verify_lab`](Self::verify_lab) with a caller-chosen feedback
    /// message index.
    pub async fn verify_lab_with<F>(
        &self,
        learner_id: &str,
        lab_id: &str,
        output: &str,
        select: F,
    ) -> Result<VerifyLabResponse>
    where
        F: FnOnce(usize) -> usize,
    {
        validate_learner_id(learner_id)?;
        let lab = find_lab(lab_id)?;
        let outcome = verify_submission(lab, output);
        let feedback = pick_feedback_with(outcome.band, select);
        self.finish_verification(learner_id, lab, outcome, feedback)
            .await
    }

    async fn finish_verification(
        &self,
        learner_id: &str,
        lab: &'static LabCheck,
        outcome: VerificationOutcome,
        feedback: &'static str,
    ) -> Result<VerifyLabResponse> {
        let result = if outcome.passed { "passed" } else { "failed" };
        LAB_VERIFICATIONS_TOTAL.with_label_values(&[result]).inc();
        tracing::info!(
            "Lab {} verification for learner {}: {} ({}%)",
            lab.id,
            learner_id,
            result,
            outcome.score
        );

        let logged = if outcome.passed {
            let pending = PendingActivity {
                kind: lab.credits,
                description: format!("Verified: {}", lab.title),
                timestamp: Utc::now(),
                week: None,
                lab_id: Some(lab.id),
            };
            self.record_activity(learner_id, pending).await?
        } else {
            None
        };

        Ok(VerifyLabResponse {
            lab_id: lab.id.to_string(),
            already_credited: outcome.passed && logged.is_none(),
            outcome,
            feedback,
            logged,
        })
    }
}
