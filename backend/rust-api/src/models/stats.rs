use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Progression snapshot for one learner.
///
/// `level` is always derived from `xp`; the only way to move a snapshot
/// forward is `progression::apply_activity`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStats {
    pub xp: u64,
    pub level: u32,
    pub streak: u32,
    pub last_activity_date: Option<DateTime<Utc>>,
    pub sessions_completed: u32,
    pub labs_completed: u32,
    pub projects_completed: u32,
    pub quizzes_completed: u32,
    pub blogs_completed: u32,
    pub total_study_hours: f64,
}

impl Default for UserStats {
    fn default() -> Self {
        Self {
            xp: 0,
            level: 1,
            streak: 0,
            last_activity_date: None,
            sessions_completed: 0,
            labs_completed: 0,
            projects_completed: 0,
            quizzes_completed: 0,
            blogs_completed: 0,
            total_study_hours: 0.0,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub learner_id: String,
    #[serde(flatten)]
    pub stats: UserStats,
    pub xp_to_next_level: Option<u64>,
    pub level_progress: f64,
}
