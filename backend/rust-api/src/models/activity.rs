use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::stats::UserStats;
use crate::progression::ProgressionError;

/// Every loggable action. Adding a variant forces the reward, counter and
/// hours tables in `progression::activity` to be updated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    StudySession,
    LabSession,
    ProjectWork,
    BlogPost,
    CommunityHelp,
    GithubCommit,
    QuizCompletion,
}

impl ActivityKind {
    pub const ALL: [ActivityKind; 7] = [
        ActivityKind::StudySession,
        ActivityKind::LabSession,
        ActivityKind::ProjectWork,
        ActivityKind::BlogPost,
        ActivityKind::CommunityHelp,
        ActivityKind::GithubCommit,
        ActivityKind::QuizCompletion,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::StudySession => "study_session",
            ActivityKind::LabSession => "lab_session",
            ActivityKind::ProjectWork => "project_work",
            ActivityKind::BlogPost => "blog_post",
            ActivityKind::CommunityHelp => "community_help",
            ActivityKind::GithubCommit => "github_commit",
            ActivityKind::QuizCompletion => "quiz_completion",
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityKind {
    type Err = ProgressionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        ActivityKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| ProgressionError::UnknownActivityKind(value.to_string()))
    }
}

/// One logged event. Never edited after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityLog {
    pub id: String,
    pub learner_id: String,
    pub kind: ActivityKind,
    pub description: String,
    pub xp_awarded: u64,
    pub timestamp: DateTime<Utc>,
    pub week: Option<u32>,
    /// Lab whose passing verification produced this entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lab_id: Option<String>,
}

/// Incoming "log activity" payload. `kind` and `timestamp` stay strings so
/// that unknown kinds and malformed timestamps are rejected by the engine
/// with a precise error instead of a generic body rejection.
#[derive(Debug, Deserialize, Validate)]
pub struct LogActivityRequest {
    pub kind: String,
    #[serde(default)]
    #[validate(length(max = 500, message = "description must be at most 500 characters"))]
    pub description: String,
    pub timestamp: Option<String>,
    #[validate(range(min = 1, max = 53, message = "week must be between 1 and 53"))]
    pub week: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct LogActivityResponse {
    pub activity: ActivityLog,
    pub xp_awarded: u64,
    pub leveled_up: bool,
    pub stats: UserStats,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ActivityKindInfo {
    pub kind: ActivityKind,
    pub xp_reward: u64,
    pub study_hours: f64,
}
