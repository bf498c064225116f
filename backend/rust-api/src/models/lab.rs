use serde::{Deserialize, Serialize};

use crate::models::activity::{ActivityKind, LogActivityResponse};

/// A lab or project whose output can be checked against expected fragments.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct LabCheck {
    pub id: &'static str,
    pub title: &'static str,
    pub credits: ActivityKind,
    #[serde(skip_serializing)]
    pub expected_fragments: &'static [&'static str],
}

#[derive(Debug, Deserialize)]
pub struct VerifyLabRequest {
    pub output: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    Excellent,
    Good,
    Fair,
    NeedsWork,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerificationOutcome {
    pub passed: bool,
    pub score: u8,
    pub matched: usize,
    pub required: usize,
    pub band: ScoreBand,
}

#[derive(Debug, Serialize)]
pub struct VerifyLabResponse {
    pub lab_id: String,
    #[serde(flatten)]
    pub outcome: VerificationOutcome,
    pub feedback: &'static str,
    /// Passed, but XP for this lab was already awarded earlier.
    pub already_credited: bool,
    pub logged: Option<LogActivityResponse>,
}
