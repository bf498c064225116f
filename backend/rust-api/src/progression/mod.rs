//! Progression engine: pure functions that turn logged activities into XP,
//! levels, streaks and achievement unlocks.
//!
//! Nothing in here performs I/O or holds state. Callers load a `UserStats`
//! snapshot, run it through [`apply_activity`] and persist the result; the
//! read-compute-write sequence must not interleave with another one for the
//! same learner (see `services::progress_service::LearnerLocks`).

pub mod achievements;
pub mod activity;
pub mod feedback;
pub mod level;
pub mod streak;
pub mod verification;

use thiserror::Error;

pub use achievements::{achievement_catalog, evaluate_achievements};
pub use activity::{
    apply_activity, counter_for, parse_timestamp, study_hours, xp_reward, ActivityOutcome,
    StatCounter,
};
pub use feedback::{pick_feedback, pick_feedback_with};
pub use level::{compute_level, level_for_xp, level_progress, xp_to_next_level, LEVEL_THRESHOLDS};
pub use streak::{calendar_day, compute_streak_continuation, StreakContinuation, StreakTransition};
pub use verification::{find_lab, lab_catalog, verify_submission};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProgressionError {
    #[error("unknown activity kind: {0}")]
    UnknownActivityKind(String),

    #[error("malformed timestamp '{0}': expected RFC 3339")]
    InvalidTimestamp(String),

    #[error("timestamp '{0}' falls on a future day")]
    FutureTimestamp(String),

    #[error("unknown lab: {0}")]
    UnknownLab(String),

    #[error("invalid learner id '{0}': expected 1-64 letters, digits, '.', '_', '-' or '@'")]
    InvalidLearnerId(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}
