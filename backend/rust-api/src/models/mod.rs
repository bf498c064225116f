pub mod achievement;
pub mod activity;
pub mod lab;
pub mod leaderboard;
pub mod stats;

pub use achievement::{Achievement, AchievementStatus, AchievementsResponse};
pub use activity::{
    ActivityKind, ActivityKindInfo, ActivityLog, HistoryQuery, LogActivityRequest,
    LogActivityResponse,
};
pub use lab::{LabCheck, ScoreBand, VerificationOutcome, VerifyLabRequest, VerifyLabResponse};
pub use leaderboard::{LeaderboardEntry, LeaderboardQuery, LeaderboardResponse};
pub use stats::{StatsResponse, UserStats};
