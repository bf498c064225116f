use serde::Serialize;

use crate::models::stats::UserStats;

/// Static catalog entry. The predicate must be pure: unlock status is
/// recomputed from the current stats on every query.
#[derive(Clone, Copy)]
pub struct Achievement {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub xp_reward: u64,
    pub predicate: fn(&UserStats) -> bool,
}

impl std::fmt::Debug for Achievement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Achievement")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("xp_reward", &self.xp_reward)
            .finish()
    }
}

#[derive(Debug, Serialize)]
pub struct AchievementStatus {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub xp_reward: u64,
    pub unlocked: bool,
}

impl AchievementStatus {
    pub fn new(achievement: &Achievement, unlocked: bool) -> Self {
        Self {
            id: achievement.id,
            title: achievement.title,
            description: achievement.description,
            xp_reward: achievement.xp_reward,
            unlocked,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AchievementsResponse {
    pub learner_id: String,
    pub unlocked_count: usize,
    pub achievements: Vec<AchievementStatus>,
}
