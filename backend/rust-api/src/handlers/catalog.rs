//! Read-only catalogs the client needs to render forms and badges.

use axum::Json;
use serde::Serialize;

use crate::{
    models::{ActivityKind, ActivityKindInfo, LabCheck},
    progression::{self, achievement_catalog, lab_catalog},
};

pub async fn list_activity_kinds() -> Json<Vec<ActivityKindInfo>> {
    Json(
        ActivityKind::ALL
            .into_iter()
            .map(|kind| ActivityKindInfo {
                kind,
                xp_reward: progression::xp_reward(kind),
                study_hours: progression::study_hours(kind),
            })
            .collect(),
    )
}

#[derive(Debug, Serialize)]
pub struct AchievementInfo {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub xp_reward: u64,
}

pub async fn list_achievements() -> Json<Vec<AchievementInfo>> {
    Json(
        achievement_catalog()
            .iter()
            .map(|a| AchievementInfo {
                id: a.id,
                title: a.title,
                description: a.description,
                xp_reward: a.xp_reward,
            })
            .collect(),
    )
}

pub async fn list_labs() -> Json<&'static [LabCheck]> {
    Json(lab_catalog())
}
