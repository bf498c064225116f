use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::ProgressStore;
use crate::models::{ActivityLog, UserStats};

/// Process-local store, used for tests and single-node development.
#[derive(Default)]
pub struct MemoryProgressStore {
    stats: RwLock<HashMap<String, UserStats>>,
    history: RwLock<HashMap<String, Vec<ActivityLog>>>,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProgressStore for MemoryProgressStore {
    async fn load_stats(&self, learner_id: &str) -> anyhow::Result<Option<UserStats>> {
        Ok(self.stats.read().await.get(learner_id).cloned())
    }

    async fn save_stats(&self, learner_id: &str, stats: &UserStats) -> anyhow::Result<()> {
        self.stats
            .write()
            .await
            .insert(learner_id.to_string(), stats.clone());
        Ok(())
    }

    async fn append_activity(&self, entry: &ActivityLog) -> anyhow::Result<()> {
        self.history
            .write()
            .await
            .entry(entry.learner_id.clone())
            .or_default()
            .push(entry.clone());
        Ok(())
    }

    async fn load_history(
        &self,
        learner_id: &str,
        limit: usize,
    ) -> anyhow::Result<Vec<ActivityLog>> {
        let history = self.history.read().await;
        // Reverse first so the stable sort puts later inserts ahead on ties.
        let mut entries: Vec<ActivityLog> = history
            .get(learner_id)
            .map(|entries| entries.iter().rev().cloned().collect())
            .unwrap_or_default();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        entries.truncate(limit);
        Ok(entries)
    }

    async fn has_lab_credit(&self, learner_id: &str, lab_id: &str) -> anyhow::Result<bool> {
        Ok(self
            .history
            .read()
            .await
            .get(learner_id)
            .is_some_and(|entries| {
                entries
                    .iter()
                    .any(|entry| entry.lab_id.as_deref() == Some(lab_id))
            }))
    }

    async fn reset(&self, learner_id: &str) -> anyhow::Result<()> {
        self.stats.write().await.remove(learner_id);
        self.history.write().await.remove(learner_id);
        Ok(())
    }

    async fn list_stats(&self) -> anyhow::Result<Vec<(String, UserStats)>> {
        Ok(self
            .stats
            .read()
            .await
            .iter()
            .map(|(id, stats)| (id.clone(), stats.clone()))
            .collect())
    }

    async fn ping(&self) -> anyhow::Result<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
