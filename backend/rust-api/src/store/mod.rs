//! Persistence port for learner progress.
//!
//! The engine never touches storage; services load a snapshot through a
//! [`ProgressStore`], run it through the engine and save the result.

pub mod memory;
pub mod mongo;

use async_trait::async_trait;

use crate::models::{ActivityLog, UserStats};

pub use memory::MemoryProgressStore;
pub use mongo::MongoProgressStore;

#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// `None` when the learner has never logged anything. A corrupt record
    /// is also reported as `None` rather than as an error.
    async fn load_stats(&self, learner_id: &str) -> anyhow::Result<Option<UserStats>>;

    async fn save_stats(&self, learner_id: &str, stats: &UserStats) -> anyhow::Result<()>;

    async fn append_activity(&self, entry: &ActivityLog) -> anyhow::Result<()>;

    /// Most recent first, at most `limit` entries.
    async fn load_history(&self, learner_id: &str, limit: usize)
        -> anyhow::Result<Vec<ActivityLog>>;

    /// Whether the history holds an activity credited by `lab_id`.
    async fn has_lab_credit(&self, learner_id: &str, lab_id: &str) -> anyhow::Result<bool>;

    /// Drops the learner's stats and history.
    async fn reset(&self, learner_id: &str) -> anyhow::Result<()>;

    async fn list_stats(&self) -> anyhow::Result<Vec<(String, UserStats)>>;

    async fn ping(&self) -> anyhow::Result<()>;

    fn backend_name(&self) -> &'static str;
}
