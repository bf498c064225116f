use std::collections::BTreeSet;

use crate::models::{Achievement, UserStats};

static CATALOG: [Achievement; 12] = [
    Achievement {
        id: "first_steps",
        title: "First Steps",
        description: "Complete your first study session.",
        xp_reward: 10,
        predicate: |s| s.sessions_completed >= 1,
    },
    Achievement {
        id: "study_habit",
        title: "Study Habit",
        description: "Complete 10 study sessions.",
        xp_reward: 50,
        predicate: |s| s.sessions_completed >= 10,
    },
    Achievement {
        id: "lab_rat",
        title: "Lab Rat",
        description: "Finish your first lab.",
        xp_reward: 25,
        predicate: |s| s.labs_completed >= 1,
    },
    Achievement {
        id: "lab_veteran",
        title: "Lab Veteran",
        description: "Finish 10 labs.",
        xp_reward: 100,
        predicate: |s| s.labs_completed >= 10,
    },
    Achievement {
        id: "builder",
        title: "Builder",
        description: "Log work on a project.",
        xp_reward: 25,
        predicate: |s| s.projects_completed >= 1,
    },
    Achievement {
        id: "quiz_whiz",
        title: "Quiz Whiz",
        description: "Complete 5 quizzes.",
        xp_reward: 50,
        predicate: |s| s.quizzes_completed >= 5,
    },
    Achievement {
        id: "author",
        title: "Author",
        description: "Publish your first blog post.",
        xp_reward: 25,
        predicate: |s| s.blogs_completed >= 1,
    },
    Achievement {
        id: "on_fire",
        title: "On Fire",
        description: "Keep a 7-day streak.",
        xp_reward: 75,
        predicate: |s| s.streak >= 7,
    },
    Achievement {
        id: "unstoppable",
        title: "Unstoppable",
        description: "Keep a 30-day streak.",
        xp_reward: 300,
        predicate: |s| s.streak >= 30,
    },
    Achievement {
        id: "dedicated",
        title: "Dedicated",
        description: "Accumulate 50 hours of study.",
        xp_reward: 150,
        predicate: |s| s.total_study_hours >= 50.0,
    },
    Achievement {
        id: "rising_star",
        title: "Rising Star",
        description: "Reach level 5.",
        xp_reward: 100,
        predicate: |s| s.level >= 5,
    },
    Achievement {
        id: "xp_hoarder",
        title: "XP Hoarder",
        description: "Earn 10,000 XP.",
        xp_reward: 500,
        predicate: |s| s.xp >= 10_000,
    },
];

pub fn achievement_catalog() -> &'static [Achievement] {
    &CATALOG
}

/// Ids of every achievement whose predicate holds for `stats`.
///
/// Nothing is remembered between calls: a reset snapshot unlocks nothing.
pub fn evaluate_achievements<'a>(stats: &UserStats, catalog: &'a [Achievement]) -> BTreeSet<&'a str> {
    catalog
        .iter()
        .filter(|achievement| (achievement.predicate)(stats))
        .map(|achievement| achievement.id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn catalog_ids_are_unique() {
        let ids: HashSet<_> = CATALOG.iter().map(|a| a.id).collect();
        assert_eq!(ids.len(), CATALOG.len());
    }

    #[test]
    fn defaults_unlock_nothing() {
        assert!(evaluate_achievements(&UserStats::default(), achievement_catalog()).is_empty());
    }

    #[test]
    fn predicates_read_current_stats() {
        let stats = UserStats {
            sessions_completed: 1,
            labs_completed: 10,
            streak: 7,
            ..UserStats::default()
        };
        let unlocked = evaluate_achievements(&stats, achievement_catalog());
        let expected: BTreeSet<&str> = ["first_steps", "lab_rat", "lab_veteran", "on_fire"]
            .into_iter()
            .collect();
        assert_eq!(unlocked, expected);
    }

    #[test]
    fn evaluation_is_idempotent() {
        let stats = UserStats {
            quizzes_completed: 5,
            ..UserStats::default()
        };
        let first = evaluate_achievements(&stats, achievement_catalog());
        let second = evaluate_achievements(&stats, achievement_catalog());
        assert_eq!(first, second);
    }

    #[test]
    fn growing_counters_keep_unlocks() {
        let mut stats = UserStats::default();
        let mut previous = BTreeSet::new();
        for _ in 0..40 {
            stats.sessions_completed += 1;
            stats.labs_completed += 1;
            stats.streak += 1;
            stats.total_study_hours += 2.0;
            let unlocked = evaluate_achievements(&stats, achievement_catalog());
            assert!(unlocked.is_superset(&previous));
            previous = unlocked;
        }
    }

    // Unlocks are derived, so zeroing stats re-locks everything. This pins the
    // current behaviour until achievements become persisted facts.
    #[test]
    fn reset_stats_relock_achievements() {
        let earned = UserStats {
            sessions_completed: 12,
            blogs_completed: 2,
            ..UserStats::default()
        };
        assert!(!evaluate_achievements(&earned, achievement_catalog()).is_empty());
        assert!(evaluate_achievements(&UserStats::default(), achievement_catalog()).is_empty());
    }

    #[test]
    fn custom_catalog_is_supported() {
        let catalog = [Achievement {
            id: "commit_any",
            title: "Any XP",
            description: "Earn any XP.",
            xp_reward: 1,
            predicate: |s| s.xp > 0,
        }];
        let stats = UserStats {
            xp: 25,
            ..UserStats::default()
        };
        assert!(evaluate_achievements(&stats, &catalog).contains("commit_any"));
    }
}
