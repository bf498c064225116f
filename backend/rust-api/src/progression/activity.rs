use chrono::{DateTime, FixedOffset, Utc};

use super::level::compute_level;
use super::streak::{calendar_day, compute_streak_continuation, StreakTransition};
use super::ProgressionError;
use crate::models::{ActivityKind, UserStats};

/// Per-kind counters on `UserStats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatCounter {
    Sessions,
    Labs,
    Projects,
    Quizzes,
    Blogs,
}

pub const fn xp_reward(kind: ActivityKind) -> u64 {
    match kind {
        ActivityKind::StudySession => 50,
        ActivityKind::LabSession => 100,
        ActivityKind::ProjectWork => 150,
        ActivityKind::BlogPost => 75,
        ActivityKind::CommunityHelp => 40,
        ActivityKind::GithubCommit => 25,
        ActivityKind::QuizCompletion => 60,
    }
}

/// Coarse study time credited per activity, in hours. Not a measured duration.
pub const fn study_hours(kind: ActivityKind) -> f64 {
    match kind {
        ActivityKind::StudySession => 1.5,
        ActivityKind::LabSession => 3.0,
        ActivityKind::ProjectWork => 2.0,
        ActivityKind::BlogPost => 1.0,
        ActivityKind::CommunityHelp => 0.5,
        ActivityKind::GithubCommit => 0.25,
        ActivityKind::QuizCompletion => 0.5,
    }
}

pub const fn counter_for(kind: ActivityKind) -> Option<StatCounter> {
    match kind {
        ActivityKind::StudySession => Some(StatCounter::Sessions),
        ActivityKind::LabSession => Some(StatCounter::Labs),
        ActivityKind::ProjectWork => Some(StatCounter::Projects),
        ActivityKind::QuizCompletion => Some(StatCounter::Quizzes),
        ActivityKind::BlogPost => Some(StatCounter::Blogs),
        ActivityKind::CommunityHelp | ActivityKind::GithubCommit => None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActivityOutcome {
    pub stats: UserStats,
    pub xp_awarded: u64,
    pub leveled_up: bool,
    pub streak: StreakTransition,
}

/// Applies one activity to a snapshot. The input is never touched; the
/// returned snapshot is built in full before it is handed back.
///
/// `offset` decides which calendar day `timestamp` falls on for streaks.
pub fn apply_activity(
    stats: &UserStats,
    kind: ActivityKind,
    timestamp: DateTime<Utc>,
    offset: FixedOffset,
) -> ActivityOutcome {
    let xp_awarded = xp_reward(kind);
    let mut next = stats.clone();

    next.xp = stats.xp.saturating_add(xp_awarded);
    next.level = compute_level(next.xp);

    let continuation = compute_streak_continuation(
        stats.last_activity_date.map(|last| calendar_day(last, offset)),
        calendar_day(timestamp, offset),
        stats.streak,
    );
    next.streak = continuation.after_logging();
    next.last_activity_date = match (continuation.transition, stats.last_activity_date) {
        (StreakTransition::OutOfOrder, Some(last)) => Some(last),
        _ => Some(timestamp),
    };

    if let Some(counter) = counter_for(kind) {
        let slot = match counter {
            StatCounter::Sessions => &mut next.sessions_completed,
            StatCounter::Labs => &mut next.labs_completed,
            StatCounter::Projects => &mut next.projects_completed,
            StatCounter::Quizzes => &mut next.quizzes_completed,
            StatCounter::Blogs => &mut next.blogs_completed,
        };
        *slot = slot.saturating_add(1);
    }
    next.total_study_hours += study_hours(kind);

    ActivityOutcome {
        // Compared against the level the old XP implies, not the stored field.
        leveled_up: next.level > compute_level(stats.xp),
        stats: next,
        xp_awarded,
        streak: continuation.transition,
    }
}

/// Parses a client-supplied RFC 3339 timestamp; an absent value means `now`.
/// A timestamp on a calendar day after `now`'s day (at `offset`) is rejected,
/// so streaks can only be built from days that have already happened.
pub fn parse_timestamp(
    raw: Option<&str>,
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> Result<DateTime<Utc>, ProgressionError> {
    let Some(value) = raw else {
        return Ok(now);
    };
    let parsed = DateTime::parse_from_rfc3339(value.trim())
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|_| ProgressionError::InvalidTimestamp(value.to_string()))?;

    if calendar_day(parsed, offset) > calendar_day(now, offset) {
        return Err(ProgressionError::FutureTimestamp(value.to_string()));
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn noon(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, d, 12, 0, 0).unwrap()
    }

    fn counters(stats: &UserStats) -> [u32; 5] {
        [
            stats.sessions_completed,
            stats.labs_completed,
            stats.projects_completed,
            stats.quizzes_completed,
            stats.blogs_completed,
        ]
    }

    #[test]
    fn first_activity_from_defaults() {
        let outcome = apply_activity(&UserStats::default(), ActivityKind::StudySession, noon(1), utc());

        assert_eq!(outcome.xp_awarded, 50);
        assert_eq!(outcome.stats.xp, 50);
        assert_eq!(outcome.stats.level, 1);
        assert_eq!(outcome.stats.streak, 1);
        assert_eq!(outcome.stats.sessions_completed, 1);
        assert_eq!(outcome.stats.last_activity_date, Some(noon(1)));
        assert!((outcome.stats.total_study_hours - 1.5).abs() < f64::EPSILON);
        assert_eq!(outcome.streak, StreakTransition::Start);
        assert!(!outcome.leveled_up);
    }

    #[test]
    fn lab_only_touches_lab_counter() {
        let outcome = apply_activity(&UserStats::default(), ActivityKind::LabSession, noon(1), utc());
        assert_eq!(counters(&outcome.stats), [0, 1, 0, 0, 0]);
        assert!((outcome.stats.total_study_hours - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn each_kind_increments_at_most_one_counter() {
        for kind in ActivityKind::ALL {
            let outcome = apply_activity(&UserStats::default(), kind, noon(1), utc());
            let total: u32 = counters(&outcome.stats).iter().sum();
            let expected = if counter_for(kind).is_some() { 1 } else { 0 };
            assert_eq!(total, expected, "kind {}", kind);
        }
    }

    #[test]
    fn awarded_xp_always_matches_table() {
        let seeded = UserStats {
            xp: 777,
            level: compute_level(777),
            streak: 3,
            last_activity_date: Some(noon(2)),
            ..UserStats::default()
        };
        for kind in ActivityKind::ALL {
            let outcome = apply_activity(&seeded, kind, noon(20), utc());
            assert_eq!(outcome.xp_awarded, xp_reward(kind));
            assert_eq!(outcome.stats.xp, 777 + xp_reward(kind));
        }
    }

    #[test]
    fn apply_is_pure() {
        let stats = UserStats {
            xp: 90,
            streak: 2,
            last_activity_date: Some(noon(4)),
            ..UserStats::default()
        };
        let before = stats.clone();
        let a = apply_activity(&stats, ActivityKind::QuizCompletion, noon(5), utc());
        let b = apply_activity(&stats, ActivityKind::QuizCompletion, noon(5), utc());
        assert_eq!(a, b);
        assert_eq!(stats, before);
    }

    #[test]
    fn crossing_a_threshold_levels_up() {
        let stats = UserStats {
            xp: 90,
            level: 1,
            ..UserStats::default()
        };
        let outcome = apply_activity(&stats, ActivityKind::StudySession, noon(1), utc());
        assert_eq!(outcome.stats.level, 2);
        assert!(outcome.leveled_up);
    }

    #[test]
    fn stale_stored_level_is_ignored() {
        let inconsistent = UserStats {
            xp: 0,
            level: 9,
            ..UserStats::default()
        };
        let outcome = apply_activity(&inconsistent, ActivityKind::ProjectWork, noon(1), utc());
        assert_eq!(outcome.stats.level, 2);
        assert!(outcome.leveled_up);

        let same_level = apply_activity(&inconsistent, ActivityKind::GithubCommit, noon(1), utc());
        assert_eq!(same_level.stats.level, 1);
        assert!(!same_level.leveled_up);
    }

    #[test]
    fn streak_rules_flow_through() {
        let base = UserStats {
            streak: 4,
            last_activity_date: Some(noon(10)),
            ..UserStats::default()
        };

        let same_day = apply_activity(&base, ActivityKind::BlogPost, noon(10) + Duration::hours(3), utc());
        assert_eq!(same_day.stats.streak, 4);

        let next_day = apply_activity(&base, ActivityKind::BlogPost, noon(11), utc());
        assert_eq!(next_day.stats.streak, 5);

        let gap = UserStats { streak: 10, ..base.clone() };
        let later = apply_activity(&gap, ActivityKind::BlogPost, noon(15), utc());
        assert_eq!(later.stats.streak, 1);
    }

    #[test]
    fn back_dated_activity_keeps_latest_date() {
        let base = UserStats {
            streak: 3,
            last_activity_date: Some(noon(10)),
            ..UserStats::default()
        };
        let outcome = apply_activity(&base, ActivityKind::GithubCommit, noon(8), utc());
        assert_eq!(outcome.stats.streak, 3);
        assert_eq!(outcome.stats.last_activity_date, Some(noon(10)));
        assert_eq!(outcome.stats.xp, 25);
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let err = "meditation".parse::<ActivityKind>().unwrap_err();
        assert_eq!(err, ProgressionError::UnknownActivityKind("meditation".into()));
        assert_eq!("lab_session".parse::<ActivityKind>(), Ok(ActivityKind::LabSession));
    }

    #[test]
    fn timestamps_parse_or_fail_fast() {
        let now = noon(1);
        assert_eq!(parse_timestamp(None, now, utc()), Ok(now));
        assert_eq!(
            parse_timestamp(Some("2026-02-28T09:30:00+02:00"), now, utc()),
            Ok(Utc.with_ymd_and_hms(2026, 2, 28, 7, 30, 0).unwrap())
        );
        assert!(matches!(
            parse_timestamp(Some("yesterday"), now, utc()),
            Err(ProgressionError::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn future_days_are_rejected() {
        let now = noon(1);
        assert!(matches!(
            parse_timestamp(Some("2099-01-01T00:00:00Z"), now, utc()),
            Err(ProgressionError::FutureTimestamp(_))
        ));
        assert!(matches!(
            parse_timestamp(Some("2026-03-02T00:00:00Z"), now, utc()),
            Err(ProgressionError::FutureTimestamp(_))
        ));
        // Later the same day is still today.
        assert!(parse_timestamp(Some("2026-03-01T23:59:59Z"), now, utc()).is_ok());
    }

    #[test]
    fn future_check_uses_the_streak_offset() {
        // 22:30 UTC on March 1 is already March 2 at +03:00.
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 22, 30, 0).unwrap();
        let plus_three = FixedOffset::east_opt(3 * 3600).unwrap();
        let early_march_2 = "2026-03-02T01:00:00+03:00";

        assert!(parse_timestamp(Some(early_march_2), now, plus_three).is_ok());
        assert!(matches!(
            parse_timestamp(Some("2026-03-02T23:00:00Z"), now, utc()),
            Err(ProgressionError::FutureTimestamp(_))
        ));
    }
}
