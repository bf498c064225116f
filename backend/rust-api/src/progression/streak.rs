use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::Serialize;

/// How a new activity relates to the previous one, by calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StreakTransition {
    /// No earlier activity.
    Start,
    /// Already active today; the streak must not double-increment.
    SameDay,
    /// Last activity was yesterday.
    Continue,
    /// A day or more was missed.
    Reset,
    /// Back-dated before the last activity.
    OutOfOrder,
}

/// Streak carried into the activity being logged, before that activity is
/// counted. Use [`StreakContinuation::after_logging`] for the stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakContinuation {
    pub transition: StreakTransition,
    pub carried: u32,
}

impl StreakContinuation {
    pub fn after_logging(&self) -> u32 {
        match self.transition {
            StreakTransition::Start | StreakTransition::Continue | StreakTransition::Reset => {
                self.carried + 1
            }
            // An activity today means the streak covers at least today.
            StreakTransition::SameDay | StreakTransition::OutOfOrder => self.carried.max(1),
        }
    }
}

/// Calendar day of `timestamp` as seen at `offset`; time of day is dropped.
pub fn calendar_day(timestamp: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    timestamp.with_timezone(&offset).date_naive()
}

pub fn compute_streak_continuation(
    last_activity_date: Option<NaiveDate>,
    today: NaiveDate,
    current_streak: u32,
) -> StreakContinuation {
    let Some(last) = last_activity_date else {
        return StreakContinuation {
            transition: StreakTransition::Start,
            carried: 0,
        };
    };

    match (today - last).num_days() {
        0 => StreakContinuation {
            transition: StreakTransition::SameDay,
            carried: current_streak,
        },
        1 => StreakContinuation {
            transition: StreakTransition::Continue,
            carried: current_streak,
        },
        days if days < 0 => StreakContinuation {
            transition: StreakTransition::OutOfOrder,
            carried: current_streak,
        },
        _ => StreakContinuation {
            transition: StreakTransition::Reset,
            carried: 0,
        },
    }
}
