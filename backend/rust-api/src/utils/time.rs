use chrono::{DateTime, FixedOffset, Utc};
use mongodb::bson::DateTime as BsonDateTime;

pub fn chrono_to_bson(dt: DateTime<Utc>) -> BsonDateTime {
    BsonDateTime::from_millis(dt.timestamp_millis())
}

pub fn bson_to_chrono(dt: BsonDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(dt.timestamp_millis())
}

/// Fixed offset from a minute count, `None` when outside ±24h.
pub fn offset_from_minutes(minutes: i32) -> Option<FixedOffset> {
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
}
