// Daily update-hour throttle: publish at most once per day, no earlier than hour H.

use chrono::{DateTime, LocalResult, TimeDelta, TimeZone, Utc};

/// Whether a freshly computed value must be held back.
///
/// Suppresses when the window for today has not opened yet (`now` strictly
/// before today's boundary) or when the prior publish already happened at or
/// after that boundary. No configured hour or no prior publish never suppresses.
pub fn should_suppress<Tz: TimeZone>(
    daily_update_hour: Option<u32>,
    prior_published_at: Option<DateTime<Utc>>,
    now: &DateTime<Tz>,
) -> bool {
    let Some(hour) = daily_update_hour else {
        return false;
    };
    let Some(prior) = prior_published_at else {
        return false;
    };
    let Some(boundary) = boundary_today(hour, now) else {
        return false;
    };

    if boundary > *now {
        return true;
    }
    prior >= boundary
}

/// Today's date at `hour`:00:00 in `now`'s timezone.
///
/// A boundary inside a spring-forward gap moves one hour later; an ambiguous
/// one takes the earlier instant.
pub fn boundary_today<Tz: TimeZone>(hour: u32, now: &DateTime<Tz>) -> Option<DateTime<Tz>> {
    let naive = now.date_naive().and_hms_opt(hour, 0, 0)?;
    let tz = now.timezone();
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(t) => Some(t),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        LocalResult::None => tz
            .from_local_datetime(&(naive + TimeDelta::hours(1)))
            .earliest(),
    }
}
