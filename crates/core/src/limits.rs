//! Rate and send-window arithmetic. Pure functions consumed by the
//! dispatch loop; all counts come from persisted email timestamps so the
//! limiter stays correct across restarts and multiple scheduler instances.

use chrono::{DateTime, Datelike, Duration, Timelike, Utc, Weekday};

/// `hour` falls inside the half-open window `[start, end)` on a 0-23
/// scale. `end > start` is enforced at campaign creation, not here.
pub fn within_send_window(hour: u32, start: u32, end: u32) -> bool {
    hour >= start && hour < end
}

pub fn is_weekday(weekday: Weekday) -> bool {
    !matches!(weekday, Weekday::Sat | Weekday::Sun)
}

/// Remaining quota for this run: hourly and daily headroom, floored at
/// zero, whichever is smaller.
pub fn available_to_send(
    per_hour: u32,
    per_day: u32,
    sent_last_hour: u64,
    sent_today: u64,
) -> u32 {
    let hourly = u64::from(per_hour).saturating_sub(sent_last_hour);
    let daily = u64::from(per_day).saturating_sub(sent_today);
    hourly.min(daily).min(u64::from(u32::MAX)) as u32
}

/// Start of the rolling one-hour window.
pub fn hour_window_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::hours(1)
}

/// Midnight of the scheduler clock's current day.
pub fn day_window_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now.with_hour(0)
        .and_then(|t| t.with_minute(0))
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(now)
}

/// Window and weekday gate combined, from a single clock reading.
pub fn can_send_now(
    now: DateTime<Utc>,
    window_start: u32,
    window_end: u32,
    weekdays_only: bool,
) -> bool {
    if !within_send_window(now.hour(), window_start, window_end) {
        return false;
    }
    if weekdays_only && !is_weekday(now.weekday()) {
        return false;
    }
    true
}
