//! Common test utilities

use chrono::{DateTime, Duration, TimeZone, Utc};
use weekly_report::analytics::{Series, Window};

/// Fixed reference instant for every test: Sunday 2024-03-10 12:00 UTC
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap()
}

/// The instant `days` days before [`now`]
pub fn days_ago(days: i64) -> DateTime<Utc> {
    now() - Duration::days(days)
}

/// The week ending at [`now`]
pub fn this_week() -> Window {
    Window::trailing_days(now(), 7).unwrap()
}

/// Build a series from `(days ago, count)` points
pub fn series(key: &str, points: &[(i64, u64)]) -> Series {
    Series::from_points(key, points.iter().map(|&(d, v)| (days_ago(d), v)))
}

/// Build a series from counts taken on consecutive hours inside the week
#[allow(dead_code)]
pub fn hourly_series(key: &str, counts: &[u64]) -> Series {
    let start = days_ago(6);
    Series::from_points(
        key,
        counts
            .iter()
            .enumerate()
            .map(|(i, &v)| (start + Duration::hours(i as i64), v)),
    )
}
