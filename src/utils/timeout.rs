//! Interval and timeout validation for configured durations

use std::time::Duration;

use tracing::warn;

/// Maximum timeout for browser navigation operations (5 minutes)
/// Covers slow-loading sites, heavy SPAs, and network delays
pub const MAX_NAVIGATION_TIMEOUT_MS: u64 = 300_000;

/// Maximum delay between two polls of a page (30 seconds)
pub const MAX_POLL_INTERVAL_MS: u64 = 30_000;

/// Minimum delay between two polls of a page, to avoid spinning on CDP
pub const MIN_POLL_INTERVAL_MS: u64 = 10;

/// Validate a navigation timeout, capping it at `MAX_NAVIGATION_TIMEOUT_MS`
///
/// # Example
/// ```rust
/// use playlist_shelf::utils::validate_navigation_timeout;
/// let timeout = validate_navigation_timeout(Some(45_000), 30_000);
/// assert_eq!(timeout.as_millis(), 45_000);
/// ```
pub fn validate_navigation_timeout(timeout_ms: Option<u64>, default_ms: u64) -> Duration {
    let ms = timeout_ms.unwrap_or(default_ms);

    if ms > MAX_NAVIGATION_TIMEOUT_MS {
        warn!(
            "Navigation timeout {}ms exceeds {}ms ({} minutes), capping",
            ms,
            MAX_NAVIGATION_TIMEOUT_MS,
            MAX_NAVIGATION_TIMEOUT_MS / 60_000
        );
        return Duration::from_millis(MAX_NAVIGATION_TIMEOUT_MS);
    }

    Duration::from_millis(ms)
}

/// Validate a poll interval, keeping it within `[MIN_POLL_INTERVAL_MS, MAX_POLL_INTERVAL_MS]`
pub fn validate_poll_interval(interval_ms: u64, name: &str) -> Duration {
    let clamped = interval_ms.clamp(MIN_POLL_INTERVAL_MS, MAX_POLL_INTERVAL_MS);
    if clamped != interval_ms {
        warn!(
            "{} of {}ms is outside [{}, {}]ms, using {}ms",
            name, interval_ms, MIN_POLL_INTERVAL_MS, MAX_POLL_INTERVAL_MS, clamped
        );
    }
    Duration::from_millis(clamped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn navigation_timeout_is_capped() {
        assert_eq!(
            validate_navigation_timeout(None, 30_000),
            Duration::from_secs(30)
        );
        assert_eq!(
            validate_navigation_timeout(Some(10_000_000), 30_000),
            Duration::from_millis(MAX_NAVIGATION_TIMEOUT_MS)
        );
    }

    #[test]
    fn poll_interval_is_bounded() {
        assert_eq!(validate_poll_interval(0, "poll"), Duration::from_millis(10));
        assert_eq!(validate_poll_interval(800, "poll"), Duration::from_millis(800));
        assert_eq!(
            validate_poll_interval(90_000, "poll"),
            Duration::from_millis(MAX_POLL_INTERVAL_MS)
        );
    }
}
