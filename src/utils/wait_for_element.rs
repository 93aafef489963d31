//! Bounded polling for state that SPAs attach after the load event
//!
//! Both the source-state wait and the feed-container wait poll a fixed number
//! of times at a fixed interval and then give up; neither loop takes an
//! external cancellation token.

use std::future::Future;
use std::time::Duration;

use chromiumoxide::Page;
use tracing::trace;

/// Poll `probe` until it yields `Some`, at most `max_attempts` times
///
/// Sleeps `interval` between attempts (not after the last one). The probe gets
/// the zero-based attempt number.
pub async fn poll_attempts<T, F, Fut>(max_attempts: u32, interval: Duration, mut probe: F) -> Option<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Option<T>>,
{
    for attempt in 0..max_attempts {
        if let Some(found) = probe(attempt).await {
            return Some(found);
        }
        trace!("Poll attempt {}/{} missed", attempt + 1, max_attempts);
        if attempt + 1 < max_attempts {
            tokio::time::sleep(interval).await;
        }
    }
    None
}

/// Single, non-failing check for an element matching `selector`
pub async fn element_present(page: &Page, selector: &str) -> bool {
    page.find_element(selector).await.is_ok()
}
