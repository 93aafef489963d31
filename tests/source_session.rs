mod support;

use std::sync::Arc;
use std::time::Duration;

use playlist_shelf::extractor::ExtractionOutcome;
use playlist_shelf::messaging::{CachedRecords, ContextKind};
use playlist_shelf::{ExtractorConfig, SourceSession, StoreHandle};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use support::*;

fn session(page: Arc<FakeSourcePage>, store: StoreHandle) -> SourceSession {
    SourceSession::new(page, store, site(), ExtractorConfig::default())
}

async fn cached_len(store: &StoreHandle) -> Option<usize> {
    match store.request_cached_records(10).await.unwrap() {
        CachedRecords::Found { records, .. } => Some(records.len()),
        CachedRecords::Missing { .. } => None,
    }
}

#[tokio::test(start_paused = true)]
async fn arriving_on_the_source_page_extracts_and_starts_watching() {
    init_tracing();
    let (store, _clock) = spawn_store();
    let page = FakeSourcePage::new(SOURCE_URL);
    page.set_state(Some(playlist_state(&["a", "b"])));

    let mut session = session(page.clone(), store.clone());
    assert_eq!(session.on_url(SOURCE_URL).await, Some(ExtractionOutcome::Published(2)));
    assert!(session.is_watching());

    // Same URL again is not a new visit
    assert_eq!(session.on_url(SOURCE_URL).await, None);
    assert_eq!(cached_len(&store).await, Some(2));
}

#[tokio::test(start_paused = true)]
async fn mutation_burst_is_debounced_into_one_check() {
    let (store, _clock) = spawn_store();
    let page = FakeSourcePage::new(SOURCE_URL);
    page.set_state(Some(playlist_state(&["a", "b"])));

    let mut session = session(page.clone(), store.clone());
    session.on_url(SOURCE_URL).await;
    let reads_after_visit = page.reads();

    // Mutation counter polled every 500ms, debounce 800ms, fallback 3000ms
    page.set_state(Some(playlist_state(&["a", "b", "c"])));
    page.mutate();
    sleep(Duration::from_millis(300)).await;
    page.mutate();
    sleep(Duration::from_millis(300)).await;
    page.mutate();

    // Last signal seen at 1000ms, so the check is due at 1800ms
    sleep(Duration::from_millis(1000)).await;
    assert_eq!(page.reads(), reads_after_visit);
    assert_eq!(cached_len(&store).await, Some(2));

    sleep(Duration::from_millis(300)).await;
    assert_eq!(cached_len(&store).await, Some(3));
    // One diff read plus one full extraction read
    assert_eq!(page.reads(), reads_after_visit + 2);
}

#[tokio::test(start_paused = true)]
async fn fallback_poll_catches_missed_mutations() {
    let (store, _clock) = spawn_store();
    let page = FakeSourcePage::new(SOURCE_URL);
    page.set_state(Some(playlist_state(&["a"])));

    let mut session = session(page.clone(), store.clone());
    session.on_url(SOURCE_URL).await;

    // Changes without any observed mutation
    page.set_state(Some(playlist_state(&["a", "b"])));
    sleep(Duration::from_millis(2900)).await;
    assert_eq!(cached_len(&store).await, Some(1));

    sleep(Duration::from_millis(200)).await;
    assert_eq!(cached_len(&store).await, Some(2));
}

#[tokio::test(start_paused = true)]
async fn leaving_the_source_page_tears_down_every_timer() {
    let (store, _clock) = spawn_store();
    let page = FakeSourcePage::new(SOURCE_URL);
    page.set_state(Some(playlist_state(&["a"])));

    let mut session = session(page.clone(), store.clone());
    session.on_url(SOURCE_URL).await;
    sleep(Duration::from_millis(600)).await;
    assert!(page.is_observing());

    page.set_url(OTHER_URL);
    assert_eq!(session.on_url(OTHER_URL).await, None);
    assert!(!session.is_watching());
    assert!(!page.is_observing());
    assert_eq!(page.stop_calls.load(std::sync::atomic::Ordering::SeqCst), 1);

    // Nothing polls or extracts after teardown
    let reads = page.reads();
    page.set_state(Some(playlist_state(&["a", "b"])));
    page.mutate();
    sleep(Duration::from_secs(30)).await;
    assert_eq!(page.reads(), reads);
    assert!(!page.is_observing());
    assert_eq!(cached_len(&store).await, Some(1));
}

#[tokio::test(start_paused = true)]
async fn returning_to_the_source_page_restarts_detection() {
    let (store, _clock) = spawn_store();
    let page = FakeSourcePage::new(SOURCE_URL);
    page.set_state(Some(playlist_state(&["a"])));

    let mut session = session(page.clone(), store.clone());
    session.on_url(SOURCE_URL).await;
    session.on_url(OTHER_URL).await;

    page.set_state(Some(playlist_state(&["a", "b"])));
    assert_eq!(session.on_url(SOURCE_URL).await, Some(ExtractionOutcome::Published(2)));
    assert!(session.is_watching());
}

#[tokio::test(start_paused = true)]
async fn manual_rescrape_bypasses_the_debounce() {
    let (store, _clock) = spawn_store();
    let page = FakeSourcePage::new(SOURCE_URL);
    page.set_state(Some(playlist_state(&["a"])));

    let cancel = CancellationToken::new();
    let task = tokio::spawn(session(page.clone(), store.clone()).run(cancel.clone()));
    sleep(Duration::from_millis(100)).await;
    assert_eq!(store.attached(ContextKind::Source), 1);
    assert_eq!(cached_len(&store).await, Some(1));

    page.set_state(Some(playlist_state(&["a", "b", "c"])));
    store.request_manual_rescrape().await.unwrap();
    sleep(Duration::from_millis(50)).await;
    assert_eq!(cached_len(&store).await, Some(3));

    cancel.cancel();
    task.await.unwrap();
    assert_eq!(store.attached(ContextKind::Source), 0);
    assert!(!page.is_observing());
}

#[tokio::test(start_paused = true)]
async fn manual_rescrape_after_navigating_away_is_ignored() {
    let (store, _clock) = spawn_store();
    let page = FakeSourcePage::new(SOURCE_URL);
    page.set_state(Some(playlist_state(&["a"])));

    let mut session = session(page.clone(), store.clone());
    session.on_url(SOURCE_URL).await;

    page.set_url(OTHER_URL);
    page.set_state(Some(playlist_state(&["a", "b"])));
    assert_eq!(session.rescrape().await, None);
    assert_eq!(cached_len(&store).await, Some(1));
}

#[tokio::test(start_paused = true)]
async fn checks_after_moving_to_another_playlist_leave_the_cache_alone() {
    let (store, _clock) = spawn_store();
    let page = FakeSourcePage::new(SOURCE_URL);
    page.set_state(Some(playlist_state(&["a"])));

    let mut session = session(page.clone(), store.clone());
    session.on_url(SOURCE_URL).await;

    // Navigation not yet noticed by the session; both timers fire first
    page.set_url("https://www.youtube.com/playlist?list=PLother");
    page.set_state(Some(playlist_state(&["x", "y"])));
    page.mutate();
    sleep(Duration::from_millis(3100)).await;

    match store.request_cached_records(10).await.unwrap() {
        CachedRecords::Found { records, .. } => {
            let ids: Vec<_> = records.into_iter().map(|r| r.id).collect();
            assert_eq!(ids, ["a"]);
        }
        other => panic!("unexpected reply: {other:?}"),
    }
}
