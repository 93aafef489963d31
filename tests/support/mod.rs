//! In-memory stand-ins for the two browser pages
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};

use playlist_shelf::extractor::{ExtractError, SourcePage};
use playlist_shelf::page_extractor::{StateProbe, has_populated_marker};
use playlist_shelf::presenter::{FeedSurface, PresenterError, ShelfView, Span};
use playlist_shelf::store::{ManualClock, MemoryBackend};
use playlist_shelf::{SiteConfig, Store, StoreHandle, StoreService};

pub const SOURCE_URL: &str = "https://www.youtube.com/playlist?list=WL";
pub const FEED_URL: &str = "https://www.youtube.com/";
pub const OTHER_URL: &str = "https://www.youtube.com/watch?v=elsewhere";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("playlist_shelf=debug")
        .with_test_writer()
        .try_init();
}

pub fn playlist_item(id: &str) -> Value {
    json!({
        "playlistVideoRenderer": {
            "videoId": id,
            "title": { "runs": [{ "text": format!("Video {id}") }] },
            "shortBylineText": { "runs": [{
                "text": "Channel",
                "navigationEndpoint": { "browseEndpoint": { "browseId": "UC1" } }
            }] },
            "lengthText": { "simpleText": "3:21" },
            "thumbnail": { "thumbnails": [
                { "url": format!("https://t/{id}/low.jpg") },
                { "url": format!("https://t/{id}/mid.jpg") },
                { "url": format!("https://t/{id}/high.jpg") }
            ] }
        }
    })
}

/// Populated playlist state with items in source order
pub fn playlist_state(ids: &[&str]) -> Value {
    let items: Vec<Value> = ids.iter().map(|id| playlist_item(id)).collect();
    json!({ "contents": { "twoColumnBrowseResultsRenderer": { "tabs": [{ "tabRenderer": { "content": {
        "sectionListRenderer": { "contents": [{ "itemSectionRenderer": { "contents": [{
            "playlistVideoListRenderer": { "contents": items }
        }] } }] }
    } } }] } } })
}

/// Store service over memory storage and a manual clock
pub fn spawn_store() -> (StoreHandle, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(1_700_000_000_000));
    let store = Store::new(Arc::new(MemoryBackend::new()), clock.clone());
    let (handle, _task) = StoreService::spawn(store);
    (handle, clock)
}

pub struct FakeSourcePage {
    url: Mutex<String>,
    state: Mutex<Option<Value>>,
    scripts: Mutex<Vec<String>>,
    mutations: AtomicU64,
    observing: AtomicBool,
    pub reads: AtomicUsize,
    pub stop_calls: AtomicUsize,
}

impl FakeSourcePage {
    pub fn new(url: &str) -> Arc<Self> {
        Arc::new(Self {
            url: Mutex::new(url.to_string()),
            state: Mutex::new(None),
            scripts: Mutex::new(Vec::new()),
            mutations: AtomicU64::new(0),
            observing: AtomicBool::new(false),
            reads: AtomicUsize::new(0),
            stop_calls: AtomicUsize::new(0),
        })
    }

    pub fn set_url(&self, url: &str) {
        *self.url.lock() = url.to_string();
    }

    pub fn set_state(&self, state: Option<Value>) {
        *self.state.lock() = state;
    }

    pub fn set_inline_scripts(&self, scripts: Vec<String>) {
        *self.scripts.lock() = scripts;
    }

    /// Simulate a DOM change in the list container
    pub fn mutate(&self) {
        self.mutations.fetch_add(1, Ordering::SeqCst);
    }

    pub fn is_observing(&self) -> bool {
        self.observing.load(Ordering::SeqCst)
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourcePage for FakeSourcePage {
    async fn current_url(&self) -> Result<String, ExtractError> {
        Ok(self.url.lock().clone())
    }

    async fn probe_state(&self) -> Result<StateProbe, ExtractError> {
        let state = self.state.lock();
        Ok(StateProbe {
            root: state.is_some(),
            populated: state.as_ref().is_some_and(has_populated_marker),
        })
    }

    async fn read_state(&self) -> Result<Option<Value>, ExtractError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.state.lock().clone())
    }

    async fn inline_scripts(&self) -> Result<Vec<String>, ExtractError> {
        Ok(self.scripts.lock().clone())
    }

    async fn mutation_count(&self) -> Result<u64, ExtractError> {
        self.observing.store(true, Ordering::SeqCst);
        Ok(self.mutations.load(Ordering::SeqCst))
    }

    async fn stop_observing(&self) -> Result<(), ExtractError> {
        self.observing.store(false, Ordering::SeqCst);
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Feed page whose items are laid out 200px apart in a scroll region
pub struct FakeFeedSurface {
    url: Mutex<String>,
    container: AtomicBool,
    shown: Mutex<Option<ShelfView>>,
    pub paints: Mutex<Vec<ShelfView>>,
    pub clears: AtomicUsize,
    pub container_checks: AtomicUsize,
    pub focused: Mutex<Vec<usize>>,
    pub scrolls: Mutex<Vec<f64>>,
    viewport: Mutex<Span>,
}

pub const ITEM_WIDTH: f64 = 200.0;

impl FakeFeedSurface {
    pub fn new(url: &str) -> Arc<Self> {
        Arc::new(Self {
            url: Mutex::new(url.to_string()),
            container: AtomicBool::new(true),
            shown: Mutex::new(None),
            paints: Mutex::new(Vec::new()),
            clears: AtomicUsize::new(0),
            container_checks: AtomicUsize::new(0),
            focused: Mutex::new(Vec::new()),
            scrolls: Mutex::new(Vec::new()),
            viewport: Mutex::new(Span {
                start: 0.0,
                end: 500.0,
            }),
        })
    }

    pub fn set_url(&self, url: &str) {
        *self.url.lock() = url.to_string();
    }

    pub fn set_container(&self, present: bool) {
        self.container.store(present, Ordering::SeqCst);
    }

    /// What is painted right now
    pub fn shown(&self) -> Option<ShelfView> {
        self.shown.lock().clone()
    }

    /// Host page re-render that drops the shelf
    pub fn drop_shelf(&self) {
        *self.shown.lock() = None;
    }

    pub fn paint_count(&self) -> usize {
        self.paints.lock().len()
    }

    /// Ids of the painted content shelf, in display order
    pub fn shown_ids(&self) -> Vec<String> {
        match self.shown() {
            Some(ShelfView::Content { items, .. }) => items.into_iter().map(|i| i.id).collect(),
            _ => Vec::new(),
        }
    }
}

#[async_trait]
impl FeedSurface for FakeFeedSurface {
    async fn current_url(&self) -> Result<String, PresenterError> {
        Ok(self.url.lock().clone())
    }

    async fn container_ready(&self) -> Result<bool, PresenterError> {
        self.container_checks.fetch_add(1, Ordering::SeqCst);
        Ok(self.container.load(Ordering::SeqCst))
    }

    async fn paint(&self, view: &ShelfView) -> Result<(), PresenterError> {
        if !self.container.load(Ordering::SeqCst) {
            return Err(PresenterError::Surface("no container".into()));
        }
        self.paints.lock().push(view.clone());
        *self.shown.lock() = Some(view.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), PresenterError> {
        self.clears.fetch_add(1, Ordering::SeqCst);
        *self.shown.lock() = None;
        Ok(())
    }

    async fn focus_item(&self, index: usize) -> Result<(), PresenterError> {
        self.focused.lock().push(index);
        Ok(())
    }

    async fn item_span(&self, index: usize) -> Result<Option<Span>, PresenterError> {
        let start = index as f64 * ITEM_WIDTH;
        Ok(Some(Span {
            start,
            end: start + ITEM_WIDTH,
        }))
    }

    async fn viewport(&self) -> Result<Option<Span>, PresenterError> {
        Ok(Some(*self.viewport.lock()))
    }

    async fn scroll_to(&self, offset: f64) -> Result<(), PresenterError> {
        self.scrolls.lock().push(offset);
        let mut viewport = self.viewport.lock();
        let width = viewport.width();
        *viewport = Span {
            start: offset,
            end: offset + width,
        };
        Ok(())
    }
}

pub fn site() -> SiteConfig {
    SiteConfig::default()
}
