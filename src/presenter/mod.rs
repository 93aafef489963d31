//! Feed-page presenter
//!
//! Waits for the feed container, asks the store for cached records and paints
//! the shelf (or a placeholder, empty or error card) through a [`FeedSurface`].
//! Every failure ends in [`PresenterState::Error`] with an inline retry; none
//! escapes as an `Err`.

mod focus;
mod session;
mod state;
mod view;

pub use focus::{FocusRing, NavKey, Span, scroll_target};
pub use session::FeedSession;
pub use state::{FailureKind, PresenterState, RenderKind};
pub use view::{RenderDecision, ShelfItem, ShelfOrder, ShelfView, decide, select_for_display};

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, trace, warn};

use crate::model::Settings;
use crate::store::{StoreError, StoreHandle};
use crate::utils::poll_attempts;
use crate::{PresenterConfig, SiteConfig};

#[derive(Error, Debug)]
pub enum PresenterError {
    #[error("Feed container not found after {attempts} attempts")]
    ContainerNotFound { attempts: u32 },

    #[error("Failed to fetch cached records: {0}")]
    FetchFailed(String),

    #[error("Surface error: {0}")]
    Surface(String),
}

impl From<StoreError> for PresenterError {
    fn from(e: StoreError) -> Self {
        PresenterError::FetchFailed(e.to_string())
    }
}

/// The feed page as seen by the presenter
#[async_trait]
pub trait FeedSurface: Send + Sync {
    async fn current_url(&self) -> Result<String, PresenterError>;

    /// Single check for the feed container
    async fn container_ready(&self) -> Result<bool, PresenterError>;

    /// Replace whatever shelf is painted with `view`
    async fn paint(&self, view: &ShelfView) -> Result<(), PresenterError>;

    async fn clear(&self) -> Result<(), PresenterError>;

    async fn focus_item(&self, index: usize) -> Result<(), PresenterError>;

    /// Extent of item `index` in the shelf's scroll coordinates
    async fn item_span(&self, index: usize) -> Result<Option<Span>, PresenterError>;

    /// Currently visible extent of the shelf's scroll region
    async fn viewport(&self) -> Result<Option<Span>, PresenterError>;

    async fn scroll_to(&self, offset: f64) -> Result<(), PresenterError>;
}

/// Events raised by the feed page itself
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    Navigated(String),
    /// The host page dropped the painted shelf element
    ShelfRemoved,
    Key(NavKey),
    Retry,
}

pub struct Presenter {
    surface: Arc<dyn FeedSurface>,
    store: StoreHandle,
    site: SiteConfig,
    config: PresenterConfig,
    settings: Settings,
    state: PresenterState,
    focus: Option<FocusRing>,
}

impl Presenter {
    pub fn new(
        surface: Arc<dyn FeedSurface>,
        store: StoreHandle,
        site: SiteConfig,
        config: PresenterConfig,
    ) -> Self {
        Self {
            surface,
            store,
            site,
            config,
            settings: Settings::default(),
            state: PresenterState::Idle,
            focus: None,
        }
    }

    pub fn state(&self) -> PresenterState {
        self.state
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn focus_index(&self) -> Option<usize> {
        self.focus.map(|ring| ring.index())
    }

    pub fn store(&self) -> &StoreHandle {
        &self.store
    }

    /// Pull current settings from the store; keeps defaults on failure
    pub async fn load_settings(&mut self) {
        match self.store.request_settings().await {
            Ok(settings) => self.settings = settings,
            Err(e) => warn!("Using default settings, store unavailable: {}", e),
        }
    }

    /// Initial load or navigation of the feed page
    pub async fn on_page_ready(&mut self, url: &str) {
        self.teardown().await;
        if !self.settings.enabled {
            debug!("Shelf disabled, staying idle");
            return;
        }
        if !self.site.is_destination_url(url) {
            trace!("Not a destination page: {}", url);
            return;
        }
        self.show().await;
    }

    pub async fn on_settings_changed(&mut self, settings: Settings) {
        debug!("Settings changed, re-rendering");
        self.teardown().await;
        self.settings = settings;
        if self.settings.enabled {
            self.refresh().await;
        }
    }

    /// New records were published
    ///
    /// Re-renders even if the last known page was not the destination; the
    /// page check happens at render time.
    pub async fn on_data_changed(&mut self, count: usize) {
        if !self.settings.enabled {
            return;
        }
        debug!("Data changed ({} records), re-rendering", count);
        self.teardown().await;
        self.refresh().await;
    }

    pub async fn on_shelf_removed(&mut self) {
        if !self.state.is_painted() {
            return;
        }
        info!("Shelf removed by the host page, restoring");
        self.state = PresenterState::Idle;
        self.focus = None;
        self.refresh().await;
    }

    pub async fn on_retry(&mut self) {
        if !matches!(self.state, PresenterState::Error(_)) {
            return;
        }
        info!("Retrying after {:?}", self.state);
        self.teardown().await;
        self.refresh().await;
    }

    pub async fn on_key(&mut self, key: NavKey) {
        if self.state != PresenterState::Rendered(RenderKind::Content) {
            return;
        }
        let Some(ring) = self.focus.as_mut() else {
            return;
        };
        let index = ring.apply(key);

        if let Err(e) = self.surface.focus_item(index).await {
            debug!("Failed to focus item {}: {}", index, e);
            return;
        }
        if let Err(e) = self.scroll_into_view(index).await {
            debug!("Failed to scroll item {} into view: {}", index, e);
        }
    }

    pub async fn handle(&mut self, event: SurfaceEvent) {
        match event {
            SurfaceEvent::Navigated(url) => self.on_page_ready(&url).await,
            SurfaceEvent::ShelfRemoved => self.on_shelf_removed().await,
            SurfaceEvent::Key(key) => self.on_key(key).await,
            SurfaceEvent::Retry => self.on_retry().await,
        }
    }

    /// Remove anything painted and return to Idle
    pub async fn teardown(&mut self) {
        let painted = self.state.is_painted() || matches!(self.state, PresenterState::Error(_));
        self.state = PresenterState::Idle;
        self.focus = None;
        if painted && let Err(e) = self.surface.clear().await {
            debug!("Failed to clear shelf: {}", e);
        }
    }

    /// Render only if the page is still the destination
    async fn refresh(&mut self) {
        match self.surface.current_url().await {
            Ok(url) if self.site.is_destination_url(&url) => self.show().await,
            Ok(url) => debug!("Skipping render, page moved to {}", url),
            Err(e) => warn!("Skipping render, page URL unavailable: {}", e),
        }
    }

    async fn show(&mut self) {
        self.state = PresenterState::AwaitingContainer;
        if let Err(e) = self.await_container().await {
            warn!("{}", e);
            self.fail(FailureKind::ContainerTimeout, &e).await;
            return;
        }
        self.on_container_ready().await;
    }

    async fn await_container(&self) -> Result<(), PresenterError> {
        let attempts = self.config.container_max_attempts;
        let surface = self.surface.clone();
        let found = poll_attempts(attempts, self.config.container_poll(), |_| {
            let surface = surface.clone();
            async move {
                match surface.container_ready().await {
                    Ok(true) => Some(()),
                    Ok(false) => None,
                    Err(e) => {
                        trace!("Container check failed: {}", e);
                        None
                    }
                }
            }
        })
        .await;
        found.ok_or(PresenterError::ContainerNotFound { attempts })
    }

    async fn on_container_ready(&mut self) {
        let reply = match self
            .store
            .request_cached_records(self.settings.display_count)
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                let e = PresenterError::from(e);
                warn!("{}", e);
                self.fail(FailureKind::FetchFailed, &e).await;
                return;
            }
        };

        match decide(&reply, &self.settings, self.config.order) {
            RenderDecision::FirstRun => {
                let view = ShelfView::FirstRun {
                    source_url: self.site.source_url(),
                };
                if self.paint(&view).await {
                    info!("No cached playlist yet, showing first-run placeholder");
                    self.state = PresenterState::FirstRun;
                }
            }
            RenderDecision::Empty => {
                if self.paint(&ShelfView::Empty).await {
                    self.state = PresenterState::Rendered(RenderKind::Empty);
                }
            }
            RenderDecision::Nothing => {
                debug!("Playlist empty and empty state hidden");
                self.state = PresenterState::Idle;
            }
            RenderDecision::Content(records) => {
                let view = ShelfView::content(&records, self.settings.thumbnail_variant);
                if self.paint(&view).await {
                    info!("Shelf rendered with {} items", records.len());
                    self.focus = FocusRing::new(records.len());
                    self.state = PresenterState::Rendered(RenderKind::Content);
                }
            }
        }

        if !reply.is_found() && self.settings.auto_refresh_on_visit {
            debug!("Cache missing or stale, requesting a rescrape");
            if let Err(e) = self.store.request_manual_rescrape().await {
                warn!("Rescrape request failed: {}", e);
            }
        }
    }

    async fn fail(&mut self, failure: FailureKind, error: &PresenterError) {
        let view = ShelfView::Error {
            failure,
            message: error.to_string(),
        };
        if let Err(e) = self.surface.paint(&view).await {
            debug!("Failed to paint error card: {}", e);
        }
        self.focus = None;
        self.state = PresenterState::Error(failure);
    }

    async fn paint(&mut self, view: &ShelfView) -> bool {
        match self.surface.paint(view).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to paint shelf: {}", e);
                self.state = PresenterState::Idle;
                false
            }
        }
    }

    async fn scroll_into_view(&self, index: usize) -> Result<(), PresenterError> {
        let (Some(item), Some(viewport)) = (
            self.surface.item_span(index).await?,
            self.surface.viewport().await?,
        ) else {
            return Ok(());
        };
        if let Some(offset) = scroll_target(item, viewport) {
            self.surface.scroll_to(offset).await?;
        }
        Ok(())
    }
}
