use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::page::Page;
use serde::de::DeserializeOwned;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use super::feed_scripts::{HookConfig, PageEvent, feed_call};
use super::{BrowserError, evaluate, page_url};
use crate::SiteConfig;
use crate::presenter::{FeedSurface, NavKey, PresenterError, ShelfView, Span, SurfaceEvent};
use crate::utils::constants::SHELF_ELEMENT_ID;
use crate::utils::element_present;

/// [`FeedSurface`] backed by a live Chrome tab
pub struct ChromeFeedSurface {
    page: Page,
    container_selector: String,
    hook_config: String,
}

impl From<BrowserError> for PresenterError {
    fn from(e: BrowserError) -> Self {
        PresenterError::Surface(e.to_string())
    }
}

impl ChromeFeedSurface {
    pub fn new(page: Page, site: &SiteConfig) -> Self {
        let hook_config = HookConfig::new(SHELF_ELEMENT_ID, &site.container_selector);
        Self {
            page,
            container_selector: site.container_selector.clone(),
            // Serializing plain strings cannot fail
            hook_config: serde_json::to_string(&hook_config).unwrap_or_else(|_| "{}".into()),
        }
    }

    async fn call<T: DeserializeOwned>(&self, expression: &str) -> Result<T, PresenterError> {
        Ok(evaluate(&self.page, &feed_call(&self.hook_config, expression)).await?)
    }

    /// Poll the page for navigation and queued page events
    ///
    /// The first tick only records the starting URL; later URL changes are
    /// reported as [`SurfaceEvent::Navigated`]. Stops when `cancel` fires or
    /// the receiver is dropped.
    pub fn spawn_event_pump(
        self: Arc<Self>,
        every: Duration,
        cancel: CancellationToken,
    ) -> (mpsc::UnboundedReceiver<SurfaceEvent>, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut last_url: Option<String> = None;

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        if self.pump_once(&tx, &mut last_url).await.is_err() {
                            break;
                        }
                    }
                }
            }
            debug!("Feed event pump stopped");
        });
        (rx, handle)
    }

    /// Err only when the receiver is gone
    async fn pump_once(
        &self,
        tx: &mpsc::UnboundedSender<SurfaceEvent>,
        last_url: &mut Option<String>,
    ) -> Result<(), mpsc::error::SendError<SurfaceEvent>> {
        match page_url(&self.page).await {
            Ok(url) => {
                let moved = last_url.as_deref().is_some_and(|last| last != url);
                if moved {
                    tx.send(SurfaceEvent::Navigated(url.clone()))?;
                }
                *last_url = Some(url);
            }
            Err(e) => trace!("Feed page URL unavailable: {}", e),
        }

        let events: Vec<PageEvent> = match self.call("feed.drain()").await {
            Ok(events) => events,
            Err(e) => {
                trace!("Feed event queue unavailable: {}", e);
                return Ok(());
            }
        };
        for event in events {
            let event = match event {
                PageEvent::Key { key } => match NavKey::from_key_name(&key) {
                    Some(key) => SurfaceEvent::Key(key),
                    None => continue,
                },
                PageEvent::Retry => SurfaceEvent::Retry,
                PageEvent::Removed => SurfaceEvent::ShelfRemoved,
            };
            tx.send(event)?;
        }
        Ok(())
    }
}

#[async_trait]
impl FeedSurface for ChromeFeedSurface {
    async fn current_url(&self) -> Result<String, PresenterError> {
        Ok(page_url(&self.page).await?)
    }

    async fn container_ready(&self) -> Result<bool, PresenterError> {
        Ok(element_present(&self.page, &self.container_selector).await)
    }

    async fn paint(&self, view: &ShelfView) -> Result<(), PresenterError> {
        let view_json =
            serde_json::to_string(view).map_err(|e| PresenterError::Surface(e.to_string()))?;
        let painted: bool = self.call(&format!("feed.paint({view_json})")).await?;
        if painted {
            Ok(())
        } else {
            Err(PresenterError::Surface(
                "feed container disappeared before painting".into(),
            ))
        }
    }

    async fn clear(&self) -> Result<(), PresenterError> {
        let _: bool = self.call("feed.clear()").await?;
        Ok(())
    }

    async fn focus_item(&self, index: usize) -> Result<(), PresenterError> {
        let _: bool = self.call(&format!("feed.focusItem({index})")).await?;
        Ok(())
    }

    async fn item_span(&self, index: usize) -> Result<Option<Span>, PresenterError> {
        self.call(&format!("feed.itemSpan({index})")).await
    }

    async fn viewport(&self) -> Result<Option<Span>, PresenterError> {
        self.call("feed.viewport()").await
    }

    async fn scroll_to(&self, offset: f64) -> Result<(), PresenterError> {
        let _: bool = self.call(&format!("feed.scrollTo({offset})")).await?;
        Ok(())
    }
}
