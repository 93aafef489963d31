//! Controller for one source-page context
//!
//! Owns the extractor state, starts change detection while the page stays on
//! the saved playlist, and tears every timer down once it navigates away.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use super::{
    ChangeDetector, DetectorTiming, ExtractionOutcome, Extractor, SourcePage, SourceWait,
};
use crate::messaging::{ContextEvent, ContextKind};
use crate::store::StoreHandle;
use crate::{ExtractorConfig, SiteConfig};

/// Running change-detection tasks for the current visit
struct ChangeWatch {
    cancel: CancellationToken,
    detector: JoinHandle<()>,
    pump: JoinHandle<()>,
}

impl ChangeWatch {
    async fn stop(self) {
        self.cancel.cancel();
        let _ = self.detector.await;
        let _ = self.pump.await;
    }
}

pub struct SourceSession {
    page: Arc<dyn SourcePage>,
    store: StoreHandle,
    site: SiteConfig,
    config: ExtractorConfig,
    extractor: Arc<Mutex<Extractor>>,
    last_url: Option<String>,
    watch: Option<ChangeWatch>,
}

impl SourceSession {
    pub fn new(
        page: Arc<dyn SourcePage>,
        store: StoreHandle,
        site: SiteConfig,
        config: ExtractorConfig,
    ) -> Self {
        let extractor = Extractor::new(
            page.clone(),
            store.clone(),
            site.clone(),
            SourceWait::from(&config),
        );
        Self {
            page,
            store,
            site,
            config,
            extractor: Arc::new(Mutex::new(extractor)),
            last_url: None,
            watch: None,
        }
    }

    /// Whether change-detection timers are running
    pub fn is_watching(&self) -> bool {
        self.watch.is_some()
    }

    pub fn extractor(&self) -> Arc<Mutex<Extractor>> {
        self.extractor.clone()
    }

    /// React to the page's current URL
    ///
    /// Arriving on (or moving within) the source page re-extracts; leaving it
    /// stops change detection. Returns the extraction outcome when one ran.
    pub async fn on_url(&mut self, url: &str) -> Option<ExtractionOutcome> {
        let changed = self.last_url.as_deref() != Some(url);
        self.last_url = Some(url.to_string());

        if !self.site.is_source_url(url) {
            if self.watch.is_some() {
                info!("Left the source page ({}), stopping change detection", url);
                self.stop_watching().await;
            }
            return None;
        }

        if !changed {
            return None;
        }

        debug!("On source page: {}", url);
        let outcome = self.extractor.lock().await.run_extraction().await;
        if self.watch.is_none() {
            self.start_watching();
        }
        Some(outcome)
    }

    /// Immediate re-extraction, bypassing the debounce
    ///
    /// Re-validates the page first; a request that arrives after navigating
    /// away is dropped.
    pub async fn rescrape(&mut self) -> Option<ExtractionOutcome> {
        let url = match self.page.current_url().await {
            Ok(url) => url,
            Err(e) => {
                warn!("Manual rescrape ignored, page URL unavailable: {}", e);
                return None;
            }
        };
        if !self.site.is_source_url(&url) {
            debug!("Manual rescrape ignored, not on the source page ({})", url);
            return None;
        }

        info!("Manual rescrape requested");
        let outcome = self.extractor.lock().await.run_extraction().await;
        if self.watch.is_none() {
            self.start_watching();
        }
        Some(outcome)
    }

    fn start_watching(&mut self) {
        let cancel = CancellationToken::new();
        let (tx, rx) = mpsc::unbounded_channel();

        let detector = ChangeDetector::new(
            self.extractor.clone(),
            rx,
            DetectorTiming::from(&self.config),
            cancel.child_token(),
        )
        .spawn();
        let pump = tokio::spawn(pump_mutations(
            self.page.clone(),
            tx,
            self.config.navigation_poll(),
            cancel.child_token(),
        ));

        debug!("Change detection started");
        self.watch = Some(ChangeWatch {
            cancel,
            detector,
            pump,
        });
    }

    async fn stop_watching(&mut self) {
        if let Some(watch) = self.watch.take() {
            watch.stop().await;
            if let Err(e) = self.page.stop_observing().await {
                debug!("Failed to disconnect list observer: {}", e);
            }
            debug!("Change detection stopped");
        }
    }

    /// Drive the session until `cancel` fires
    ///
    /// Polls the page URL for in-page navigation and serves manual rescrape
    /// requests broadcast by the store.
    pub async fn run(mut self, cancel: CancellationToken) {
        let (context_id, mut events) = self.store.attach(ContextKind::Source);
        let mut navigation = tokio::time::interval(self.config.navigation_poll());
        navigation.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("Source session started");
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,

                _ = navigation.tick() => match self.page.current_url().await {
                    Ok(url) => {
                        self.on_url(&url).await;
                    }
                    Err(e) => trace!("Source page URL unavailable: {}", e),
                },

                event = events.recv() => match event {
                    Some(ContextEvent::ManualRescrape) => {
                        self.rescrape().await;
                    }
                    Some(other) => trace!("Source session ignoring {:?}", other),
                    None => break,
                },
            }
        }

        self.stop_watching().await;
        self.store.detach(&context_id);
        info!("Source session stopped");
    }
}

/// Forward increases of the page's mutation counter as signals
async fn pump_mutations(
    page: Arc<dyn SourcePage>,
    signals: mpsc::UnboundedSender<()>,
    every: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last_seen: Option<u64> = None;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let count = match page.mutation_count().await {
                    Ok(count) => count,
                    Err(e) => {
                        trace!("Mutation counter unavailable: {}", e);
                        continue;
                    }
                };
                if last_seen.is_some_and(|seen| count > seen) && signals.send(()).is_err() {
                    break;
                }
                last_seen = Some(count);
            }
        }
    }
}
