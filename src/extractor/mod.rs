//! Source-page extractor
//!
//! Waits for the page's embedded state, normalizes it into records and writes
//! them through to the store. Failures never escape this module: they resolve
//! to [`ExtractionOutcome::Failed`], which leaves the cache untouched.

mod change_detector;
mod session;

pub use change_detector::{ChangeDetector, DetectorTiming};
pub use session::SourceSession;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, trace, warn};

use crate::SiteConfig;
use crate::model::VideoRecord;
use crate::page_extractor::{self, StateProbe};
use crate::store::StoreHandle;
use crate::utils::poll_attempts;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Source data unavailable: {0}")]
    SourceDataUnavailable(String),

    #[error("Page error: {0}")]
    Page(String),
}

/// The source playlist page as seen by the extractor
#[async_trait]
pub trait SourcePage: Send + Sync {
    async fn current_url(&self) -> Result<String, ExtractError>;

    /// Presence of the embedded state root and its populated marker
    async fn probe_state(&self) -> Result<StateProbe, ExtractError>;

    /// The embedded state object, if attached
    async fn read_state(&self) -> Result<Option<Value>, ExtractError>;

    /// Text of inline scripts that may carry the state assignment
    async fn inline_scripts(&self) -> Result<Vec<String>, ExtractError>;

    /// Mutations observed in the list container since observation started
    ///
    /// Starts observing on first call and re-binds if the container is replaced.
    async fn mutation_count(&self) -> Result<u64, ExtractError>;

    async fn stop_observing(&self) -> Result<(), ExtractError>;
}

/// Result of `wait_for_source_data`
#[derive(Debug, Clone, PartialEq)]
pub enum SourceReadiness {
    Ready(Value),
    Timeout,
}

/// What an extraction run did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionOutcome {
    /// Records were written through to the store (0 means confirmed empty)
    Published(usize),
    /// The id set matched the last extraction; nothing written
    Unchanged,
    /// No record list was produced; nothing written
    Failed(String),
}

impl ExtractionOutcome {
    pub fn is_published(&self) -> bool {
        matches!(self, ExtractionOutcome::Published(_))
    }
}

/// Attempts and interval for the state wait
#[derive(Debug, Clone, Copy)]
pub struct SourceWait {
    pub max_attempts: u32,
    pub poll_interval: Duration,
}

impl From<&crate::ExtractorConfig> for SourceWait {
    fn from(config: &crate::ExtractorConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            poll_interval: config.poll_interval(),
        }
    }
}

pub struct Extractor {
    page: Arc<dyn SourcePage>,
    store: StoreHandle,
    site: SiteConfig,
    wait: SourceWait,
    known_ids: Option<HashSet<String>>,
}

impl Extractor {
    pub fn new(
        page: Arc<dyn SourcePage>,
        store: StoreHandle,
        site: SiteConfig,
        wait: SourceWait,
    ) -> Self {
        Self {
            page,
            store,
            site,
            wait,
            known_ids: None,
        }
    }

    /// Ids from the last successful extraction
    pub fn known_ids(&self) -> Option<&HashSet<String>> {
        self.known_ids.as_ref()
    }

    /// Poll until the state root is attached and populated
    ///
    /// Tolerates the state arriving after the load event. Probe errors count as
    /// misses.
    pub async fn wait_for_source_data(&self) -> SourceReadiness {
        let page = &self.page;
        let found = poll_attempts(self.wait.max_attempts, self.wait.poll_interval, |attempt| async move {
            match page.probe_state().await {
                Ok(probe) if probe.is_ready() => {}
                Ok(probe) => {
                    trace!("State not ready on attempt {}: {:?}", attempt + 1, probe);
                    return None;
                }
                Err(e) => {
                    trace!("State probe failed on attempt {}: {}", attempt + 1, e);
                    return None;
                }
            }
            match page.read_state().await {
                Ok(Some(state)) if page_extractor::has_populated_marker(&state) => Some(state),
                Ok(_) => None,
                Err(e) => {
                    trace!("State read failed on attempt {}: {}", attempt + 1, e);
                    None
                }
            }
        })
        .await;

        match found {
            Some(state) => SourceReadiness::Ready(state),
            None => SourceReadiness::Timeout,
        }
    }

    /// The populated state, falling back to an inline script scan after a timeout
    pub async fn acquire_state(&self) -> Result<Value, ExtractError> {
        if let SourceReadiness::Ready(state) = self.wait_for_source_data().await {
            return Ok(state);
        }

        debug!(
            "State wait timed out after {} attempts, scanning inline scripts",
            self.wait.max_attempts
        );
        let scripts = self.page.inline_scripts().await?;
        page_extractor::find_initial_data(&scripts).ok_or_else(|| {
            ExtractError::SourceDataUnavailable(format!(
                "state not attached after {} attempts and not found in {} inline script(s)",
                self.wait.max_attempts,
                scripts.len()
            ))
        })
    }

    /// Records from a state object; `None` if the item array is missing
    pub fn extract(state: &Value) -> Option<Vec<VideoRecord>> {
        page_extractor::extract_records(state)
    }

    /// Whether the page is still on the saved playlist
    ///
    /// An unreadable URL counts as "not on it".
    pub async fn on_source_page(&self) -> bool {
        match self.page.current_url().await {
            Ok(url) => self.site.is_source_url(&url),
            Err(e) => {
                debug!("Could not read the page URL: {}", e);
                false
            }
        }
    }

    /// Acquire, extract and write through to the store
    ///
    /// A missing item array or unavailable state never touches the cache. A
    /// confirmed-empty list overwrites it. Nothing is written once the page
    /// has left the saved playlist.
    pub async fn run_extraction(&mut self) -> ExtractionOutcome {
        let state = match self.acquire_state().await {
            Ok(state) => state,
            Err(e) => {
                warn!("Extraction skipped: {}", e);
                return ExtractionOutcome::Failed(e.to_string());
            }
        };

        match Self::extract(&state) {
            Some(records) => {
                if !self.on_source_page().await {
                    info!("Page left the saved playlist; discarding {} record(s)", records.len());
                    return ExtractionOutcome::Failed("page left the source playlist".into());
                }
                self.publish(records).await
            }
            None => {
                warn!("Playlist items not found at either known path; cache left untouched");
                ExtractionOutcome::Failed("playlist items not found".into())
            }
        }
    }

    /// Re-extract and diff ids against the last extraction
    ///
    /// Performs a full extraction and overwrite only when the id set changed.
    pub async fn check_for_changes(&mut self) -> ExtractionOutcome {
        if !self.on_source_page().await {
            debug!("Change check skipped: page is not on the saved playlist");
            return ExtractionOutcome::Unchanged;
        }
        let state = match self.acquire_state().await {
            Ok(state) => state,
            Err(e) => {
                debug!("Change check skipped: {}", e);
                return ExtractionOutcome::Unchanged;
            }
        };
        let Some(records) = Self::extract(&state) else {
            debug!("Change check found no item array");
            return ExtractionOutcome::Unchanged;
        };

        let ids: HashSet<String> = records.into_iter().map(|r| r.id).collect();
        if self.known_ids.as_ref() == Some(&ids) {
            trace!("Change check: {} id(s) unchanged", ids.len());
            return ExtractionOutcome::Unchanged;
        }

        info!("Playlist contents changed, re-extracting");
        self.run_extraction().await
    }

    async fn publish(&mut self, records: Vec<VideoRecord>) -> ExtractionOutcome {
        let count = records.len();
        let ids: HashSet<String> = records.iter().map(|r| r.id.clone()).collect();

        if let Err(e) = self.store.write_cache(records).await {
            warn!("Cache write-through failed: {}", e);
            return ExtractionOutcome::Failed(e.to_string());
        }
        self.known_ids = Some(ids);

        if let Err(e) = self.store.notify_data_updated(count).await {
            warn!("Data update notification failed: {}", e);
        }

        info!("Published {} record(s) from the source page", count);
        ExtractionOutcome::Published(count)
    }
}
