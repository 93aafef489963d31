//! Messages exchanged between page contexts and the background store
//!
//! Requests carry a `oneshot` reply channel, the same command/response shape the
//! agent processor uses. Broadcasts are delivered per attached context and are
//! unordered with respect to navigation, so handlers re-validate their page.

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::model::{CacheEntry, Settings, SettingsPatch, VideoRecord};

/// Identifier handed to a page context when it attaches to the store
pub type ContextId = Uuid;

/// Which page a context runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContextKind {
    /// The saved-playlist page the extractor scrapes
    Source,
    /// The feed page the presenter injects into
    Destination,
}

/// Why `RequestCachedRecords` found nothing usable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MissingReason {
    NoData,
    Stale,
}

/// Reply to `RequestCachedRecords`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachedRecords {
    Found {
        /// Full record list in source order; ordering and truncation are applied by the presenter
        records: Vec<VideoRecord>,
        captured_at: i64,
        display_count: u32,
    },
    Missing {
        reason: MissingReason,
        /// The stale entry, for callers that explicitly want last-known data
        last_known: Option<CacheEntry>,
    },
}

impl CachedRecords {
    pub fn is_found(&self) -> bool {
        matches!(self, CachedRecords::Found { .. })
    }
}

/// Notifications pushed to attached contexts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextEvent {
    SettingsChanged(Settings),
    DataChanged(usize),
    ManualRescrape,
}

/// Requests handled by the store service
#[derive(Debug)]
pub enum StoreRequest {
    RequestSettings {
        reply: oneshot::Sender<Settings>,
    },
    SaveSettings {
        patch: SettingsPatch,
        reply: oneshot::Sender<Settings>,
    },
    ResetSettings {
        reply: oneshot::Sender<Settings>,
    },
    RequestCachedRecords {
        display_count: u32,
        reply: oneshot::Sender<CachedRecords>,
    },
    /// Write-through from the extractor; replies with the stamped capturedAt
    WriteCache {
        records: Vec<VideoRecord>,
        reply: oneshot::Sender<i64>,
    },
    /// Fire-and-forget; broadcast to destination contexts as `DataChanged`
    NotifyDataUpdated {
        count: usize,
    },
    /// Broadcast to source contexts as `ManualRescrape`
    RequestManualRescrape,
    ClearCache {
        reply: oneshot::Sender<()>,
    },
    HasData {
        reply: oneshot::Sender<bool>,
    },
}
