//! Background store: sole owner of the playlist cache and the settings
//!
//! [`Store`] implements the cache/settings operations over a [`KvBackend`].
//! [`StoreService`] wraps it in an actor that page contexts reach through a
//! cloneable [`StoreHandle`].

mod backend;
mod clock;
mod registry;
mod service;

pub use backend::{FileBackend, KvBackend, MemoryBackend};
pub use clock::{Clock, ManualClock, SystemClock};
pub use registry::ContextRegistry;
pub use service::{StoreHandle, StoreService};

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::messaging::{CachedRecords, MissingReason};
use crate::model::{CacheEntry, CacheOrigin, Settings, SettingsPatch, VideoRecord};

/// Persisted key of the cache record
pub const CACHE_KEY: &str = "cache";
/// Persisted key of the settings record
pub const SETTINGS_KEY: &str = "settings";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage access failed: {0}")]
    StorageAccess(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Store channel closed: {0}")]
    ChannelClosed(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Fresh iff `now - captured_at <= ttl`
///
/// An entry stamped in the future (clock moved back since the write) is stale.
pub fn is_fresh(entry: &CacheEntry, ttl_millis: i64, now_millis: i64) -> bool {
    (0..=ttl_millis).contains(&entry.age_millis(now_millis))
}

/// Cache and settings over a key-value backend
///
/// Storage failures never escape: reads degrade to "absent"/defaults and
/// writes are logged.
pub struct Store {
    backend: Arc<dyn KvBackend>,
    clock: Arc<dyn Clock>,
}

impl Store {
    pub fn new(backend: Arc<dyn KvBackend>, clock: Arc<dyn Clock>) -> Self {
        Self { backend, clock }
    }

    /// File-backed store on the wall clock, creating `data_dir` if needed
    pub fn open(data_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let backend = FileBackend::new(data_dir)?;
        Ok(Self::new(Arc::new(backend), Arc::new(SystemClock)))
    }

    pub fn now_millis(&self) -> i64 {
        self.clock.now_millis()
    }

    /// `None` if never written, cleared, or unreadable
    pub async fn read_cache(&self) -> Option<CacheEntry> {
        let value = match self.backend.get(CACHE_KEY).await {
            Ok(value) => value?,
            Err(e) => {
                warn!("Cache read failed, treating as absent: {}", e);
                return None;
            }
        };

        match serde_json::from_value::<CacheEntry>(value) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Cached entry is malformed, treating as absent: {}", e);
                None
            }
        }
    }

    /// Freshness against the TTL in the current settings
    pub async fn is_fresh(&self, entry: &CacheEntry) -> bool {
        let settings = self.get_settings().await;
        is_fresh(entry, settings.ttl_millis(), self.now_millis())
    }

    /// Overwrite the cache with `records`, stamped now
    pub async fn write_cache(&self, records: Vec<VideoRecord>) -> i64 {
        let captured_at = self.now_millis();

        let count = records.len();
        let entry = CacheEntry {
            records,
            captured_at,
            origin: CacheOrigin::Scraped,
        };

        match serde_json::to_value(&entry) {
            Ok(value) => {
                if let Err(e) = self.backend.set(CACHE_KEY, value).await {
                    warn!("Cache write failed: {}", e);
                } else {
                    info!("Cached {} record(s) at {}", count, captured_at);
                }
            }
            Err(e) => warn!("Failed to serialize cache entry: {}", e),
        }

        captured_at
    }

    pub async fn clear_cache(&self) {
        if let Err(e) = self.backend.remove(CACHE_KEY).await {
            warn!("Cache clear failed: {}", e);
        } else {
            info!("Cache cleared");
        }
    }

    pub async fn has_data(&self) -> bool {
        self.read_cache().await.is_some()
    }

    /// Freshness-aware read for the destination page
    pub async fn cached_records(&self, display_count: u32) -> CachedRecords {
        let Some(entry) = self.read_cache().await else {
            return CachedRecords::Missing {
                reason: MissingReason::NoData,
                last_known: None,
            };
        };

        if self.is_fresh(&entry).await {
            CachedRecords::Found {
                records: entry.records,
                captured_at: entry.captured_at,
                display_count,
            }
        } else {
            debug!(
                "Cache entry is stale (age {}ms)",
                entry.age_millis(self.now_millis())
            );
            CachedRecords::Missing {
                reason: MissingReason::Stale,
                last_known: Some(entry),
            }
        }
    }

    /// Stored settings merged over defaults field by field
    pub async fn get_settings(&self) -> Settings {
        match self.backend.get(SETTINGS_KEY).await {
            Ok(Some(value)) => Settings::from_stored(&value),
            Ok(None) => Settings::default(),
            Err(e) => {
                warn!("Settings read failed, using defaults: {}", e);
                Settings::default()
            }
        }
    }

    /// Merge `patch` over the current settings, clamp, persist
    pub async fn set_settings(&self, patch: &SettingsPatch) -> Settings {
        let merged = self.get_settings().await.apply(patch);
        self.persist_settings(&merged).await;
        merged
    }

    pub async fn reset_settings(&self) -> Settings {
        let defaults = Settings::default();
        self.persist_settings(&defaults).await;
        defaults
    }

    async fn persist_settings(&self, settings: &Settings) {
        match serde_json::to_value(settings) {
            Ok(value) => {
                if let Err(e) = self.backend.set(SETTINGS_KEY, value).await {
                    warn!("Settings write failed: {}", e);
                }
            }
            Err(e) => warn!("Failed to serialize settings: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(id: &str) -> VideoRecord {
        VideoRecord {
            id: id.into(),
            title: format!("Video {id}"),
            owner_name: "Owner".into(),
            owner_id: None,
            duration_label: None,
            thumbnail_low_res: "l".into(),
            thumbnail_mid_res: "m".into(),
            thumbnail_high_res: "h".into(),
        }
    }

    fn store_at(start: i64) -> (Store, Arc<ManualClock>, Arc<MemoryBackend>) {
        let clock = Arc::new(ManualClock::new(start));
        let backend = Arc::new(MemoryBackend::new());
        (Store::new(backend.clone(), clock.clone()), clock, backend)
    }

    #[test]
    fn freshness_is_monotonic_in_ttl() {
        let entry = CacheEntry {
            records: vec![],
            captured_at: 1_000,
            origin: CacheOrigin::Scraped,
        };
        let now = 1_000 + 25 * 60_000;
        let mut was_fresh = false;
        for ttl_minutes in 1..=1440 {
            let fresh = is_fresh(&entry, ttl_minutes * 60_000, now);
            assert!(!(was_fresh && !fresh), "turned stale at ttl {ttl_minutes}");
            was_fresh = fresh;
        }
        assert!(was_fresh);
    }

    #[test]
    fn freshness_boundary_is_inclusive() {
        let entry = CacheEntry {
            records: vec![],
            captured_at: 0,
            origin: CacheOrigin::Scraped,
        };
        assert!(is_fresh(&entry, 60_000, 60_000));
        assert!(!is_fresh(&entry, 60_000, 60_001));
    }

    #[tokio::test]
    async fn absent_until_written_and_after_clear() {
        let (store, _, _) = store_at(10);
        assert_eq!(store.read_cache().await, None);
        assert!(!store.has_data().await);

        store.write_cache(vec![record("a")]).await;
        assert!(store.has_data().await);

        store.clear_cache().await;
        assert_eq!(store.read_cache().await, None);
    }

    #[tokio::test]
    async fn write_overwrites_without_merge() {
        let (store, _, _) = store_at(10);
        store.write_cache(vec![record("a"), record("b")]).await;
        store.write_cache(vec![record("c")]).await;
        let entry = store.read_cache().await.unwrap();
        assert_eq!(entry.records, vec![record("c")]);
    }

    #[tokio::test]
    async fn write_stamps_now_after_clock_correction() {
        let day = 24 * 60 * 60 * 1000;
        let (store, clock, _) = store_at(day);
        store
            .set_settings(&SettingsPatch {
                ttl_minutes: Some(20),
                ..Default::default()
            })
            .await;
        assert_eq!(store.write_cache(vec![record("a")]).await, day);

        clock.set(0);
        let entry = store.read_cache().await.unwrap();
        assert!(!store.is_fresh(&entry).await);

        assert_eq!(store.write_cache(vec![record("b")]).await, 0);
        clock.advance_minutes(25);
        let entry = store.read_cache().await.unwrap();
        assert_eq!(entry.captured_at, 0);
        assert!(!store.is_fresh(&entry).await);
    }

    #[test]
    fn future_stamp_is_stale() {
        let entry = CacheEntry {
            records: vec![],
            captured_at: 10_000,
            origin: CacheOrigin::Scraped,
        };
        assert!(!is_fresh(&entry, 60_000, 9_999));
        assert!(is_fresh(&entry, 60_000, 10_000));
    }

    #[tokio::test]
    async fn extreme_stamp_reads_as_stale_without_panicking() {
        let (store, _, backend) = store_at(1_000);
        backend
            .set(CACHE_KEY, json!({ "records": [], "capturedAt": i64::MIN }))
            .await
            .unwrap();
        assert!(matches!(
            store.cached_records(5).await,
            CachedRecords::Missing {
                reason: MissingReason::Stale,
                ..
            }
        ));

        backend
            .set(CACHE_KEY, json!({ "records": [], "capturedAt": i64::MAX }))
            .await
            .unwrap();
        assert!(matches!(
            store.cached_records(5).await,
            CachedRecords::Missing {
                reason: MissingReason::Stale,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn ttl_change_applies_to_existing_entries() {
        let (store, clock, _) = store_at(0);
        store.write_cache(vec![record("a")]).await;
        clock.advance_minutes(25);

        store
            .set_settings(&SettingsPatch {
                ttl_minutes: Some(20),
                ..Default::default()
            })
            .await;
        let entry = store.read_cache().await.unwrap();
        assert!(!store.is_fresh(&entry).await);

        store
            .set_settings(&SettingsPatch {
                ttl_minutes: Some(30),
                ..Default::default()
            })
            .await;
        assert!(store.is_fresh(&entry).await);
    }

    #[tokio::test]
    async fn stale_reply_keeps_last_known_records() {
        let (store, clock, _) = store_at(0);
        store.write_cache(vec![record("a")]).await;
        clock.advance_minutes(25);

        match store.cached_records(5).await {
            CachedRecords::Missing {
                reason: MissingReason::Stale,
                last_known: Some(entry),
            } => assert_eq!(entry.records, vec![record("a")]),
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[tokio::test]
    async fn settings_merge_over_legacy_blob() {
        let (store, _, backend) = store_at(0);
        backend
            .set(SETTINGS_KEY, json!({ "displayCount": 8, "oldField": 1 }))
            .await
            .unwrap();

        let settings = store.get_settings().await;
        assert_eq!(settings.display_count, 8);
        assert_eq!(settings.ttl_minutes, Settings::default().ttl_minutes);

        let updated = store
            .set_settings(&SettingsPatch {
                enabled: Some(false),
                ..Default::default()
            })
            .await;
        assert_eq!(updated.display_count, 8);
        assert!(!updated.enabled);
        assert_eq!(store.get_settings().await, updated);

        assert_eq!(store.reset_settings().await, Settings::default());
        assert_eq!(store.get_settings().await, Settings::default());
    }

    #[tokio::test]
    async fn opened_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("nested").join("data");

        let store = Store::open(&root).unwrap();
        store.write_cache(vec![record("a")]).await;

        let reopened = Store::open(&root).unwrap();
        let entry = reopened.read_cache().await.unwrap();
        assert_eq!(entry.records, vec![record("a")]);
    }

    #[test]
    fn open_fails_when_data_dir_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("occupied");
        std::fs::write(&file, b"x").unwrap();
        assert!(matches!(
            Store::open(&file),
            Err(StoreError::StorageAccess(_))
        ));
    }

    #[tokio::test]
    async fn malformed_cache_blob_reads_as_absent() {
        let (store, _, backend) = store_at(0);
        backend.set(CACHE_KEY, json!({ "records": 3 })).await.unwrap();
        assert_eq!(store.read_cache().await, None);
        assert!(matches!(
            store.cached_records(5).await,
            CachedRecords::Missing {
                reason: MissingReason::NoData,
                ..
            }
        ));
    }
}
