//! Saved-playlist shelf for the feed page
//!
//! Scrapes the saved-video playlist from the source page's embedded state,
//! caches it with a TTL in a background store, and injects it as a shelf into
//! the feed page, driving real pages through chromiumoxide.

mod browser;
pub mod browser_setup;
pub mod extractor;
mod manager;
pub mod messaging;
pub mod model;
pub mod page_extractor;
pub mod presenter;
pub mod store;
pub mod utils;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::presenter::ShelfOrder;
use crate::utils::constants::*;
use crate::utils::{validate_navigation_timeout, validate_poll_interval};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub browser: BrowserConfig,

    #[serde(default)]
    pub site: SiteConfig,

    #[serde(default)]
    pub extractor: ExtractorConfig,

    #[serde(default)]
    pub presenter: PresenterConfig,

    #[serde(default)]
    pub store: StoreConfig,
}

/// Browser security and launch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Run browser in headless mode
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Disable web security features (Same-Origin Policy, etc.)
    /// WARNING: Only enable for trusted content
    #[serde(default = "default_disable_security")]
    pub disable_security: bool,

    /// Window dimensions
    #[serde(default)]
    pub window: WindowConfig,

    #[serde(default = "default_navigation_timeout_ms")]
    pub navigation_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "default_window_width")]
    pub width: u32,

    #[serde(default = "default_window_height")]
    pub height: u32,
}

/// Where the source and destination pages live
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_origin")]
    pub origin: String,

    #[serde(default = "default_source_path")]
    pub source_path: String,

    /// `list=` query value of the saved playlist
    #[serde(default = "default_source_list_id")]
    pub source_list_id: String,

    #[serde(default = "default_destination_path")]
    pub destination_path: String,

    #[serde(default = "default_container_selector")]
    pub container_selector: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    #[serde(default = "default_source_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_source_poll_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    #[serde(default = "default_fallback_poll_ms")]
    pub fallback_poll_ms: u64,

    #[serde(default = "default_navigation_poll_ms")]
    pub navigation_poll_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenterConfig {
    #[serde(default = "default_container_max_attempts")]
    pub container_max_attempts: u32,

    #[serde(default = "default_container_poll_ms")]
    pub container_poll_ms: u64,

    #[serde(default)]
    pub order: ShelfOrder,

    #[serde(default = "default_event_poll_ms")]
    pub event_poll_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Defaults to `<data_dir>/playlist-shelf`
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

fn default_headless() -> bool {
    false
}

fn default_disable_security() -> bool {
    false // SECURE BY DEFAULT
}

fn default_window_width() -> u32 {
    1280
}

fn default_window_height() -> u32 {
    720
}

fn default_navigation_timeout_ms() -> u64 {
    30_000
}

fn default_origin() -> String {
    DEFAULT_ORIGIN.to_string()
}

fn default_source_path() -> String {
    DEFAULT_SOURCE_PATH.to_string()
}

fn default_source_list_id() -> String {
    DEFAULT_SOURCE_LIST_ID.to_string()
}

fn default_destination_path() -> String {
    DEFAULT_DESTINATION_PATH.to_string()
}

fn default_container_selector() -> String {
    DEFAULT_CONTAINER_SELECTOR.to_string()
}

fn default_source_max_attempts() -> u32 {
    DEFAULT_SOURCE_MAX_ATTEMPTS
}

fn default_source_poll_ms() -> u64 {
    DEFAULT_SOURCE_POLL_MS
}

fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_MS
}

fn default_fallback_poll_ms() -> u64 {
    DEFAULT_FALLBACK_POLL_MS
}

fn default_navigation_poll_ms() -> u64 {
    DEFAULT_NAVIGATION_POLL_MS
}

fn default_container_max_attempts() -> u32 {
    DEFAULT_CONTAINER_MAX_ATTEMPTS
}

fn default_container_poll_ms() -> u64 {
    DEFAULT_CONTAINER_POLL_MS
}

fn default_event_poll_ms() -> u64 {
    DEFAULT_EVENT_POLL_MS
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: default_headless(),
            disable_security: default_disable_security(),
            window: WindowConfig::default(),
            navigation_timeout_ms: default_navigation_timeout_ms(),
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: default_window_width(),
            height: default_window_height(),
        }
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            source_path: default_source_path(),
            source_list_id: default_source_list_id(),
            destination_path: default_destination_path(),
            container_selector: default_container_selector(),
        }
    }
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_source_max_attempts(),
            poll_interval_ms: default_source_poll_ms(),
            debounce_ms: default_debounce_ms(),
            fallback_poll_ms: default_fallback_poll_ms(),
            navigation_poll_ms: default_navigation_poll_ms(),
        }
    }
}

impl Default for PresenterConfig {
    fn default() -> Self {
        Self {
            container_max_attempts: default_container_max_attempts(),
            container_poll_ms: default_container_poll_ms(),
            order: ShelfOrder::default(),
            event_poll_ms: default_event_poll_ms(),
        }
    }
}

impl BrowserConfig {
    pub fn navigation_timeout(&self) -> Duration {
        validate_navigation_timeout(Some(self.navigation_timeout_ms), default_navigation_timeout_ms())
    }
}

impl ExtractorConfig {
    pub fn poll_interval(&self) -> Duration {
        validate_poll_interval(self.poll_interval_ms, "extractor.poll_interval_ms")
    }

    pub fn debounce(&self) -> Duration {
        validate_poll_interval(self.debounce_ms, "extractor.debounce_ms")
    }

    pub fn fallback_poll(&self) -> Duration {
        validate_poll_interval(self.fallback_poll_ms, "extractor.fallback_poll_ms")
    }

    pub fn navigation_poll(&self) -> Duration {
        validate_poll_interval(self.navigation_poll_ms, "extractor.navigation_poll_ms")
    }
}

impl PresenterConfig {
    pub fn container_poll(&self) -> Duration {
        validate_poll_interval(self.container_poll_ms, "presenter.container_poll_ms")
    }

    pub fn event_poll(&self) -> Duration {
        validate_poll_interval(self.event_poll_ms, "presenter.event_poll_ms")
    }
}

impl SiteConfig {
    /// URL of the saved-playlist page
    pub fn source_url(&self) -> String {
        format!(
            "{}{}?list={}",
            self.origin.trim_end_matches('/'),
            self.source_path,
            self.source_list_id
        )
    }

    /// URL of the feed page
    pub fn destination_url(&self) -> String {
        format!("{}{}", self.origin.trim_end_matches('/'), self.destination_path)
    }

    fn same_origin(&self, url: &Url) -> bool {
        Url::parse(&self.origin)
            .map(|origin| origin.host_str() == url.host_str() && origin.scheme() == url.scheme())
            .unwrap_or(false)
    }

    /// Whether `url` is the saved-playlist page
    pub fn is_source_url(&self, url: &str) -> bool {
        let Ok(url) = Url::parse(url) else {
            return false;
        };
        self.same_origin(&url)
            && url.path().trim_end_matches('/') == self.source_path.trim_end_matches('/')
            && url
                .query_pairs()
                .any(|(k, v)| k == "list" && v == self.source_list_id.as_str())
    }

    /// Whether `url` is the feed page
    pub fn is_destination_url(&self, url: &str) -> bool {
        let Ok(url) = Url::parse(url) else {
            return false;
        };
        self.same_origin(&url) && url.path() == self.destination_path
    }
}

/// Load config from `$PLAYLIST_SHELF_CONFIG` or `<config_dir>/playlist-shelf/config.yaml`
pub fn load_yaml_config() -> anyhow::Result<Config> {
    let config_path = std::env::var_os("PLAYLIST_SHELF_CONFIG")
        .map(PathBuf::from)
        .or_else(|| dirs::config_dir().map(|d| d.join("playlist-shelf").join("config.yaml")));

    match config_path {
        Some(path) if path.exists() => {
            let contents = fs::read_to_string(&path)?;
            let config: Config = serde_yaml::from_str(&contents)?;
            Ok(config)
        }
        _ => Ok(Config::default()),
    }
}

pub use browser::{
    BrowserError, BrowserResult, BrowserWrapper, ChromeFeedSurface, ChromeSourcePage,
    download_managed_browser, find_browser_executable, launch_browser,
};
pub use extractor::{ExtractionOutcome, Extractor, SourcePage, SourceSession};
pub use manager::BrowserManager;
pub use presenter::{FeedSession, FeedSurface, Presenter, PresenterState};
pub use store::{FileBackend, MemoryBackend, Store, StoreHandle, StoreService, SystemClock};
