//! Shared configuration constants
//!
//! Default values used by `Config` and the page adapters, kept here to avoid
//! magic numbers across modules.

/// Desktop Chrome user agent sent by the launched browser
pub const CHROME_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.6834.160 Safari/537.36";

/// Host site origin
pub const DEFAULT_ORIGIN: &str = "https://www.youtube.com";

/// Path of the saved-playlist page
pub const DEFAULT_SOURCE_PATH: &str = "/playlist";

/// `list=` query value identifying the saved playlist
pub const DEFAULT_SOURCE_LIST_ID: &str = "WL";

/// Path of the feed page the shelf is injected into
pub const DEFAULT_DESTINATION_PATH: &str = "/";

/// Feed container the shelf is inserted before
pub const DEFAULT_CONTAINER_SELECTOR: &str = "ytd-rich-grid-renderer #contents";

/// Canonical per-video thumbnail URL; `{id}` and `{name}` are substituted
pub const THUMBNAIL_URL_TEMPLATE: &str = "https://i.ytimg.com/vi/{id}/{name}.jpg";

/// Watch page URL prefix for shelf links
pub const WATCH_URL_PREFIX: &str = "https://www.youtube.com/watch?v=";

/// DOM id of the injected shelf element
pub const SHELF_ELEMENT_ID: &str = "playlist-shelf";

/// Extractor: attempts while waiting for the embedded state
pub const DEFAULT_SOURCE_MAX_ATTEMPTS: u32 = 20;
/// Extractor: delay between state probes
pub const DEFAULT_SOURCE_POLL_MS: u64 = 250;
/// Extractor: quiet period after a list mutation before re-checking
pub const DEFAULT_DEBOUNCE_MS: u64 = 800;
/// Extractor: fallback re-check interval
pub const DEFAULT_FALLBACK_POLL_MS: u64 = 3_000;
/// Extractor/presenter: URL and mutation-counter poll interval
pub const DEFAULT_NAVIGATION_POLL_MS: u64 = 500;

/// Presenter: attempts while waiting for the feed container
pub const DEFAULT_CONTAINER_MAX_ATTEMPTS: u32 = 20;
/// Presenter: delay between container probes
pub const DEFAULT_CONTAINER_POLL_MS: u64 = 500;
/// Presenter: page event queue drain interval
pub const DEFAULT_EVENT_POLL_MS: u64 = 200;
