//! Browser infrastructure for launching Chrome and driving the two page contexts

mod feed_scripts;
mod feed_surface;
mod source_page;
mod wrapper;

pub use crate::browser_setup::{download_managed_browser, find_browser_executable};
pub use feed_surface::ChromeFeedSurface;
pub use source_page::ChromeSourcePage;
pub use wrapper::{BrowserWrapper, create_blank_page, launch_browser, navigate};

use chromiumoxide::page::Page;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BrowserError {
    #[error("Failed to launch browser: {0}")]
    LaunchFailed(String),

    #[error("Failed to create page: {0}")]
    PageCreationFailed(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("Script evaluation failed: {0}")]
    Evaluation(String),
}

pub type BrowserResult<T> = Result<T, BrowserError>;

/// Evaluate `script` in `page` and deserialize its result
///
/// CDP omits the value for `null`, so a missing value deserializes as `null`.
pub(crate) async fn evaluate<T: DeserializeOwned>(page: &Page, script: &str) -> BrowserResult<T> {
    let result = page
        .evaluate(script)
        .await
        .map_err(|e| BrowserError::Evaluation(e.to_string()))?;
    let value = result.value().cloned().unwrap_or(Value::Null);
    serde_json::from_value(value)
        .map_err(|e| BrowserError::Evaluation(format!("unexpected script result: {e}")))
}

/// The page's current URL, empty while it has none
pub(crate) async fn page_url(page: &Page) -> BrowserResult<String> {
    page.url()
        .await
        .map(Option::unwrap_or_default)
        .map_err(|e| BrowserError::NavigationFailed(e.to_string()))
}
