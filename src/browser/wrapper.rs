//! Browser lifecycle: launch, page creation and navigation

use anyhow::{Context, Result};
use chromiumoxide::browser::Browser;
use chromiumoxide::page::Page;
use std::path::PathBuf;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::{BrowserError, BrowserResult};
use crate::BrowserConfig;

/// Browser plus its CDP handler task
///
/// The handler is aborted on drop; the profile directory is only removed by
/// [`BrowserWrapper::cleanup_temp_dir`], after the browser process has exited.
pub struct BrowserWrapper {
    browser: Browser,
    handler: JoinHandle<()>,
    user_data_dir: Option<PathBuf>,
}

impl BrowserWrapper {
    pub(crate) fn new(browser: Browser, handler: JoinHandle<()>, user_data_dir: PathBuf) -> Self {
        Self {
            browser,
            handler,
            user_data_dir: Some(user_data_dir),
        }
    }

    pub(crate) fn browser(&self) -> &Browser {
        &self.browser
    }

    pub(crate) fn browser_mut(&mut self) -> &mut Browser {
        &mut self.browser
    }

    /// Remove the profile directory
    ///
    /// Call only after `browser.wait()` so Chrome has released its file handles.
    pub fn cleanup_temp_dir(&mut self) {
        if let Some(path) = self.user_data_dir.take() {
            info!("Cleaning up temp directory: {}", path.display());
            if let Err(e) = std::fs::remove_dir_all(&path) {
                warn!(
                    "Failed to clean up temp directory {}: {}. Manual cleanup may be required.",
                    path.display(),
                    e
                );
            }
        }
    }
}

impl Drop for BrowserWrapper {
    fn drop(&mut self) {
        info!("Dropping BrowserWrapper - aborting handler task");
        self.handler.abort();

        if let Some(path) = self.user_data_dir.as_ref() {
            warn!(
                "BrowserWrapper dropped without explicit cleanup. \
                Temp directory will be orphaned: {}. \
                Call BrowserManager::shutdown() before dropping to ensure proper cleanup.",
                path.display()
            );
        }
    }
}

/// Launch a browser with a per-process profile directory
///
/// Returns the profile path, which must be cleaned up after the browser exits.
pub async fn launch_browser(config: &BrowserConfig) -> Result<(Browser, JoinHandle<()>, PathBuf)> {
    info!("Launching browser (headless: {})", config.headless);

    let user_data_dir =
        std::env::temp_dir().join(format!("playlist_shelf_profile_{}", std::process::id()));

    let (browser, handler) = crate::browser_setup::launch_browser(
        config.headless,
        Some(user_data_dir.clone()),
        config.disable_security,
        (config.window.width, config.window.height),
    )
    .await?;

    Ok((browser, handler, user_data_dir))
}

pub async fn create_blank_page(wrapper: &BrowserWrapper) -> Result<Page> {
    let page = wrapper
        .browser()
        .new_page("about:blank")
        .await
        .context("Failed to create blank page")?;

    info!("Created blank page");
    Ok(page)
}

/// Navigate `page` to `url` and wait for the load to complete
pub async fn navigate(page: &Page, url: &str, timeout: Duration) -> BrowserResult<()> {
    tokio::time::timeout(timeout, page.goto(url))
        .await
        .map_err(|_| {
            BrowserError::NavigationFailed(format!(
                "timeout after {}ms for URL: {}",
                timeout.as_millis(),
                url
            ))
        })?
        .map_err(|e| BrowserError::NavigationFailed(format!("{url}: {e}")))?;

    page.wait_for_navigation()
        .await
        .map_err(|e| BrowserError::NavigationFailed(format!("waiting for {url} to load: {e}")))?;

    Ok(())
}
