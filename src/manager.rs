//! Owner of the single browser instance both page contexts run in
//!
//! Uses `Arc<Mutex<Option<BrowserWrapper>>>`: lazy launch on first use, a
//! health check on every access, and explicit cleanup on shutdown. The mutex
//! is `tokio::sync::Mutex` because it is held across `.await`.

use anyhow::Result;
use chromiumoxide::page::Page;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::BrowserConfig;
use crate::browser::{BrowserError, BrowserResult, BrowserWrapper, create_blank_page, launch_browser, navigate};

pub struct BrowserManager {
    config: BrowserConfig,
    browser: Arc<Mutex<Option<BrowserWrapper>>>,
}

impl BrowserManager {
    /// The browser is launched lazily on first use
    pub fn new(config: BrowserConfig) -> Self {
        Self {
            config,
            browser: Arc::new(Mutex::new(None)),
        }
    }

    /// Shared browser, launching or relaunching it as needed
    ///
    /// An existing browser is health-checked with a `version()` CDP call; a
    /// crashed one is closed, its profile removed and a fresh one launched.
    pub async fn get_or_launch(&self) -> Result<Arc<Mutex<Option<BrowserWrapper>>>> {
        let mut guard = self.browser.lock().await;

        if let Some(wrapper) = guard.as_ref() {
            match wrapper.browser().version().await {
                Ok(_) => {
                    debug!("Browser health check passed, reusing existing browser");
                    drop(guard);
                    return Ok(self.browser.clone());
                }
                Err(e) => {
                    warn!("Browser health check failed: {}. Triggering recovery...", e);

                    if let Some(mut crashed) = guard.take() {
                        // Best effort; the process may already be gone
                        let _ = crashed.browser_mut().close().await;
                        let _ = crashed.browser_mut().wait().await;
                        crashed.cleanup_temp_dir();
                    }

                    info!("Crashed browser cleaned up, launching new instance");
                }
            }
        }

        info!("Launching browser (first time or after recovery)");
        let (browser, handler, user_data_dir) = launch_browser(&self.config).await?;
        *guard = Some(BrowserWrapper::new(browser, handler, user_data_dir));
        drop(guard);

        Ok(self.browser.clone())
    }

    /// New tab navigated to `url`
    pub async fn open_page(&self, url: &str) -> BrowserResult<Page> {
        let browser_arc = self
            .get_or_launch()
            .await
            .map_err(|e| BrowserError::LaunchFailed(e.to_string()))?;
        let browser_guard = browser_arc.lock().await;
        let wrapper = browser_guard
            .as_ref()
            .ok_or_else(|| BrowserError::PageCreationFailed("Browser not available".into()))?;

        let page = create_blank_page(wrapper)
            .await
            .map_err(|e| BrowserError::PageCreationFailed(e.to_string()))?;
        drop(browser_guard);

        navigate(&page, url, self.config.navigation_timeout()).await?;
        info!("Opened {}", url);
        Ok(page)
    }

    /// Close the browser, wait for it to exit and remove its profile
    ///
    /// Dropping a [`BrowserWrapper`] only aborts the handler task; without
    /// `close()` plus `wait()` the Chrome process lingers. Calling this twice
    /// is a no-op the second time.
    pub async fn shutdown(&self) -> Result<()> {
        let mut guard = self.browser.lock().await;

        if let Some(mut wrapper) = guard.take() {
            info!("Shutting down browser");

            if let Err(e) = wrapper.browser_mut().close().await {
                warn!("Failed to close browser cleanly: {}", e);
            }
            if let Err(e) = wrapper.browser_mut().wait().await {
                warn!("Failed to wait for browser exit: {}", e);
            }
            wrapper.cleanup_temp_dir();
        }

        Ok(())
    }

    pub async fn is_browser_running(&self) -> bool {
        self.browser.lock().await.is_some()
    }
}

impl Drop for BrowserManager {
    fn drop(&mut self) {
        // Only the handler gets aborted here; the browser process and its profile stay behind
        if let Ok(guard) = self.browser.try_lock()
            && guard.is_some()
        {
            warn!("BrowserManager dropped without shutdown() while the browser is running");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn starts_without_a_browser() {
        let manager = BrowserManager::new(BrowserConfig::default());
        assert!(!manager.is_browser_running().await);
        // Nothing launched, so shutdown has nothing to close
        manager.shutdown().await.unwrap();
        assert!(!manager.is_browser_running().await);
    }
}
