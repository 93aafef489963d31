//! Locating, downloading and launching Chrome/Chromium

use anyhow::{Context, Result};
use chromiumoxide::browser::{Browser, BrowserConfigBuilder, HeadlessMode};
use chromiumoxide::fetcher::{BrowserFetcher, BrowserFetcherOptions};
use futures::StreamExt;
use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;
use tokio::task::{self, JoinHandle};
use tracing::{error, info, trace, warn};

use crate::utils::constants::CHROME_USER_AGENT;

/// Removes the profile directory on drop unless consumed by `into_path()`
struct TempDirGuard {
    path: PathBuf,
    keep: bool,
}

impl TempDirGuard {
    fn new(path: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&path).context("Failed to create user data directory")?;
        Ok(Self { path, keep: false })
    }

    /// Hand the directory over to the caller
    fn into_path(mut self) -> PathBuf {
        self.keep = true;
        self.path.clone()
    }
}

impl Drop for TempDirGuard {
    fn drop(&mut self) {
        if self.keep {
            return;
        }
        match std::fs::remove_dir_all(&self.path) {
            Ok(()) => info!("Cleaned up temp dir after launch failure: {}", self.path.display()),
            Err(e) => warn!("Failed to clean up temp dir {}: {}", self.path.display(), e),
        }
    }
}

fn candidate_paths() -> &'static [&'static str] {
    if cfg!(target_os = "windows") {
        &[
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
            r"%LOCALAPPDATA%\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files\Chromium\Application\chrome.exe",
        ]
    } else if cfg!(target_os = "macos") {
        &[
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
            "~/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "~/Applications/Chromium.app/Contents/MacOS/Chromium",
            "/opt/homebrew/bin/chromium",
        ]
    } else {
        &[
            "/usr/bin/google-chrome",
            "/usr/bin/google-chrome-stable",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/snap/bin/chromium",
            "/usr/local/bin/chromium",
            "/opt/google/chrome/chrome",
        ]
    }
}

/// Expand `~/` and `%VAR%` in a candidate path
fn resolve_candidate(raw: &str) -> Option<PathBuf> {
    if let Some(rest) = raw.strip_prefix("~/") {
        return dirs::home_dir().map(|home| home.join(rest));
    }
    if raw.contains('%') {
        return Some(PathBuf::from(expand_env_vars(raw)));
    }
    Some(PathBuf::from(raw))
}

/// Replace `%VAR%` tokens with their values; unknown variables stay as written
fn expand_env_vars(path: &str) -> String {
    let mut result = String::with_capacity(path.len());
    let mut chars = path.chars();

    while let Some(ch) = chars.next() {
        if ch != '%' {
            result.push(ch);
            continue;
        }
        let name: String = chars.by_ref().take_while(|&c| c != '%').collect();
        match std::env::var(&name) {
            Ok(value) if !name.is_empty() => result.push_str(&value),
            _ if name.is_empty() => result.push('%'),
            _ => {
                result.push('%');
                result.push_str(&name);
                result.push('%');
            }
        }
    }

    result
}

/// Find Chrome/Chromium: `CHROMIUM_PATH`, then well-known paths, then `which`
pub async fn find_browser_executable() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("CHROMIUM_PATH") {
        let path = PathBuf::from(path);
        if path.exists() {
            info!("Using browser from CHROMIUM_PATH: {}", path.display());
            return Ok(path);
        }
        warn!("CHROMIUM_PATH points to a missing file: {}", path.display());
    }

    if let Some(path) = candidate_paths()
        .iter()
        .filter_map(|raw| resolve_candidate(raw))
        .find(|path| path.exists())
    {
        info!("Found browser at: {}", path.display());
        return Ok(path);
    }

    if !cfg!(target_os = "windows") {
        for cmd in ["chromium", "chromium-browser", "google-chrome", "chrome"] {
            if let Ok(output) = Command::new("which").arg(cmd).output()
                && output.status.success()
            {
                let found = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !found.is_empty() {
                    info!("Found browser using 'which': {}", found);
                    return Ok(PathBuf::from(found));
                }
            }
        }
    }

    warn!("No Chrome/Chromium executable found, will download one");
    Err(anyhow::anyhow!("Chrome/Chromium executable not found"))
}

/// Download Chromium into the user cache directory and return the executable
pub async fn download_managed_browser() -> Result<PathBuf> {
    info!("Downloading managed Chromium browser...");

    let cache_dir = dirs::cache_dir()
        .unwrap_or_else(|| {
            let fallback = std::env::temp_dir().join(".cache");
            warn!(
                "Could not determine system cache directory, using {}",
                fallback.display()
            );
            fallback
        })
        .join("playlist-shelf")
        .join("chromium");
    std::fs::create_dir_all(&cache_dir).context("Failed to create cache directory")?;

    let fetcher = BrowserFetcher::new(
        BrowserFetcherOptions::builder()
            .with_path(&cache_dir)
            .build()
            .context("Failed to build fetcher options")?,
    );
    let revision_info = fetcher.fetch().await.context("Failed to fetch browser")?;

    info!("Downloaded Chromium to: {}", revision_info.folder_path.display());
    Ok(revision_info.executable_path)
}

/// Command-line flags for the launched browser
fn chrome_args(disable_security: bool, disable_sandbox: bool) -> Vec<String> {
    let mut args: Vec<String> = [
        "--disable-blink-features=AutomationControlled",
        "--disable-infobars",
        "--disable-notifications",
        "--disable-print-preview",
        "--no-first-run",
        "--no-default-browser-check",
        "--disable-extensions",
        "--disable-popup-blocking",
        "--disable-background-timer-throttling",
        "--disable-backgrounding-occluded-windows",
        "--disable-renderer-backgrounding",
        "--disable-breakpad",
        "--disable-features=TranslateUI",
        "--disable-hang-monitor",
        "--disable-prompt-on-repost",
        "--password-store=basic",
        "--use-mock-keychain",
        "--mute-audio",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    args.insert(0, format!("--user-agent={}", CHROME_USER_AGENT));

    if disable_security {
        args.extend(
            [
                "--disable-web-security",
                "--disable-features=IsolateOrigins,site-per-process",
                "--ignore-certificate-errors",
            ]
            .map(String::from),
        );
    }
    if disable_sandbox || disable_security {
        args.extend(["--no-sandbox", "--disable-setuid-sandbox"].map(String::from));
    }
    args
}

/// CDP messages chromiumoxide does not model; harmless
///
/// See mattsse/chromiumoxide#167 and #229.
fn is_benign_handler_error(message: &str) -> bool {
    message.contains("data did not match any variant of untagged enum Message")
        || message.contains("Failed to deserialize WS response")
}

/// Find or download Chrome/Chromium and launch it
///
/// # Arguments
/// * `headless` - Run without a window
/// * `chrome_data_dir` - Profile directory; defaults to a per-process temp dir
/// * `disable_security` - Disable web security (only for trusted content)
/// * `window` - Window width and height in pixels
pub async fn launch_browser(
    headless: bool,
    chrome_data_dir: Option<PathBuf>,
    disable_security: bool,
    window: (u32, u32),
) -> Result<(Browser, JoinHandle<()>)> {
    let chrome_path = match find_browser_executable().await {
        Ok(path) => path,
        Err(_) => download_managed_browser().await?,
    };

    let user_data_dir = chrome_data_dir.unwrap_or_else(|| {
        std::env::temp_dir().join(format!("playlist_shelf_chrome_{}", std::process::id()))
    });
    let temp_guard = TempDirGuard::new(user_data_dir)?;

    let mut config_builder = BrowserConfigBuilder::default()
        .request_timeout(Duration::from_secs(30))
        .window_size(window.0, window.1)
        .user_data_dir(temp_guard.path.clone())
        .chrome_executable(chrome_path);

    config_builder = if headless {
        config_builder.headless_mode(HeadlessMode::default())
    } else {
        config_builder.with_head()
    };

    if disable_security {
        warn!("Disabling browser security features (disable_security=true)");
    }
    let disable_sandbox = should_disable_sandbox();
    if disable_sandbox {
        info!("Detected containerized environment, disabling sandbox");
    }
    config_builder = config_builder.args(chrome_args(disable_security, disable_sandbox));

    let browser_config = config_builder
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build browser config: {e}"))?;

    info!("Launching browser with config: {:?}", browser_config);
    let (browser, mut handler) = Browser::launch(browser_config)
        .await
        .context("Failed to launch browser")?;

    let handler_task = task::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                let message = e.to_string();
                if is_benign_handler_error(&message) {
                    trace!("Suppressed benign CDP serialization error: {}", message);
                } else {
                    error!("Browser handler error: {:?}", e);
                }
            }
        }
        info!("Browser handler task completed");
    });

    temp_guard.into_path();
    Ok((browser, handler_task))
}

/// Containers cannot use the setuid sandbox
fn should_disable_sandbox() -> bool {
    std::path::Path::new("/.dockerenv").exists()
        || std::env::var("container").is_ok()
        || std::env::var("KUBERNETES_SERVICE_HOST").is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_env_vars_are_kept_verbatim() {
        assert_eq!(
            expand_env_vars(r"%PLAYLIST_SHELF_SURELY_UNSET%\chrome.exe"),
            r"%PLAYLIST_SHELF_SURELY_UNSET%\chrome.exe"
        );
        assert_eq!(expand_env_vars("100%% sure"), "100% sure");
        assert_eq!(expand_env_vars("/usr/bin/chromium"), "/usr/bin/chromium");
    }

    #[test]
    fn security_flags_only_when_requested() {
        let args = chrome_args(false, false);
        assert!(args[0].starts_with("--user-agent="));
        assert!(!args.iter().any(|a| a == "--disable-web-security"));
        assert!(!args.iter().any(|a| a == "--no-sandbox"));

        let args = chrome_args(true, false);
        assert!(args.iter().any(|a| a == "--disable-web-security"));
        assert!(args.iter().any(|a| a == "--no-sandbox"));

        let args = chrome_args(false, true);
        assert!(args.iter().any(|a| a == "--no-sandbox"));
        assert!(!args.iter().any(|a| a == "--disable-web-security"));
    }

    #[test]
    fn benign_handler_errors_are_recognised() {
        assert!(is_benign_handler_error(
            "data did not match any variant of untagged enum Message"
        ));
        assert!(!is_benign_handler_error("connection reset"));
    }
}
