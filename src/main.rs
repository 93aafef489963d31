// Playlist shelf runner
//
// Opens the saved playlist and the feed page in one browser, keeps the cache
// current from the first and paints the shelf into the second until Ctrl-C.

use anyhow::{Context, Result};
use playlist_shelf::{
    BrowserManager, ChromeFeedSurface, ChromeSourcePage, FeedSession, FileBackend, Presenter,
    SourceSession, Store, StoreService, load_yaml_config,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("playlist_shelf=info")),
        )
        .init();

    let config = load_yaml_config().context("Failed to load configuration")?;

    let data_dir = config
        .store
        .data_dir
        .clone()
        .unwrap_or_else(FileBackend::default_root);
    info!("Storing cache and settings under {}", data_dir.display());
    let store = Store::open(data_dir).context("Failed to open the data directory")?;
    let (store_handle, store_task) = StoreService::spawn(store);

    let manager = BrowserManager::new(config.browser.clone());
    let source_page = manager
        .open_page(&config.site.source_url())
        .await
        .context("Failed to open the source playlist")?;
    let feed_page = manager
        .open_page(&config.site.destination_url())
        .await
        .context("Failed to open the feed page")?;

    let cancel = CancellationToken::new();

    let source = SourceSession::new(
        Arc::new(ChromeSourcePage::new(source_page)),
        store_handle.clone(),
        config.site.clone(),
        config.extractor.clone(),
    );

    let surface = Arc::new(ChromeFeedSurface::new(feed_page, &config.site));
    let (surface_events, pump_task) = surface
        .clone()
        .spawn_event_pump(config.presenter.event_poll(), cancel.child_token());
    let presenter = Presenter::new(
        surface,
        store_handle.clone(),
        config.site.clone(),
        config.presenter.clone(),
    );
    let feed = FeedSession::new(presenter, surface_events);

    let source_task = tokio::spawn(source.run(cancel.child_token()));
    let feed_task = tokio::spawn(feed.run(cancel.child_token()));

    info!("Running; press Ctrl-C to stop");
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
    }

    info!("Shutting down");
    cancel.cancel();
    for (name, task) in [("source", source_task), ("feed", feed_task), ("event pump", pump_task)] {
        if let Err(e) = task.await {
            warn!("{} task ended abnormally: {}", name, e);
        }
    }

    // Last handle gone, so the store loop drains and exits
    drop(store_handle);
    if let Err(e) = store_task.await {
        warn!("Store task ended abnormally: {}", e);
    }

    manager.shutdown().await
}
