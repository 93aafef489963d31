use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, trace, warn};

use super::{Presenter, SurfaceEvent};
use crate::messaging::{ContextEvent, ContextKind};

/// Event loop for one feed-page context
///
/// Serves store broadcasts and page events in arrival order, one at a time.
pub struct FeedSession {
    presenter: Presenter,
    surface_events: mpsc::UnboundedReceiver<SurfaceEvent>,
}

impl FeedSession {
    pub fn new(presenter: Presenter, surface_events: mpsc::UnboundedReceiver<SurfaceEvent>) -> Self {
        Self {
            presenter,
            surface_events,
        }
    }

    pub async fn run(mut self, cancel: CancellationToken) {
        let store = self.presenter.store().clone();
        // Attach before reading settings so no broadcast falls in between
        let (context_id, mut events) = store.attach(ContextKind::Destination);

        self.presenter.load_settings().await;
        match self.presenter.surface.current_url().await {
            Ok(url) => self.presenter.on_page_ready(&url).await,
            Err(e) => warn!("Feed page URL unavailable at startup: {}", e),
        }

        info!("Feed session started");
        let mut surface_open = true;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,

                event = events.recv() => match event {
                    Some(ContextEvent::SettingsChanged(settings)) => {
                        self.presenter.on_settings_changed(settings).await;
                    }
                    Some(ContextEvent::DataChanged(count)) => {
                        self.presenter.on_data_changed(count).await;
                    }
                    Some(other) => trace!("Feed session ignoring {:?}", other),
                    None => break,
                },

                event = self.surface_events.recv(), if surface_open => match event {
                    Some(event) => self.presenter.handle(event).await,
                    None => {
                        warn!("Feed page event stream closed");
                        surface_open = false;
                    }
                },
            }
        }

        self.presenter.teardown().await;
        store.detach(&context_id);
        info!("Feed session stopped");
    }
}
