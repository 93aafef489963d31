//! Store actor and its client handle
//!
//! Requests are processed one at a time in arrival order on a single task,
//! which makes the store the only writer of both records.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::{ContextRegistry, Store, StoreError};
use crate::messaging::{
    CachedRecords, ContextEvent, ContextId, ContextKind, StoreRequest,
};
use crate::model::{Settings, SettingsPatch, VideoRecord};

const REQUEST_QUEUE: usize = 64;

/// Background task owning the [`Store`]
pub struct StoreService {
    store: Store,
    contexts: Arc<ContextRegistry>,
    requests: mpsc::Receiver<StoreRequest>,
}

impl StoreService {
    /// Spawn the service and return a handle plus the task handle
    pub fn spawn(store: Store) -> (StoreHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(REQUEST_QUEUE);
        let contexts = Arc::new(ContextRegistry::new());

        let service = StoreService {
            store,
            contexts: contexts.clone(),
            requests: rx,
        };
        let task = tokio::spawn(service.run());

        (StoreHandle { requests: tx, contexts }, task)
    }

    async fn run(mut self) {
        info!("Store service started");
        while let Some(request) = self.requests.recv().await {
            self.handle(request).await;
        }
        info!("Store service stopped (all handles dropped)");
    }

    async fn handle(&self, request: StoreRequest) {
        match request {
            StoreRequest::RequestSettings { reply } => {
                let _ = reply.send(self.store.get_settings().await);
            }
            StoreRequest::SaveSettings { patch, reply } => {
                let settings = self.store.set_settings(&patch).await;
                self.broadcast_settings(&settings);
                let _ = reply.send(settings);
            }
            StoreRequest::ResetSettings { reply } => {
                let settings = self.store.reset_settings().await;
                self.broadcast_settings(&settings);
                let _ = reply.send(settings);
            }
            StoreRequest::RequestCachedRecords {
                display_count,
                reply,
            } => {
                let _ = reply.send(self.store.cached_records(display_count).await);
            }
            StoreRequest::WriteCache { records, reply } => {
                let _ = reply.send(self.store.write_cache(records).await);
            }
            StoreRequest::NotifyDataUpdated { count } => {
                let delivered = self
                    .contexts
                    .broadcast(ContextKind::Destination, &ContextEvent::DataChanged(count));
                debug!("DataChanged({}) delivered to {} feed page(s)", count, delivered);
            }
            StoreRequest::RequestManualRescrape => {
                let delivered = self
                    .contexts
                    .broadcast(ContextKind::Source, &ContextEvent::ManualRescrape);
                debug!("Manual rescrape delivered to {} source page(s)", delivered);
            }
            StoreRequest::ClearCache { reply } => {
                self.store.clear_cache().await;
                let _ = reply.send(());
            }
            StoreRequest::HasData { reply } => {
                let _ = reply.send(self.store.has_data().await);
            }
        }
    }

    fn broadcast_settings(&self, settings: &Settings) {
        let delivered = self.contexts.broadcast(
            ContextKind::Destination,
            &ContextEvent::SettingsChanged(settings.clone()),
        );
        debug!("SettingsChanged delivered to {} feed page(s)", delivered);
    }
}

/// Cloneable client for the store service
#[derive(Clone)]
pub struct StoreHandle {
    requests: mpsc::Sender<StoreRequest>,
    contexts: Arc<ContextRegistry>,
}

impl StoreHandle {
    pub fn attach(&self, kind: ContextKind) -> (ContextId, mpsc::UnboundedReceiver<ContextEvent>) {
        self.contexts.attach(kind)
    }

    pub fn detach(&self, id: &ContextId) {
        self.contexts.detach(id);
    }

    pub fn attached(&self, kind: ContextKind) -> usize {
        self.contexts.count(kind)
    }

    async fn call<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> StoreRequest,
    ) -> Result<T, StoreError> {
        let (tx, rx) = oneshot::channel();
        self.requests
            .send(build(tx))
            .await
            .map_err(|_| StoreError::ChannelClosed("Store request channel closed".into()))?;
        rx.await
            .map_err(|_| StoreError::ChannelClosed("Store dropped the reply".into()))
    }

    async fn send(&self, request: StoreRequest) -> Result<(), StoreError> {
        self.requests
            .send(request)
            .await
            .map_err(|_| StoreError::ChannelClosed("Store request channel closed".into()))
    }

    pub async fn request_settings(&self) -> Result<Settings, StoreError> {
        self.call(|reply| StoreRequest::RequestSettings { reply }).await
    }

    pub async fn save_settings(&self, patch: SettingsPatch) -> Result<Settings, StoreError> {
        self.call(|reply| StoreRequest::SaveSettings { patch, reply })
            .await
    }

    pub async fn reset_settings(&self) -> Result<Settings, StoreError> {
        self.call(|reply| StoreRequest::ResetSettings { reply }).await
    }

    pub async fn request_cached_records(
        &self,
        display_count: u32,
    ) -> Result<CachedRecords, StoreError> {
        self.call(|reply| StoreRequest::RequestCachedRecords {
            display_count,
            reply,
        })
        .await
    }

    pub async fn write_cache(&self, records: Vec<VideoRecord>) -> Result<i64, StoreError> {
        self.call(|reply| StoreRequest::WriteCache { records, reply })
            .await
    }

    pub async fn notify_data_updated(&self, count: usize) -> Result<(), StoreError> {
        self.send(StoreRequest::NotifyDataUpdated { count }).await
    }

    pub async fn request_manual_rescrape(&self) -> Result<(), StoreError> {
        self.send(StoreRequest::RequestManualRescrape).await
    }

    pub async fn clear_cache(&self) -> Result<(), StoreError> {
        self.call(|reply| StoreRequest::ClearCache { reply }).await
    }

    pub async fn has_data(&self) -> Result<bool, StoreError> {
        self.call(|reply| StoreRequest::HasData { reply }).await
    }
}
