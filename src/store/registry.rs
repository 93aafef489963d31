//! Registry of page contexts attached to the store

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::messaging::{ContextEvent, ContextId, ContextKind};

struct ContextLink {
    kind: ContextKind,
    events: mpsc::UnboundedSender<ContextEvent>,
}

/// Attached contexts keyed by id
///
/// Broadcasts go to every context of a kind. A context whose receiver has been
/// dropped is pruned on the next broadcast.
#[derive(Default)]
pub struct ContextRegistry {
    links: DashMap<ContextId, ContextLink>,
}

impl ContextRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a new context and return its id and event stream
    pub fn attach(&self, kind: ContextKind) -> (ContextId, mpsc::UnboundedReceiver<ContextEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        self.links.insert(id, ContextLink { kind, events: tx });
        debug!("Attached {:?} context {}", kind, id);
        (id, rx)
    }

    pub fn detach(&self, id: &ContextId) -> bool {
        let removed = self.links.remove(id).is_some();
        if removed {
            debug!("Detached context {}", id);
        }
        removed
    }

    /// Send `event` to every context of `kind`, returning how many received it
    pub fn broadcast(&self, kind: ContextKind, event: &ContextEvent) -> usize {
        let mut delivered = 0;
        let mut closed = Vec::new();

        for link in self.links.iter() {
            if link.kind != kind {
                continue;
            }
            if link.events.send(event.clone()).is_ok() {
                delivered += 1;
            } else {
                closed.push(*link.key());
            }
        }

        for id in closed {
            trace!("Pruning closed context {}", id);
            self.links.remove(&id);
        }

        delivered
    }

    pub fn count(&self, kind: ContextKind) -> usize {
        self.links.iter().filter(|l| l.kind == kind).count()
    }
}
