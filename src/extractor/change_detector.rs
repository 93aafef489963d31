//! Debounced change detection for the source playlist
//!
//! Mutation signals arrive on a channel, decoupled from any DOM API. A burst of
//! signals collapses into one check after the debounce period; a fixed-interval
//! poll runs alongside in case a mutation is missed. Both stop when the
//! cancellation token fires.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use super::{ExtractionOutcome, Extractor};

#[derive(Debug, Clone, Copy)]
pub struct DetectorTiming {
    pub debounce: Duration,
    pub fallback_poll: Duration,
}

impl From<&crate::ExtractorConfig> for DetectorTiming {
    fn from(config: &crate::ExtractorConfig) -> Self {
        Self {
            debounce: config.debounce(),
            fallback_poll: config.fallback_poll(),
        }
    }
}

pub struct ChangeDetector {
    extractor: Arc<Mutex<Extractor>>,
    mutations: mpsc::UnboundedReceiver<()>,
    timing: DetectorTiming,
    cancel: CancellationToken,
}

impl ChangeDetector {
    pub fn new(
        extractor: Arc<Mutex<Extractor>>,
        mutations: mpsc::UnboundedReceiver<()>,
        timing: DetectorTiming,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            extractor,
            mutations,
            timing,
            cancel,
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    pub async fn run(mut self) {
        let mut fallback = tokio::time::interval_at(
            Instant::now() + self.timing.fallback_poll,
            self.timing.fallback_poll,
        );
        fallback.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut deadline: Option<Instant> = None;
        let mut signals_open = true;

        debug!(
            "Change detector started (debounce {:?}, fallback {:?})",
            self.timing.debounce, self.timing.fallback_poll
        );

        loop {
            let wake_at = deadline;
            let debounce_elapsed = async move {
                match wake_at {
                    Some(at) => tokio::time::sleep_until(at).await,
                    None => std::future::pending().await,
                }
            };

            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => break,

                signal = self.mutations.recv(), if signals_open => match signal {
                    Some(()) => {
                        trace!("List mutation, debouncing");
                        deadline = Some(Instant::now() + self.timing.debounce);
                    }
                    None => {
                        debug!("Mutation feed closed, relying on fallback poll");
                        signals_open = false;
                    }
                },

                _ = debounce_elapsed => {
                    deadline = None;
                    self.check("debounce").await;
                }

                _ = fallback.tick() => {
                    self.check("fallback poll").await;
                }
            }
        }

        debug!("Change detector stopped");
    }

    async fn check(&self, trigger: &str) {
        let outcome = self.extractor.lock().await.check_for_changes().await;
        match outcome {
            ExtractionOutcome::Unchanged => trace!("Change check ({}) found nothing new", trigger),
            other => debug!("Change check ({}): {:?}", trigger, other),
        }
    }
}
