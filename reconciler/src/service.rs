//! Event loop that drives the engine from content-change notifications and
//! user actions.

use state_store::KeyValueStore;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::engine::Curator;
use crate::presentation::{ExtractionAdapter, PresentationSink, UserAction};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// The set of rendered entries may have changed.
    ContentChanged,
    User(UserAction),
    Shutdown,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServiceStats {
    pub passes: u64,
    pub actions: u64,
}

/// Owns the engine and both sides of the host boundary. Events are handled
/// one at a time on the calling task; every change notification gets its own
/// pass.
pub struct CurationService<S, A, P>
where
    S: KeyValueStore,
    A: ExtractionAdapter,
    P: PresentationSink<Entry = A::Entry>,
{
    curator: Curator<S>,
    adapter: A,
    sink: P,
    stats: ServiceStats,
}

impl<S, A, P> CurationService<S, A, P>
where
    S: KeyValueStore,
    A: ExtractionAdapter,
    P: PresentationSink<Entry = A::Entry>,
{
    pub fn new(curator: Curator<S>, adapter: A, sink: P) -> Self {
        Self {
            curator,
            adapter,
            sink,
            stats: ServiceStats::default(),
        }
    }

    pub fn curator(&self) -> &Curator<S> {
        &self.curator
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn sink(&self) -> &P {
        &self.sink
    }

    pub fn stats(&self) -> ServiceStats {
        self.stats
    }

    pub fn into_parts(self) -> (Curator<S>, A, P) {
        (self.curator, self.adapter, self.sink)
    }

    pub fn handle_event(&mut self, event: HostEvent) -> bool {
        match event {
            HostEvent::ContentChanged => {
                self.curator.reconcile(&self.adapter, &mut self.sink);
                self.stats.passes += 1;
                true
            }
            HostEvent::User(action) => {
                debug!(?action, "user action");
                self.curator.handle(action, &self.adapter, &mut self.sink);
                self.stats.actions += 1;
                true
            }
            HostEvent::Shutdown => false,
        }
    }

    /// Run an initial pass, then serve events until `Shutdown` or until every
    /// sender is dropped.
    pub async fn run(&mut self, mut events: mpsc::UnboundedReceiver<HostEvent>) -> ServiceStats {
        info!("curation service started");
        self.handle_event(HostEvent::ContentChanged);

        while let Some(event) = events.recv().await {
            if !self.handle_event(event) {
                break;
            }
        }

        info!(
            passes = self.stats.passes,
            actions = self.stats.actions,
            "curation service stopped"
        );
        self.stats
    }
}
