use adsieve_core::{CoreError, ErrorReporter};
use chrono::Utc;
use state_store::{KeyValueStore, StateStore};
use tracing::info;

/// Contacted flag per ad id. Independent of hidden state.
pub struct ContactTracker<'a, S: KeyValueStore> {
    store: &'a mut StateStore<S>,
    reporter: &'a ErrorReporter,
}

impl<'a, S: KeyValueStore> ContactTracker<'a, S> {
    pub fn new(store: &'a mut StateStore<S>, reporter: &'a ErrorReporter) -> Self {
        Self { store, reporter }
    }

    /// Flip the flag for `id`, persist, and return the new value.
    pub fn toggle(&mut self, id: &str) -> bool {
        let contacted = !self.store.is_contacted(id);
        if let Err(e) = self.store.set_contacted(id, contacted, Utc::now()) {
            self.reporter.report_error(&CoreError::from(e));
        }
        info!(id, contacted, "toggled contacted");
        contacted
    }

    pub fn is_contacted(&self, id: &str) -> bool {
        self.store.is_contacted(id)
    }
}
