use adsieve_core::{
    AdRecord, CoreError, CuratorConfig, ErrorExt, ErrorRecovery, ErrorReporter, ExtractedAd,
    Keyword, RecoveryResult, StorageError,
};
use chrono::Utc;
use serde::Serialize;
use state_store::{KeyValueStore, StateStore};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::contacts::ContactTracker;
use crate::matching::{self, CategoryGroup};
use crate::planner::{plan_pass, Observation, StateView};
use crate::presentation::{
    affordances_for, Directive, ExtractionAdapter, PresentationSink, UserAction,
};
use crate::whitelist::SessionWhitelist;

/// Counts published after every state change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StateSummary {
    pub hidden: usize,
    pub contacted: usize,
    pub keywords: usize,
    pub dark_mode: bool,
    /// Bumped on every change, so two equal summaries with different
    /// revisions still mean the hidden listing must be redrawn.
    pub revision: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PassReport {
    pub examined: usize,
    pub skipped: usize,
    pub suppressed: usize,
    pub shown: usize,
    pub placeholders_created: usize,
    pub affordances_attached: usize,
    pub auto_hidden: Vec<String>,
}

/// The curation engine: owns the state store and the session whitelist and
/// turns page observations into directives.
pub struct Curator<S: KeyValueStore> {
    store: StateStore<S>,
    whitelist: SessionWhitelist,
    reporter: ErrorReporter,
    summary_tx: watch::Sender<StateSummary>,
    revision: u64,
}

impl<S: KeyValueStore> Curator<S> {
    pub fn new(store: StateStore<S>) -> Self {
        let (summary_tx, _) = watch::channel(StateSummary::default());
        let mut curator = Self {
            store,
            whitelist: SessionWhitelist::new(),
            reporter: ErrorReporter::new(),
            summary_tx,
            revision: 0,
        };
        curator.summary_tx.send_replace(curator.summary());
        curator
    }

    pub fn open(backend: S, config: &CuratorConfig) -> Self {
        Self::new(StateStore::open(backend, config))
    }

    pub fn store(&self) -> &StateStore<S> {
        &self.store
    }

    pub fn whitelist(&self) -> &SessionWhitelist {
        &self.whitelist
    }

    pub fn subscribe(&self) -> watch::Receiver<StateSummary> {
        self.summary_tx.subscribe()
    }

    pub fn summary(&self) -> StateSummary {
        let state = self.store.state();
        StateSummary {
            hidden: state.hidden.len(),
            contacted: state.contacted.len(),
            keywords: state.keywords.len(),
            dark_mode: state.settings.dark_mode,
            revision: self.revision,
        }
    }

    pub fn hidden_groups(&self) -> Vec<CategoryGroup<'_>> {
        matching::group_by_category(&self.store.state().hidden)
    }

    pub fn is_contacted(&self, id: &str) -> bool {
        self.store.is_contacted(id)
    }

    /// Storage failures absorbed since the engine was created.
    pub fn errors_reported(&self) -> usize {
        self.reporter.errors()
    }

    /// Rejected user input since the engine was created.
    pub fn warnings_reported(&self) -> usize {
        self.reporter.warnings()
    }

    /// Run one reconciliation pass over every rendered entry.
    pub fn reconcile<A, P>(&mut self, adapter: &A, sink: &mut P) -> PassReport
    where
        A: ExtractionAdapter,
        P: PresentationSink<Entry = A::Entry>,
    {
        let entries = adapter.candidates();
        let observations: Vec<Observation> = entries
            .iter()
            .map(|entry| observe(adapter, &*sink, entry))
            .collect();

        let plan = plan_pass(
            &observations,
            StateView {
                state: self.store.state(),
                whitelist: &self.whitelist,
            },
            Utc::now(),
        );

        let mut report = PassReport {
            examined: entries.len(),
            ..Default::default()
        };

        for planned in &plan {
            if let Some(record) = &planned.new_record {
                info!(
                    id = %record.id,
                    keyword = record.matched_keyword.as_deref().unwrap_or_default(),
                    "auto-hiding ad by keyword"
                );
                let outcome = self.store.insert_hidden(record.clone());
                if self.absorb(outcome) {
                    report.auto_hidden.push(record.id.clone());
                }
            }
        }

        for (entry, planned) in entries.iter().zip(&plan) {
            match &planned.directive {
                Directive::Skip => report.skipped += 1,
                Directive::Suppress { placeholder, .. } => {
                    report.suppressed += 1;
                    if placeholder.is_some() {
                        report.placeholders_created += 1;
                    }
                }
                Directive::Show { affordances, .. } => {
                    report.shown += 1;
                    if affordances.is_some() {
                        report.affordances_attached += 1;
                    }
                }
            }
            sink.apply(entry, &planned.directive);
        }

        if !report.auto_hidden.is_empty() {
            self.notify();
        }

        debug!(
            examined = report.examined,
            skipped = report.skipped,
            suppressed = report.suppressed,
            shown = report.shown,
            "reconciliation pass complete"
        );
        report
    }

    /// Hide an entry by hand. No-op when it is already hidden.
    pub fn hide<A, P>(&mut self, ad: &ExtractedAd, adapter: &A, sink: &mut P) -> bool
    where
        A: ExtractionAdapter,
        P: PresentationSink<Entry = A::Entry>,
    {
        if self.store.is_hidden(&ad.id) {
            debug!(id = %ad.id, "already hidden");
            return false;
        }

        info!(id = %ad.id, "hiding ad");
        let outcome = self.store.insert_hidden(AdRecord::manual(ad, Utc::now()));
        if !self.absorb(outcome) {
            return false;
        }
        self.notify();
        self.reconcile(adapter, sink);
        true
    }

    /// Un-hide `id`, exempt it from keyword auto-hide for the rest of the
    /// session and bring the original entry back. Every placeholder for the
    /// id is removed, however many there are.
    pub fn restore<A, P>(&mut self, id: &str, adapter: &A, sink: &mut P) -> bool
    where
        A: ExtractionAdapter,
        P: PresentationSink<Entry = A::Entry>,
    {
        let outcome = self.store.remove_hidden(id);
        let removed = self.absorb(outcome);
        self.whitelist.add(id);

        let cleared = sink.remove_placeholders(id);
        info!(id, removed, placeholders = cleared, "restoring ad");

        for entry in adapter.candidates() {
            if sink.is_placeholder(&entry) {
                continue;
            }
            let Ok(ad) = adapter.extract(&entry) else {
                continue;
            };
            if ad.id != id {
                continue;
            }
            let affordances = if sink.has_affordances(&entry) {
                None
            } else {
                Some(affordances_for(&ad, self.store.is_contacted(id)))
            };
            sink.apply(
                &entry,
                &Directive::Show {
                    id: ad.id.clone(),
                    remove_stale_placeholders: false,
                    affordances,
                },
            );
        }

        if removed {
            self.notify();
        }
        removed
    }

    /// Flip the contacted flag and return the new value.
    pub fn toggle_contacted<P: PresentationSink>(&mut self, id: &str, sink: &mut P) -> bool {
        let contacted = ContactTracker::new(&mut self.store, &self.reporter).toggle(id);
        sink.contacted_changed(id, contacted);
        self.notify();
        contacted
    }

    /// Add a keyword and re-run the pass so matching entries hide at once.
    /// Empty and already-known keywords are ignored.
    pub fn add_keyword<A, P>(&mut self, raw: &str, adapter: &A, sink: &mut P) -> bool
    where
        A: ExtractionAdapter,
        P: PresentationSink<Entry = A::Entry>,
    {
        let Some(keyword) = Keyword::parse(raw) else {
            self.reporter.report_warning(&CoreError::InvalidInput {
                message: "keyword is empty".to_string(),
            });
            return false;
        };
        info!(keyword = %keyword, "adding keyword");
        let outcome = self.store.add_keyword(keyword);
        if !self.absorb(outcome) {
            return false;
        }
        self.notify();
        self.reconcile(adapter, sink);
        true
    }

    /// Forget a keyword. Ads it already hid stay hidden.
    pub fn remove_keyword(&mut self, raw: &str) -> bool {
        let outcome = self.store.remove_keyword(raw);
        let removed = self.absorb(outcome);
        if removed {
            info!(keyword = raw.trim(), "removed keyword");
            self.notify();
        }
        removed
    }

    pub fn toggle_dark_mode(&mut self) -> bool {
        let outcome = self.store.update_settings(|settings| {
            settings.dark_mode = !settings.dark_mode;
        });
        if let Err(e) = outcome {
            self.reporter.report_error(&CoreError::from(e));
        }
        self.notify();
        self.store.settings().dark_mode
    }

    /// Dispatch an action coming back from the page.
    pub fn handle<A, P>(&mut self, action: UserAction, adapter: &A, sink: &mut P)
    where
        A: ExtractionAdapter,
        P: PresentationSink<Entry = A::Entry>,
    {
        match action {
            UserAction::Hide { ad } => {
                self.hide(&ad, adapter, sink);
            }
            UserAction::Restore { id } => {
                self.restore(&id, adapter, sink);
            }
            UserAction::ToggleContacted { id } => {
                self.toggle_contacted(&id, sink);
            }
            UserAction::AddKeyword { keyword } => {
                self.add_keyword(&keyword, adapter, sink);
            }
            UserAction::RemoveKeyword { keyword } => {
                self.remove_keyword(&keyword);
            }
            UserAction::ToggleDarkMode => {
                self.toggle_dark_mode();
            }
        }
    }

    /// Whether the state changed. A failed write still changed the in-memory
    /// state, so it counts as a change after being reported.
    fn absorb(&self, outcome: Result<bool, StorageError>) -> bool {
        match outcome {
            Ok(changed) => changed,
            Err(e) => {
                self.reporter.report_error(&CoreError::from(e));
                true
            }
        }
    }

    fn notify(&mut self) {
        self.revision += 1;
        let summary = self.summary();
        self.summary_tx.send_replace(summary);
    }
}

fn observe<A, P>(adapter: &A, sink: &P, entry: &A::Entry) -> Observation
where
    A: ExtractionAdapter,
    P: PresentationSink<Entry = A::Entry>,
{
    if sink.is_placeholder(entry) {
        return Observation::Placeholder;
    }

    let outcome = adapter.extract(entry).map(Some).map_err(CoreError::from);
    match ErrorRecovery::recover(outcome) {
        RecoveryResult::Recovered(Some(ad)) => Observation::Entry {
            placeholders: sink.placeholder_count(&ad.id),
            affordances_attached: sink.has_affordances(entry),
            ad,
        },
        RecoveryResult::Failed(error) => {
            error.log_error();
            Observation::Unreadable
        }
        RecoveryResult::Recovered(None) | RecoveryResult::Degraded(_) | RecoveryResult::Skipped => {
            Observation::Unreadable
        }
    }
}
