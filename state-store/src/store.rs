use adsieve_core::{
    AdRecord, Collection, ContactRecord, CoreError, CuratorConfig, CuratorState, ErrorExt,
    ErrorRecovery, HiddenBy, Keyword, MigrationConfig, RecoveryResult, RecoveryStrategy, Settings,
    StorageConfig, StorageError,
};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::backend::KeyValueStore;
use crate::merge::deep_merge;

/// Fixed key per persisted collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    pub hidden: String,
    pub contacted: String,
    pub keywords: String,
    pub settings: String,
}

impl StorageKeys {
    pub fn key(&self, collection: Collection) -> &str {
        match collection {
            Collection::HiddenAds => &self.hidden,
            Collection::ContactedAds => &self.contacted,
            Collection::Keywords => &self.keywords,
            Collection::Settings => &self.settings,
        }
    }
}

impl From<&StorageConfig> for StorageKeys {
    fn from(config: &StorageConfig) -> Self {
        Self {
            hidden: config.hidden_key.clone(),
            contacted: config.contacted_key.clone(),
            keywords: config.keywords_key.clone(),
            settings: config.settings_key.clone(),
        }
    }
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self::from(&StorageConfig::default())
    }
}

/// What happened while loading the stored collections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Collections replaced by their empty value after a parse failure.
    pub reset: Vec<Collection>,
    /// Bare ids upgraded to full hidden records.
    pub migrated: usize,
    /// Elements that could not be read as records and were dropped.
    pub dropped: usize,
    /// Repeated ids or keywords removed on load.
    pub duplicates: usize,
}

impl LoadReport {
    pub fn was_reset(&self, collection: Collection) -> bool {
        self.reset.contains(&collection)
    }
}

/// Owned handle on the persisted curation state.
///
/// Every mutating call writes the affected collection back to the backend
/// before returning. The in-memory state keeps the change even when that
/// write fails; the error is returned for the caller to report.
pub struct StateStore<S: KeyValueStore> {
    backend: S,
    keys: StorageKeys,
    migration: MigrationConfig,
    default_settings: Settings,
    state: CuratorState,
    report: LoadReport,
}

impl<S: KeyValueStore> StateStore<S> {
    pub fn open(backend: S, config: &CuratorConfig) -> Self {
        let mut store = Self {
            backend,
            keys: StorageKeys::from(&config.storage),
            migration: config.migration.clone(),
            default_settings: config.defaults,
            state: CuratorState::default(),
            report: LoadReport::default(),
        };
        store.load();
        store
    }

    pub fn with_defaults(backend: S) -> Self {
        Self::open(backend, &CuratorConfig::default())
    }

    /// Re-read all four collections. A collection that fails to parse is
    /// reset on its own; the others load normally.
    pub fn load(&mut self) -> &CuratorState {
        self.report = LoadReport::default();
        let now = Utc::now();

        let hidden = self
            .load_collection(Collection::HiddenAds, |raw, migration| {
                parse_hidden(raw, migration, now)
            })
            .map(|parsed| {
                self.report.migrated += parsed.migrated;
                self.report.dropped += parsed.dropped;
                self.report.duplicates += parsed.duplicates;
                parsed.records
            })
            .unwrap_or_default();

        let contacted = self
            .load_collection(Collection::ContactedAds, |raw, _| parse_contacts(raw))
            .map(|(records, duplicates)| {
                self.report.duplicates += duplicates;
                records
            })
            .unwrap_or_default();

        let keywords = self
            .load_collection(Collection::Keywords, |raw, _| parse_keywords(raw))
            .map(|(keywords, duplicates)| {
                self.report.duplicates += duplicates;
                keywords
            })
            .unwrap_or_default();

        let defaults = self.default_settings;
        let settings = self
            .load_collection(Collection::Settings, |raw, _| parse_settings(raw, defaults))
            .unwrap_or(defaults);

        self.state = CuratorState {
            hidden,
            contacted,
            keywords,
            settings,
        };

        info!(
            hidden = self.state.hidden.len(),
            contacted = self.state.contacted.len(),
            keywords = self.state.keywords.len(),
            reset = self.report.reset.len(),
            "loaded curation state"
        );
        &self.state
    }

    /// `None` when the key is absent or the payload had to be discarded.
    fn load_collection<T>(
        &mut self,
        collection: Collection,
        parse: impl FnOnce(&str, &MigrationConfig) -> Result<T, StorageError>,
    ) -> Option<T> {
        let key = self.keys.key(collection).to_string();
        let outcome = self
            .backend
            .get(&key)
            .and_then(|raw| raw.map(|raw| parse(&raw, &self.migration)).transpose());

        let outcome = outcome.map_err(CoreError::from);
        if let Err(error) = &outcome {
            if let RecoveryStrategy::ResetCollection(reset) =
                ErrorRecovery::determine_strategy(error)
            {
                self.report.reset.push(reset);
            }
        }

        match ErrorRecovery::recover(outcome) {
            RecoveryResult::Recovered(value) | RecoveryResult::Degraded(value) => value,
            RecoveryResult::Skipped => None,
            RecoveryResult::Failed(error) => {
                error.log_error();
                None
            }
        }
    }

    /// Write one collection back to the backend.
    pub fn save(&mut self, collection: Collection) -> Result<(), StorageError> {
        let key = self.keys.key(collection).to_string();
        let payload = match collection {
            Collection::HiddenAds => serde_json::to_string(&self.state.hidden),
            Collection::ContactedAds => serde_json::to_string(&self.state.contacted),
            Collection::Keywords => serde_json::to_string(&self.state.keywords),
            Collection::Settings => serde_json::to_string(&self.state.settings),
        }
        .map_err(|e| StorageError::Write {
            key: key.clone(),
            reason: e.to_string(),
        })?;

        self.backend.set(&key, &payload)?;
        debug!(%collection, "saved collection");
        Ok(())
    }

    pub fn state(&self) -> &CuratorState {
        &self.state
    }

    pub fn load_report(&self) -> &LoadReport {
        &self.report
    }

    pub fn backend(&self) -> &S {
        &self.backend
    }

    pub fn keys(&self) -> &StorageKeys {
        &self.keys
    }

    pub fn is_hidden(&self, id: &str) -> bool {
        self.state.is_hidden(id)
    }

    pub fn hidden_record(&self, id: &str) -> Option<&AdRecord> {
        self.state.hidden_record(id)
    }

    pub fn is_contacted(&self, id: &str) -> bool {
        self.state.is_contacted(id)
    }

    pub fn keywords(&self) -> &[Keyword] {
        &self.state.keywords
    }

    pub fn settings(&self) -> Settings {
        self.state.settings
    }

    /// Returns `Ok(false)` without writing when the id is already hidden.
    pub fn insert_hidden(&mut self, record: AdRecord) -> Result<bool, StorageError> {
        if self.state.is_hidden(&record.id) {
            return Ok(false);
        }
        self.state.hidden.push(record);
        self.save(Collection::HiddenAds)?;
        Ok(true)
    }

    /// Removes every record with this id.
    pub fn remove_hidden(&mut self, id: &str) -> Result<bool, StorageError> {
        let before = self.state.hidden.len();
        self.state.hidden.retain(|record| record.id != id);
        if self.state.hidden.len() == before {
            return Ok(false);
        }
        self.save(Collection::HiddenAds)?;
        Ok(true)
    }

    /// Returns whether membership changed.
    pub fn set_contacted(
        &mut self,
        id: &str,
        contacted: bool,
        at: DateTime<Utc>,
    ) -> Result<bool, StorageError> {
        let present = self.state.is_contacted(id);
        if present == contacted {
            return Ok(false);
        }
        if contacted {
            self.state.contacted.push(ContactRecord {
                id: id.to_string(),
                contacted_at: at,
            });
        } else {
            self.state.contacted.retain(|record| record.id != id);
        }
        self.save(Collection::ContactedAds)?;
        Ok(true)
    }

    pub fn add_keyword(&mut self, keyword: Keyword) -> Result<bool, StorageError> {
        if self.state.keywords.contains(&keyword) {
            return Ok(false);
        }
        self.state.keywords.push(keyword);
        self.save(Collection::Keywords)?;
        Ok(true)
    }

    pub fn remove_keyword(&mut self, raw: &str) -> Result<bool, StorageError> {
        let Some(keyword) = Keyword::parse(raw) else {
            return Ok(false);
        };
        let before = self.state.keywords.len();
        self.state.keywords.retain(|existing| existing != &keyword);
        if self.state.keywords.len() == before {
            return Ok(false);
        }
        self.save(Collection::Keywords)?;
        Ok(true)
    }

    pub fn update_settings(
        &mut self,
        update: impl FnOnce(&mut Settings),
    ) -> Result<Settings, StorageError> {
        update(&mut self.state.settings);
        self.save(Collection::Settings)?;
        Ok(self.state.settings)
    }
}

#[derive(Debug, Default)]
pub struct ParsedHidden {
    pub records: Vec<AdRecord>,
    pub migrated: usize,
    pub dropped: usize,
    pub duplicates: usize,
}

/// Parse the hidden-ads payload, upgrading bare string or number ids from
/// older schema versions to records filled with placeholder values.
pub fn parse_hidden(
    raw: &str,
    migration: &MigrationConfig,
    now: DateTime<Utc>,
) -> Result<ParsedHidden, StorageError> {
    let parse_error = |reason: String| StorageError::Parse {
        collection: Collection::HiddenAds,
        reason,
    };

    let value: Value = serde_json::from_str(raw).map_err(|e| parse_error(e.to_string()))?;
    let Value::Array(items) = value else {
        return Err(parse_error("expected an array".to_string()));
    };

    let mut parsed = ParsedHidden::default();
    let mut seen = HashSet::new();

    for item in items {
        let record = match item {
            Value::String(id) => {
                parsed.migrated += 1;
                migrate_bare_id(id.trim(), migration, now)
            }
            Value::Number(id) => {
                parsed.migrated += 1;
                migrate_bare_id(&id.to_string(), migration, now)
            }
            Value::Object(_) => match serde_json::from_value::<AdRecord>(item) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!("dropping unreadable hidden record: {}", e);
                    None
                }
            },
            other => {
                warn!("dropping hidden entry of unexpected shape: {}", other);
                None
            }
        };

        let Some(mut record) = record.filter(|record| !record.id.is_empty()) else {
            parsed.dropped += 1;
            continue;
        };

        if record.hidden_by == HiddenBy::Manual {
            record.matched_keyword = None;
        }

        if !seen.insert(record.id.clone()) {
            parsed.duplicates += 1;
            continue;
        }
        parsed.records.push(record);
    }

    Ok(parsed)
}

fn migrate_bare_id(id: &str, migration: &MigrationConfig, now: DateTime<Utc>) -> Option<AdRecord> {
    if id.is_empty() {
        return None;
    }
    Some(AdRecord {
        id: id.to_string(),
        title: migration.unknown_title.clone(),
        price: String::new(),
        location: String::new(),
        url: migration.unknown_url.clone(),
        category: migration.unknown_category.clone(),
        category_path: String::new(),
        hidden_at: now,
        hidden_by: HiddenBy::Manual,
        matched_keyword: None,
    })
}

/// Returns the records and the number of repeated ids removed.
pub fn parse_contacts(raw: &str) -> Result<(Vec<ContactRecord>, usize), StorageError> {
    let records: Vec<ContactRecord> =
        serde_json::from_str(raw).map_err(|e| StorageError::Parse {
            collection: Collection::ContactedAds,
            reason: e.to_string(),
        })?;

    let mut seen = HashSet::new();
    let total = records.len();
    let unique: Vec<ContactRecord> = records
        .into_iter()
        .filter(|record| seen.insert(record.id.clone()))
        .collect();
    let duplicates = total - unique.len();
    Ok((unique, duplicates))
}

/// Returns the normalized keywords and the number of repeats removed.
pub fn parse_keywords(raw: &str) -> Result<(Vec<Keyword>, usize), StorageError> {
    let values: Vec<String> = serde_json::from_str(raw).map_err(|e| StorageError::Parse {
        collection: Collection::Keywords,
        reason: e.to_string(),
    })?;

    let mut keywords: Vec<Keyword> = Vec::with_capacity(values.len());
    let mut duplicates = 0;
    for keyword in values.iter().filter_map(|value| Keyword::parse(value)) {
        if keywords.contains(&keyword) {
            duplicates += 1;
        } else {
            keywords.push(keyword);
        }
    }
    Ok((keywords, duplicates))
}

/// Stored settings merged over `defaults`; unknown keys are ignored.
pub fn parse_settings(raw: &str, defaults: Settings) -> Result<Settings, StorageError> {
    let parse_error = |reason: String| StorageError::Parse {
        collection: Collection::Settings,
        reason,
    };

    let stored: Value = serde_json::from_str(raw).map_err(|e| parse_error(e.to_string()))?;
    let base = serde_json::to_value(defaults).map_err(|e| parse_error(e.to_string()))?;
    serde_json::from_value(deep_merge(base, stored)).map_err(|e| parse_error(e.to_string()))
}
