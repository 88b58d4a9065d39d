//! Curation engine for classified-ad listing pages.
//!
//! Hides unwanted ads by hand or by keyword, keeps a restorable record of
//! everything hidden, and tracks which sellers were already contacted. The
//! host page is reached only through [`ExtractionAdapter`] and
//! [`PresentationSink`].

use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;
use tracing_subscriber::EnvFilter;

pub use adsieve_core::{
    AdRecord, Collection, CoreError, CuratorConfig, CuratorState, ExtractedAd, HiddenBy, Keyword,
    Settings,
};
pub use reconciler::{
    CurationService, Curator, Directive, ExtractionAdapter, HostEvent, PassReport,
    PresentationSink, StateSummary, UserAction,
};
pub use state_store::{FileStore, KeyValueStore, MemoryStore, StateStore};

pub type DynCurator = Curator<Box<dyn KeyValueStore>>;

/// Install the global subscriber. `RUST_LOG` wins over `default_filter`.
pub fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Read the config file if one is given, then apply environment overrides.
pub fn load_config(path: Option<&Path>) -> Result<CuratorConfig> {
    let config = match path {
        Some(path) => CuratorConfig::from_path(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => CuratorConfig::default(),
    };
    let config = config.with_env_overrides();
    config.validate().context("Invalid curator config")?;
    Ok(config)
}

/// Open the engine on the backend the config asks for: files under
/// `storage.directory`, or memory when no directory is set.
pub fn open_curator(config: &CuratorConfig) -> Result<DynCurator> {
    let backend: Box<dyn KeyValueStore> = match &config.storage.directory {
        Some(directory) => {
            std::fs::create_dir_all(directory).with_context(|| {
                format!("Failed to create state directory {}", directory.display())
            })?;
            info!(directory = %directory.display(), "using file storage");
            Box::new(FileStore::new(directory))
        }
        None => {
            info!("using in-memory storage");
            Box::new(MemoryStore::new())
        }
    };

    let curator = Curator::open(backend, config);
    let report = curator.store().load_report();
    if !report.reset.is_empty() {
        info!(reset = ?report.reset, "some stored collections were unreadable and reset");
    }
    Ok(curator)
}
