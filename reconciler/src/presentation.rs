//! Boundary with the host page: where entries come from and how decisions
//! are shown. The engine never touches markup itself.

use adsieve_core::{ExtractedAd, ExtractionError};
use serde::{Deserialize, Serialize};

/// Enumerates rendered entries and reads structured fields out of them.
pub trait ExtractionAdapter {
    type Entry;

    /// Entries currently rendered, in page order. May include placeholders.
    fn candidates(&self) -> Vec<Self::Entry>;

    fn extract(&self, entry: &Self::Entry) -> Result<ExtractedAd, ExtractionError>;
}

/// Applies directives to the host page and answers questions about what it
/// already shows.
pub trait PresentationSink {
    type Entry;

    /// True for placeholders this engine inserted earlier.
    fn is_placeholder(&self, entry: &Self::Entry) -> bool;

    /// Placeholders currently tagged with `id`.
    fn placeholder_count(&self, id: &str) -> usize;

    /// Hide/contact triggers already present on the entry.
    fn has_affordances(&self, entry: &Self::Entry) -> bool;

    fn apply(&mut self, entry: &Self::Entry, directive: &Directive);

    /// Remove every placeholder tagged with `id`; returns how many were removed.
    fn remove_placeholders(&mut self, id: &str) -> usize;

    fn contacted_changed(&mut self, _id: &str, _contacted: bool) {}
}

/// Actions the host can hand back to the engine, usually from a click.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UserAction {
    Hide {
        ad: ExtractedAd,
    },
    Restore {
        id: String,
    },
    ToggleContacted {
        id: String,
    },
    AddKeyword {
        keyword: String,
    },
    RemoveKeyword {
        keyword: String,
    },
    ToggleDarkMode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Placeholder {
    pub id: String,
    /// Entry title, followed by ` (<keyword>)` for keyword hides.
    pub title: String,
    pub meta: String,
    pub url: String,
    pub restore: UserAction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Affordances {
    pub hide: UserAction,
    pub toggle_contacted: UserAction,
    pub contacted: bool,
}

/// What to do with one rendered entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Directive {
    /// Leave the entry untouched this pass.
    Skip,
    /// Hide the entry. `placeholder` is set when `id` has no placeholder yet,
    /// or has several; with `replace_existing` the sink first removes every
    /// placeholder tagged `id`, so exactly one remains next to the entry.
    Suppress {
        id: String,
        placeholder: Option<Placeholder>,
        replace_existing: bool,
    },
    /// Make the entry visible. `affordances` is set only when the entry does
    /// not carry them yet.
    Show {
        id: String,
        remove_stale_placeholders: bool,
        affordances: Option<Affordances>,
    },
}

pub fn decorated_title(title: &str, keyword: Option<&str>) -> String {
    match keyword {
        Some(keyword) => format!("{} ({})", title, keyword),
        None => title.to_string(),
    }
}

pub fn affordances_for(ad: &ExtractedAd, contacted: bool) -> Affordances {
    Affordances {
        hide: UserAction::Hide { ad: ad.clone() },
        toggle_contacted: UserAction::ToggleContacted { id: ad.id.clone() },
        contacted,
    }
}

pub fn placeholder_for(ad: &ExtractedAd, keyword: Option<&str>) -> Placeholder {
    Placeholder {
        id: ad.id.clone(),
        title: decorated_title(&ad.title, keyword),
        meta: adsieve_core::listing::meta_line(&ad.price, &ad.location),
        url: ad.url.clone(),
        restore: UserAction::Restore { id: ad.id.clone() },
    }
}
