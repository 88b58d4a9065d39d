//! Classification and reconciliation of a live classified-ad listing.
//!
//! On every content change the [`Curator`] looks at each rendered entry and
//! decides whether to show it, replace it with a placeholder, or auto-hide
//! it because it matches a stored keyword. Repeated passes over an unchanged
//! page produce no new placeholders, affordances or records.

pub mod contacts;
pub mod engine;
pub mod matching;
pub mod planner;
pub mod presentation;
pub mod service;
pub mod whitelist;

pub use contacts::ContactTracker;
pub use engine::{Curator, PassReport, StateSummary};
pub use matching::{group_by_category, matches, CategoryGroup};
pub use planner::{plan_pass, Observation, Planned, StateView};
pub use presentation::{
    Affordances, Directive, ExtractionAdapter, Placeholder, PresentationSink, UserAction,
};
pub use service::{CurationService, HostEvent, ServiceStats};
pub use whitelist::SessionWhitelist;
