//! Durable storage for hidden ads, contacted ads, keywords and settings.
//!
//! Each collection lives under its own key and is parsed on its own, so a
//! corrupt payload only ever costs that one collection.

pub mod backend;
pub mod merge;
pub mod store;


pub use backend::{FileStore, KeyValueStore, MemoryStore};
pub use merge::deep_merge;
pub use store::{
    parse_contacts, parse_hidden, parse_keywords, parse_settings, LoadReport, ParsedHidden,
    StateStore, StorageKeys,
};
