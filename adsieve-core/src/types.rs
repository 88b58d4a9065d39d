use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::listing;

pub const UNKNOWN_CATEGORY: &str = "unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HiddenBy {
    #[default]
    Manual,
    Keyword,
}

/// Snapshot of a hidden listing, taken at hide time and never refreshed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdRecord {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub category_path: String,
    #[serde(with = "chrono::serde::ts_milliseconds", default = "Utc::now")]
    pub hidden_at: DateTime<Utc>,
    #[serde(default)]
    pub hidden_by: HiddenBy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_keyword: Option<String>,
}

impl AdRecord {
    pub fn manual(ad: &ExtractedAd, hidden_at: DateTime<Utc>) -> Self {
        Self::from_extracted(ad, hidden_at, HiddenBy::Manual, None)
    }

    pub fn by_keyword(ad: &ExtractedAd, keyword: &Keyword, hidden_at: DateTime<Utc>) -> Self {
        Self::from_extracted(
            ad,
            hidden_at,
            HiddenBy::Keyword,
            Some(keyword.as_str().to_string()),
        )
    }

    fn from_extracted(
        ad: &ExtractedAd,
        hidden_at: DateTime<Utc>,
        hidden_by: HiddenBy,
        matched_keyword: Option<String>,
    ) -> Self {
        Self {
            id: ad.id.clone(),
            title: ad.title.clone(),
            price: ad.price.clone(),
            location: ad.location.clone(),
            url: ad.url.clone(),
            category: ad.category.clone(),
            category_path: ad.category_path.clone(),
            hidden_at,
            hidden_by,
            matched_keyword,
        }
    }

    /// Category used for grouping; blank categories collapse into `"unknown"`.
    pub fn category_or_unknown(&self) -> &str {
        let category = self.category.trim();
        if category.is_empty() {
            UNKNOWN_CATEGORY
        } else {
            category
        }
    }

    /// The keyword that hid this record, only for keyword hides.
    pub fn keyword_label(&self) -> Option<&str> {
        match self.hidden_by {
            HiddenBy::Keyword => self.matched_keyword.as_deref(),
            HiddenBy::Manual => None,
        }
    }

    pub fn meta_line(&self) -> String {
        listing::meta_line(&self.price, &self.location)
    }

    /// Link for the hidden list. Older records may carry search context in the
    /// stored url, so only the detail-page portion is kept.
    pub fn display_url(&self, origin: &str) -> String {
        listing::canonical_ad_url(&self.url, origin)
    }
}

/// Structured fields pulled from one rendered entry by an extraction adapter.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractedAd {
    pub id: String,
    pub title: String,
    pub price: String,
    pub location: String,
    pub url: String,
    pub category: String,
    pub category_path: String,
    /// Free text shown with the entry. Only used for keyword matching.
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactRecord {
    pub id: String,
    #[serde(with = "chrono::serde::ts_milliseconds", default = "Utc::now")]
    pub contacted_at: DateTime<Utc>,
}

/// Trimmed, lower-cased, non-empty keyword.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Keyword(String);

impl Keyword {
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_lowercase();
        if normalized.is_empty() {
            None
        } else {
            Some(Self(normalized))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default, alias = "dark_mode")]
    pub dark_mode: bool,
}

/// The four independently persisted collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    HiddenAds,
    ContactedAds,
    Keywords,
    Settings,
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Collection::HiddenAds => "hidden ads",
            Collection::ContactedAds => "contacted ads",
            Collection::Keywords => "keywords",
            Collection::Settings => "settings",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CuratorState {
    pub hidden: Vec<AdRecord>,
    pub contacted: Vec<ContactRecord>,
    pub keywords: Vec<Keyword>,
    pub settings: Settings,
}

impl CuratorState {
    pub fn is_hidden(&self, id: &str) -> bool {
        self.hidden.iter().any(|record| record.id == id)
    }

    pub fn hidden_record(&self, id: &str) -> Option<&AdRecord> {
        self.hidden.iter().find(|record| record.id == id)
    }

    pub fn is_contacted(&self, id: &str) -> bool {
        self.contacted.iter().any(|record| record.id == id)
    }
}
