//! Keyword membership and hidden-list grouping.
//!
//! Matching is plain substring search over the lower-cased title and
//! description. There is no tokenization, so `"bett"` also matches
//! `"bettwäsche"`.

use adsieve_core::{AdRecord, ExtractedAd, Keyword};
use std::cmp::Reverse;
use std::collections::BTreeMap;

pub fn search_corpus(ad: &ExtractedAd) -> String {
    format!("{} {}", ad.title, ad.description).to_lowercase()
}

/// First keyword, in stored order, contained in the entry's corpus.
pub fn matches<'k>(ad: &ExtractedAd, keywords: &'k [Keyword]) -> Option<&'k Keyword> {
    if keywords.is_empty() {
        return None;
    }
    let corpus = search_corpus(ad);
    keywords
        .iter()
        .find(|keyword| corpus.contains(keyword.as_str()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryGroup<'a> {
    pub category: &'a str,
    pub records: Vec<&'a AdRecord>,
}

/// Groups by category name in lexicographic order, newest hide first inside
/// each group. Records hidden at the same instant keep reverse insertion order.
pub fn group_by_category(records: &[AdRecord]) -> Vec<CategoryGroup<'_>> {
    let mut groups: BTreeMap<&str, Vec<(usize, &AdRecord)>> = BTreeMap::new();
    for (position, record) in records.iter().enumerate() {
        groups
            .entry(record.category_or_unknown())
            .or_default()
            .push((position, record));
    }

    groups
        .into_iter()
        .map(|(category, mut members)| {
            members.sort_by_key(|(position, record)| {
                (Reverse(record.hidden_at), Reverse(*position))
            });
            CategoryGroup {
                category,
                records: members.into_iter().map(|(_, record)| record).collect(),
            }
        })
        .collect()
}
