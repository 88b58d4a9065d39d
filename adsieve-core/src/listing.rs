//! Helpers for extraction adapters: ad ids from detail links, canonical
//! urls, category labels and the short price/location line.

use regex::Regex;
use std::sync::OnceLock;
use url::Url;

use crate::types::UNKNOWN_CATEGORY;

fn id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"/(\d+)-\d+-\d+$").expect("valid id pattern"))
}

fn detail_path_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(/s-anzeige/.+)$").expect("valid detail pattern"))
}

fn category_path_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"/s-([^/]+)").expect("valid category pattern"))
}

/// Ad id from a detail link ending in `/<id>-<n>-<n>`.
pub fn ad_id_from_link(href: &str) -> Option<String> {
    id_pattern()
        .captures(href.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Detail-page url with any search context stripped, resolved against `origin`.
pub fn canonical_ad_url(href: &str, origin: &str) -> String {
    let cleaned = detail_path_pattern()
        .captures(href)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(href);

    if cleaned.starts_with("http") {
        return cleaned.to_string();
    }

    match Url::parse(origin).and_then(|base| base.join(cleaned)) {
        Ok(url) => url.to_string(),
        Err(_) => format!("{}{}", origin.trim_end_matches('/'), cleaned),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryInfo {
    pub display: String,
    pub path: String,
}

/// Category label from breadcrumb texts, falling back to the `/s-<path>`
/// segment of the search page.
pub fn category_from_location<I, S>(breadcrumbs: I, pathname: &str) -> CategoryInfo
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let labels: Vec<String> = breadcrumbs
        .into_iter()
        .map(|label| label.as_ref().trim().to_string())
        .filter(|label| !label.is_empty())
        .collect();

    let path = category_path_pattern()
        .captures(pathname)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| UNKNOWN_CATEGORY.to_string());

    let display = if labels.is_empty() {
        path.replace('-', " ")
    } else {
        labels.join(" / ")
    };

    CategoryInfo { display, path }
}

pub fn meta_line(price: &str, location: &str) -> String {
    [price, location]
        .iter()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" • ")
}
