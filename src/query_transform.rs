//! Query-string merge helper used by the list views to keep the active
//! filter when linking to sibling pages.

use std::collections::BTreeMap;

/// Merge the current request's query parameters with a set of overrides and
/// return the url-encoded result. Overrides win on key collision. Output
/// order is deterministic (sorted by key).
pub fn query_transform(existing: &BTreeMap<String, String>, overrides: &[(&str, String)]) -> String {
    let mut params = existing.clone();
    for (key, value) in overrides {
        params.insert((*key).to_string(), value.clone());
    }
    serde_urlencoded::to_string(&params).unwrap_or_default()
}

/// Build the `next`/`previous` query strings for a list page, keeping every
/// parameter of the current request (filters included) intact.
pub fn page_links(
    existing: &BTreeMap<String, String>,
    page: u64,
    num_pages: u64,
) -> (Option<String>, Option<String>) {
    let next =
        (page < num_pages).then(|| query_transform(existing, &[("page", (page + 1).to_string())]));
    let previous =
        (page > 1).then(|| query_transform(existing, &[("page", (page - 1).to_string())]));
    (next, previous)
}
