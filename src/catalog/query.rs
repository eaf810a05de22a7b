//! In-memory search, sort and pagination over a fetched catalog.

use crate::catalog::types::{QueryResult, QueryState, SortKey};
use crate::models::DisplayListing;

/// Derive the visible page for `state` from the full fetched set.
///
/// Pure and deterministic; the input slice is never reordered.
pub fn query(full: &[DisplayListing], state: &QueryState) -> QueryResult {
    let term = state.search.trim().to_lowercase();

    let mut matched: Vec<&DisplayListing> = full
        .iter()
        .filter(|listing| matches_search(listing, &term))
        .collect();

    // Stable sorts, so equal prices keep backend (newest-first) order
    match state.sort {
        SortKey::Newest => {}
        SortKey::PriceAsc => matched.sort_by_key(|listing| price_key(&listing.price)),
        SortKey::PriceDesc => {
            matched.sort_by(|a, b| price_key(&b.price).cmp(&price_key(&a.price)))
        }
    }

    let per_page = state.per_page.max(1);
    let total_count = matched.len();
    let total_pages = total_count.div_ceil(per_page).max(1);
    let page_number = state.page.clamp(1, total_pages);

    let page = matched
        .into_iter()
        .skip((page_number - 1) * per_page)
        .take(per_page)
        .cloned()
        .collect();

    QueryResult {
        page,
        total_count,
        total_pages,
        page_number,
    }
}

fn matches_search(listing: &DisplayListing, term: &str) -> bool {
    if term.is_empty() {
        return true;
    }
    [
        &listing.title,
        &listing.location,
        &listing.property_type,
        &listing.city,
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(term))
}

/// Numeric value of every decimal digit in a formatted price, 0 if none.
fn price_key(price: &str) -> u128 {
    let digits: String = price.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return 0;
    }
    digits.parse().unwrap_or(u128::MAX)
}
