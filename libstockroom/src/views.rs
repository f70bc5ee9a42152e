//! Derived views over the current part list
//!
//! Pure functions consumed by screens. Nothing here is cached or persisted;
//! every call recomputes from the snapshot it is given.

use std::collections::HashMap;

use crate::types::{Filters, Part, Statistics, CATEGORY_ALL};

/// Filter the part list. Five predicates, all ANDed together:
/// case-insensitive substring on name or description, exact category unless
/// the selector is empty or [`CATEGORY_ALL`], inclusive price bounds,
/// quantity at least the minimum, and each part's own low-stock cutoff when
/// the flag is set.
pub fn filter_parts(parts: &[Part], filters: &Filters) -> Vec<Part> {
    let search = filters.search.to_lowercase();
    parts
        .iter()
        .filter(|part| {
            let matches_search = search.is_empty()
                || part.name.to_lowercase().contains(&search)
                || part.description.to_lowercase().contains(&search);
            let matches_category = filters.category.is_empty()
                || filters.category == CATEGORY_ALL
                || part.category == filters.category;
            let matches_price = part.price >= filters.min_price && part.price <= filters.max_price;
            let matches_quantity = part.quantity >= filters.min_quantity;
            let matches_stock = !filters.low_stock_only || part.is_low_stock();

            matches_search && matches_category && matches_price && matches_quantity && matches_stock
        })
        .cloned()
        .collect()
}

/// Aggregate statistics over the given parts.
///
/// The top category is decided by a single left-to-right pass; on a tie the
/// category that reached the winning count first keeps the slot. Stable for a
/// given list order, unspecified across reorderings.
pub fn compute_statistics(parts: &[Part]) -> Statistics {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut top: (&str, usize) = ("", 0);
    let mut total_quantity: u64 = 0;
    let mut total_value = 0.0;
    let mut price_sum = 0.0;
    let mut low_stock_count = 0;

    for part in parts {
        total_quantity += u64::from(part.quantity);
        total_value += part.price * f64::from(part.quantity);
        price_sum += part.price;
        if part.is_low_stock() {
            low_stock_count += 1;
        }

        let count = counts
            .entry(part.category.as_str())
            .and_modify(|c| *c += 1)
            .or_insert(1);
        if *count > top.1 {
            top = (part.category.as_str(), *count);
        }
    }

    let average_price = if parts.is_empty() {
        0.0
    } else {
        price_sum / parts.len() as f64
    };

    Statistics {
        total_quantity,
        total_value,
        low_stock_count,
        top_category: top.0.to_string(),
        average_price,
    }
}

/// Parts at or below their own minimum-stock threshold.
pub fn low_stock_parts(parts: &[Part]) -> Vec<Part> {
    parts.iter().filter(|p| p.is_low_stock()).cloned().collect()
}
