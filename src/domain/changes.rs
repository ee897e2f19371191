// src/domain/changes.rs

use crate::domain::listing::Listing;
use std::collections::HashSet;

/// Listings in `current` whose id is absent from `previous`, in `current`'s order.
pub fn diff_new(current: &[Listing], previous: &[Listing]) -> Vec<Listing> {
    let known: HashSet<&str> = previous.iter().map(|l| l.id.as_str()).collect();

    current
        .iter()
        .filter(|l| !known.contains(l.id.as_str()))
        .cloned()
        .collect()
}

/// Union of both collections keyed by id.
///
/// `current` comes first in its own order (first occurrence wins), followed
/// by the `previous` listings it does not already cover. On an id conflict
/// the `current` version is kept.
pub fn merge(current: &[Listing], previous: &[Listing]) -> Vec<Listing> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(current.len() + previous.len());
    let mut merged = Vec::with_capacity(current.len() + previous.len());

    for listing in current.iter().chain(previous.iter()) {
        if seen.insert(listing.id.as_str()) {
            merged.push(listing.clone());
        }
    }

    merged
}
