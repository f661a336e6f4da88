//! Merging of per-cycle or per-source result sets into final streams.
//!
//! Every stream is concatenated in observation order. Text is then reduced
//! to its first occurrence per exact string; images are reduced the same way
//! only when [`MergeOptions::unique_images`] is set. Videos and links keep
//! their duplicates.

use std::collections::HashSet;
use std::hash::Hash;

use crate::config::MergeOptions;
use crate::models::ResultSet;

/// Merge any number of result sets, in the order given.
pub fn merge<I>(sets: I, options: MergeOptions) -> ResultSet
where
    I: IntoIterator<Item = ResultSet>,
{
    let mut merged = ResultSet::new();
    for set in sets {
        merged.append(set);
    }
    finalize(merged, options)
}

/// Apply the per-stream dedup policy to a set accumulated in place.
pub fn finalize(mut set: ResultSet, options: MergeOptions) -> ResultSet {
    set.texts = dedup_by_key(set.texts, |t| t.content.clone());
    if options.unique_images {
        set.images = dedup_by_key(set.images, |i| i.url.clone());
    }
    set
}

/// Keep the first item for each key, preserving relative order.
fn dedup_by_key<T, K, F>(items: Vec<T>, key: F) -> Vec<T>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut seen = HashSet::with_capacity(items.len());
    items.into_iter().filter(|item| seen.insert(key(item))).collect()
}
